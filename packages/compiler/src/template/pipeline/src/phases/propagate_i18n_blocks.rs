//! Propagate I18n Blocks
//!
//! Propagate i18n blocks down through child templates that act as placeholders in the root i18n
//! message. Specifically, perform an in-order traversal of all the views, and add i18nStart/i18nEnd
//! op pairs into descending views. Also, assign an increasing sub-template index to each
//! descending view.

use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::i18n::i18n_ast::Message;
use crate::template::pipeline::ir::ops::{create_i18n_end_op, create_i18n_start_op};
use crate::template::pipeline::ir::{CreateOp, OpKind, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn propagate_i18n_blocks(job: &mut ComponentCompilationJob) -> Result<()> {
    let root = job.root;
    propagate_i18n_blocks_to_templates(job, root, 0)?;
    Ok(())
}

/// The innermost i18n block enclosing the op being visited.
#[derive(Clone)]
struct ActiveBlock {
    message: Arc<Message>,
    root: XrefId,
    is_root_level: bool,
}

/// A child view reached from the op being visited, and whether it is an i18n placeholder.
struct ChildView {
    view: XrefId,
    has_placeholder: bool,
}

fn propagate_i18n_blocks_to_templates(
    job: &mut ComponentCompilationJob,
    view: XrefId,
    mut sub_template_index: usize,
) -> Result<usize> {
    let mut i18n_block: Option<ActiveBlock> = None;

    for id in job.view(view)?.create.ids() {
        let mut children = Vec::new();
        match job.view_mut(view)?.create.get_mut(id)? {
            CreateOp::I18nStart(op) => {
                op.sub_template_index = (sub_template_index != 0).then_some(sub_template_index);
                i18n_block = Some(ActiveBlock {
                    message: op.message.clone(),
                    root: op.root,
                    is_root_level: op.sub_template_index.is_none(),
                });
            }
            CreateOp::I18nEnd(_) => {
                // When we exit a root-level i18n block, reset the sub-template index counter.
                if i18n_block.as_ref().is_some_and(|block| block.is_root_level) {
                    sub_template_index = 0;
                }
                i18n_block = None;
            }
            CreateOp::Template(op)
            | CreateOp::ConditionalCreate(op)
            | CreateOp::ConditionalBranchCreate(op) => children.push(ChildView {
                view: op.base.xref,
                has_placeholder: op.i18n_placeholder.is_some(),
            }),
            CreateOp::RepeaterCreate(op) => {
                children.push(ChildView {
                    view: op.base.xref,
                    has_placeholder: op.i18n_placeholder.is_some(),
                });
                // Then if there's an @empty template, propagate the i18n blocks for it as well.
                if let Some(empty_view) = op.empty_view {
                    children.push(ChildView {
                        view: empty_view,
                        has_placeholder: op.empty_i18n_placeholder.is_some(),
                    });
                }
            }
            CreateOp::Projection(op) => {
                if let Some(fallback_view) = op.fallback_view {
                    children.push(ChildView {
                        view: fallback_view,
                        has_placeholder: op.fallback_i18n_placeholder.is_some(),
                    });
                }
            }
            _ => {}
        }

        for child in children {
            if !job.views.contains_key(&child.view) {
                continue;
            }
            sub_template_index =
                propagate_i18n_blocks_for_view(job, child, i18n_block.as_ref(), sub_template_index)?;
        }
    }
    Ok(sub_template_index)
}

fn propagate_i18n_blocks_for_view(
    job: &mut ComponentCompilationJob,
    child: ChildView,
    i18n_block: Option<&ActiveBlock>,
    mut sub_template_index: usize,
) -> Result<usize> {
    // We found an <ng-template> inside an i18n block; increment the sub-template counter and
    // wrap the template's view in a child i18n block.
    if child.has_placeholder {
        let block = i18n_block.ok_or_else(|| {
            PipelineError::assertion("expected template with i18n placeholder to be in an i18n block")
        })?;
        sub_template_index += 1;
        wrap_template_with_i18n(job, child.view, block)?;
    }

    // Continue traversing inside the template's view.
    propagate_i18n_blocks_to_templates(job, child.view, sub_template_index)
}

fn wrap_template_with_i18n(
    job: &mut ComponentCompilationJob,
    view: XrefId,
    parent_i18n: &ActiveBlock,
) -> Result<()> {
    // Only add i18n ops if they have not already been propagated to this template.
    let already_wrapped = {
        let create = &job.view(view)?.create;
        match create.first() {
            Some(first) => create.kind(first)? == OpKind::I18nStart,
            None => false,
        }
    };
    if already_wrapped {
        return Ok(());
    }

    let id = job.base.allocate_xref_id();
    let unit = job.view_mut(view)?;
    unit.create.prepend(vec![create_i18n_start_op(
        id,
        parent_i18n.message.clone(),
        Some(parent_i18n.root),
    )]);
    unit.create.push(create_i18n_end_op(id));
    Ok(())
}
