//! Create I18n Contexts
//!
//! Create one helper context op per i18n block (including generated descending blocks), per i18n
//! attribute message and per ICU sub-message. Context ops hold the parameter values that make up
//! each message.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{PipelineError, Result};
use crate::i18n::i18n_ast::{message_identity, Message};
use crate::template::pipeline::ir::ops::create_i18n_context_op;
use crate::template::pipeline::ir::{CreateOp, I18nContextKind, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn create_i18n_contexts(job: &mut ComponentCompilationJob) -> Result<()> {
    create_attribute_contexts(job);
    let block_contexts = create_root_block_contexts(job)?;
    create_icu_contexts(job, &block_contexts)
}

/// One context per distinct attribute message, shared by every binding carrying it.
fn create_attribute_contexts(job: &mut ComponentCompilationJob) {
    let mut context_by_message: IndexMap<usize, XrefId> = IndexMap::new();

    for unit in job.views.values_mut() {
        let mut new_contexts = Vec::new();
        let mut assign = |message: &Option<Arc<Message>>, context: &mut Option<XrefId>| {
            let Some(message) = message else {
                return;
            };
            let xref = *context_by_message
                .entry(message_identity(message))
                .or_insert_with(|| {
                    let xref = job.base.allocate_xref_id();
                    new_contexts.push(create_i18n_context_op(
                        I18nContextKind::Attr,
                        xref,
                        None,
                        message.clone(),
                    ));
                    xref
                });
            *context = Some(xref);
        };

        for op in unit.create.iter_mut() {
            if let CreateOp::ExtractedAttribute(attr) = op {
                assign(&attr.i18n_message, &mut attr.i18n_context);
            }
        }
        for op in unit.update.iter_mut() {
            match op {
                UpdateOp::Binding(binding) => {
                    assign(&binding.i18n_message, &mut binding.i18n_context)
                }
                UpdateOp::Property(prop) => assign(&prop.i18n_message, &mut prop.i18n_context),
                UpdateOp::Attribute(attr) => assign(&attr.i18n_message, &mut attr.i18n_context),
                _ => {}
            }
        }
        unit.create.push_all(new_contexts);
    }
}

/// Root blocks get their own context; child blocks inherit the context of their root.
fn create_root_block_contexts(
    job: &mut ComponentCompilationJob,
) -> Result<IndexMap<XrefId, XrefId>> {
    let mut block_contexts: IndexMap<XrefId, XrefId> = IndexMap::new();

    for unit in job.views.values_mut() {
        let mut new_contexts = Vec::new();
        for op in unit.create.iter_mut() {
            let CreateOp::I18nStart(start) = op else {
                continue;
            };
            if start.xref != start.root {
                continue;
            }
            let xref = job.base.allocate_xref_id();
            new_contexts.push(create_i18n_context_op(
                I18nContextKind::RootI18n,
                xref,
                Some(start.xref),
                start.message.clone(),
            ));
            start.context = Some(xref);
            block_contexts.insert(start.xref, xref);
        }
        unit.create.push_all(new_contexts);
    }

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::I18nStart(start) = op else {
                continue;
            };
            if start.xref == start.root {
                continue;
            }
            let root_context = *block_contexts.get(&start.root).ok_or_else(|| {
                PipelineError::assertion("root i18n block i18n context should have been created")
            })?;
            start.context = Some(root_context);
            block_contexts.insert(start.xref, root_context);
        }
    }
    Ok(block_contexts)
}

/// An ICU that is a sub-message of its block gets its own context. An ICU that is the whole
/// message of its block turns the block's context into an ICU context.
fn create_icu_contexts(
    job: &mut ComponentCompilationJob,
    block_contexts: &IndexMap<XrefId, XrefId>,
) -> Result<()> {
    let mut icu_contexts: IndexSet<XrefId> = IndexSet::new();

    for unit in job.views.values_mut() {
        let mut new_contexts = Vec::new();
        let mut current_block: Option<(XrefId, XrefId, Arc<Message>, Option<XrefId>)> = None;

        for op in unit.create.iter_mut() {
            match op {
                CreateOp::I18nStart(start) => {
                    current_block =
                        Some((start.xref, start.root, start.message.clone(), start.context));
                }
                CreateOp::I18nEnd(_) => current_block = None,
                CreateOp::IcuStart(icu) => {
                    let Some((block, root, message, context)) = &current_block else {
                        return Err(PipelineError::assertion(
                            "unexpected ICU outside of an i18n block",
                        ));
                    };
                    if icu.message.id != message.id {
                        let xref = job.base.allocate_xref_id();
                        new_contexts.push(create_i18n_context_op(
                            I18nContextKind::Icu,
                            xref,
                            Some(*root),
                            icu.message.clone(),
                        ));
                        icu.context = Some(xref);
                    } else {
                        icu.context = *context;
                        if let Some(block_context) = block_contexts.get(block) {
                            icu_contexts.insert(*block_context);
                        }
                    }
                }
                _ => {}
            }
        }
        unit.create.push_all(new_contexts);
    }

    if icu_contexts.is_empty() {
        return Ok(());
    }
    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            if let CreateOp::I18nContext(context) = op {
                if icu_contexts.contains(&context.xref) {
                    context.context_kind = I18nContextKind::Icu;
                }
            }
        }
    }
    Ok(())
}
