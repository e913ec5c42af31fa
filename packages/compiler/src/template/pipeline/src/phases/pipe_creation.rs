//! Pipe Creation
//!
//! Generate pipe creation instructions, based on the pipe bindings found in the update block, in
//! the order they are seen.
//!
//! Outside of compatibility mode all pipe creations are grouped at the end of the create block,
//! which maximizes chaining opportunities. TemplateDefinitionBuilder placed each pipe right after
//! the element its binding targets.

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::ops::create_pipe_op;
use crate::template::pipeline::ir::{
    CreateOp, DependsOnSlotContextOpTrait, Op, OpKind, OpList, SlotHandle, UpdateOp,
    VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

struct FoundPipe {
    /// Target of the update op the binding was found in.
    owner: Option<XrefId>,
    xref: XrefId,
    slot: SlotHandle,
    name: String,
}

pub fn create_pipes(job: &mut ComponentCompilationJob) -> Result<()> {
    let compat = job.base.is_compat();
    for unit in job.views.values_mut() {
        let pipes = find_pipes(&mut unit.update)?;
        for pipe in pipes {
            let op = create_pipe_op(pipe.xref, pipe.slot, pipe.name);
            if !compat {
                unit.create.push(op);
                continue;
            }
            let owner = pipe.owner.ok_or_else(|| {
                PipelineError::assertion("expected slot handle to be assigned for pipe creation")
            })?;
            add_pipe_after_target(&mut unit.create, owner, op)?;
        }
    }
    Ok(())
}

fn find_pipes(update: &mut OpList<UpdateOp>) -> Result<Vec<FoundPipe>> {
    let mut found = Vec::new();
    let mut in_child_operation = false;
    for op in update.iter_mut() {
        let owner = op.as_depends_on_slot_context().map(|op| op.target());
        op.visit_expressions(&mut |expr, flags| {
            let Expression::PipeBinding(binding) = expr else {
                return;
            };
            if flags.contains(VisitorContextFlag::IN_CHILD_OPERATION) {
                in_child_operation = true;
                return;
            }
            found.push(FoundPipe {
                owner,
                xref: binding.target,
                slot: binding.target_slot.clone(),
                name: binding.name.clone(),
            });
        });
    }
    if in_child_operation {
        return Err(PipelineError::assertion(
            "pipe bindings should not appear in child expressions",
        ));
    }
    Ok(found)
}

/// Insert `pipe` after the slot-consuming op `target`, and after any pipes already placed there.
fn add_pipe_after_target(create: &mut OpList<CreateOp>, target: XrefId, pipe: CreateOp) -> Result<()> {
    let mut cursor = create.first();
    while let Some(id) = cursor {
        cursor = create.next(id);
        let op = create.get(id)?;
        let is_target = op
            .as_consumes_slot()
            .is_some_and(|slot_op| slot_op.xref() == target);
        if !is_target {
            continue;
        }

        let mut anchor = id;
        while let Some(next) = create.next(anchor) {
            if create.get(next)?.kind() != OpKind::Pipe {
                break;
            }
            anchor = next;
        }
        create.insert_after(anchor, pipe)?;
        return Ok(());
    }
    Err(PipelineError::assertion(format!(
        "unable to find insertion point for pipe on {:?}",
        target
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::pipe_binding;
    use crate::template::pipeline::ir::ops::{
        create_element_end_op, create_element_start_op, create_property_op,
    };
    use crate::template::pipeline::ir::{BindingKind, CompatibilityMode, Namespace};

    fn job_with_piped_property(options: &PipelineOptions) -> ComponentCompilationJob {
        let mut job = ComponentCompilationJob::new("Cmp", ConstantPool::new(), options);
        let element = job.base.allocate_xref_id();
        let first = job.base.allocate_xref_id();
        let second = job.base.allocate_xref_id();
        let root = job.root;
        let view = &mut job.views[&root];
        view.create
            .push(create_element_start_op("div", element, Namespace::HTML, None));
        view.create.push(create_element_end_op(element));
        let piped = pipe_binding(
            second,
            SlotHandle::new(),
            "upper",
            vec![pipe_binding(first, SlotHandle::new(), "async", vec![o::variable("x")])],
        );
        view.update.push(UpdateOp::Property(create_property_op(
            element,
            "title",
            piped,
            BindingKind::Property,
            vec![],
        )));
        job
    }

    fn create_kinds(job: &ComponentCompilationJob) -> Vec<OpKind> {
        job.views[&job.root].create.iter().map(Op::kind).collect()
    }

    #[test]
    fn test_pipes_are_appended_in_binding_order() {
        let mut job = job_with_piped_property(&PipelineOptions::default());
        create_pipes(&mut job).unwrap();

        assert_eq!(
            create_kinds(&job),
            vec![OpKind::ElementStart, OpKind::ElementEnd, OpKind::Pipe, OpKind::Pipe]
        );
        let names: Vec<_> = job.views[&job.root]
            .create
            .iter()
            .filter_map(|op| match op {
                CreateOp::Pipe(pipe) => Some(pipe.name.as_str()),
                _ => None,
            })
            .collect();
        // Inner bindings are visited first.
        assert_eq!(names, vec!["async", "upper"]);
    }

    #[test]
    fn test_compat_mode_places_pipes_after_target_element() {
        let options = PipelineOptions {
            compatibility: CompatibilityMode::TemplateDefinitionBuilder,
            ..PipelineOptions::default()
        };
        let mut job = job_with_piped_property(&options);
        create_pipes(&mut job).unwrap();

        assert_eq!(
            create_kinds(&job),
            vec![OpKind::ElementStart, OpKind::Pipe, OpKind::Pipe, OpKind::ElementEnd]
        );
    }
}
