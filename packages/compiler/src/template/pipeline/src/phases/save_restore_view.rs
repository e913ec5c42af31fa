//! Save Restore View
//!
//! When inside of a listener, we may need access to one or more enclosing views. Therefore, each
//! view should save the current view, and each listener must have the ability to restore the
//! appropriate view. All save view variables are generated eagerly and optimized away later.

use crate::error::Result;
use crate::output::output_ast::{Expression, Statement};
use crate::template::pipeline::ir::expression::{
    empty, get_current_view, reset_view, restore_view, RestoreViewTarget,
};
use crate::template::pipeline::ir::ops::VariableOp;
use crate::template::pipeline::ir::{
    CreateOp, OpList, SemanticVariable, UpdateOp, VariableFlags,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn save_and_restore_view(job: &mut ComponentCompilationJob) -> Result<()> {
    let root = job.root;
    let base = &mut job.base;
    for (&xref, view) in job.views.iter_mut() {
        view.create.prepend(vec![CreateOp::Variable(VariableOp::new(
            base.allocate_xref_id(),
            SemanticVariable::saved_view(xref),
            get_current_view(),
            VariableFlags::NONE,
        ))]);

        for op in view.create.iter_mut() {
            if op.handler_ops().is_none() {
                continue;
            }
            // Embedded views always need the save/restore view operations. The root view only
            // needs them when the handler reads a local ref or a `@let` declaration.
            let mut needs_restore_view = xref != root;
            if !needs_restore_view {
                op.visit_expressions(&mut |expr, _| {
                    if matches!(
                        expr,
                        Expression::Reference(_) | Expression::ContextLetReference(_)
                    ) {
                        needs_restore_view = true;
                    }
                });
            }
            if !needs_restore_view {
                continue;
            }
            if let Some(handler_ops) = op.handler_ops_mut() {
                let restore = VariableOp::new(
                    base.allocate_xref_id(),
                    SemanticVariable::context(xref),
                    restore_view(RestoreViewTarget::Static(xref)),
                    VariableFlags::NONE,
                );
                add_save_restore_view(handler_ops, restore);
            }
        }
    }
    Ok(())
}

fn add_save_restore_view(handler_ops: &mut OpList<UpdateOp>, restore: VariableOp) {
    handler_ops.prepend(vec![UpdateOp::Variable(restore)]);

    // Restoring the view requires a `resetView` call before returning from the listener, so every
    // `return` in the handler body is wrapped.
    for op in handler_ops.iter_mut() {
        if let UpdateOp::Statement(stmt) = op {
            if let Statement::Return(ret) = &mut stmt.statement {
                let value = std::mem::replace(ret.value.as_mut(), empty());
                *ret.value = reset_view(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::ops::{create_listener_op, StatementOp};
    use crate::template::pipeline::ir::{SlotHandle, XrefId};

    fn push_listener(job: &mut ComponentCompilationJob, view: XrefId) {
        let target = job.base.allocate_xref_id();
        let list = job.base.allocate_list_id();
        let body = vec![UpdateOp::Statement(StatementOp::new(o::return_stmt(
            o::variable("handled"),
        )))];
        job.views[&view].create.push(CreateOp::Listener(create_listener_op(
            target,
            SlotHandle::new(),
            "click",
            None,
            body,
            false,
            list,
        )));
    }

    fn handler(job: &ComponentCompilationJob, view: XrefId) -> Vec<&UpdateOp> {
        job.views[&view]
            .create
            .iter()
            .find_map(|op| op.handler_ops())
            .map(|ops| ops.iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_embedded_view_listener_restores_view() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let child = job.allocate_view(job.root).unwrap();
        push_listener(&mut job, child);

        save_and_restore_view(&mut job).unwrap();

        let ops = handler(&job, child);
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            ops[0],
            UpdateOp::Variable(var) if matches!(var.initializer.as_ref(), Expression::RestoreView(_))
        ));
        let UpdateOp::Statement(stmt) = ops[1] else {
            panic!("expected the return statement");
        };
        let Statement::Return(ret) = &stmt.statement else {
            panic!("expected a return");
        };
        assert!(matches!(ret.value.as_ref(), Expression::ResetView(_)));
    }

    #[test]
    fn test_root_listener_without_refs_is_untouched() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        push_listener(&mut job, root);

        save_and_restore_view(&mut job).unwrap();

        assert_eq!(handler(&job, root).len(), 1);
        // Every view still saves its current view.
        assert!(matches!(
            job.views[&root].create.iter().next(),
            Some(CreateOp::Variable(var)) if matches!(var.variable, SemanticVariable::SavedView(_))
        ));
    }
}
