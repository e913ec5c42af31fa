//! Resolves `ir.ContextExpr` expressions (which represent embedded view or component contexts) to
//! either the `ctx` parameter to component functions (for the current view context) or to
//! variables that store those contexts (for contexts accessed via the `nextContext()`
//! instruction).

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::expression::read_variable;
use crate::template::pipeline::ir::ops::VariableOp;
use crate::template::pipeline::ir::{
    CreateOp, OpList, SemanticVariable, UpdateOp, VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::CompilationJob;

/// Expressions used to access every context available in one lexical scope, by view.
struct Scope {
    unit: XrefId,
    is_root: bool,
    contexts: HashMap<XrefId, Expression>,
}

impl Scope {
    fn new(unit: XrefId, is_root: bool) -> Self {
        let mut contexts = HashMap::new();
        // The current view's context is accessible via the `ctx` parameter.
        contexts.insert(unit, o::variable("ctx"));
        Scope {
            unit,
            is_root,
            contexts,
        }
    }

    fn declare(&mut self, op: &VariableOp) {
        if let SemanticVariable::Context(var) = &op.variable {
            self.contexts.insert(var.view, read_variable(op.xref));
        }
    }

    fn finish(&mut self) {
        if self.is_root {
            // Prefer `ctx` of the root view to any variables which happen to contain the root
            // context.
            self.contexts.insert(self.unit, o::variable("ctx"));
        }
    }

    fn resolve(&self, expr: Expression, error: &mut Option<PipelineError>) -> Expression {
        let Expression::Context(ctx) = expr else {
            return expr;
        };
        match self.contexts.get(&ctx.view) {
            Some(resolved) => resolved.clone(),
            None => {
                error.get_or_insert(PipelineError::NoContext {
                    view: ctx.view,
                    from: self.unit,
                });
                Expression::Context(ctx)
            }
        }
    }
}

pub fn resolve_contexts(job: &mut dyn CompilationJob) -> Result<()> {
    let root = job.root_xref();
    for unit in job.units_mut() {
        let xref = unit.xref();
        let (create, update) = unit.lists_mut();
        resolve_create_scope(create, xref, xref == root)?;
        resolve_update_scope(update, xref, xref == root)?;
    }
    Ok(())
}

fn resolve_create_scope(ops: &mut OpList<CreateOp>, unit: XrefId, is_root: bool) -> Result<()> {
    let mut scope = Scope::new(unit, is_root);
    for op in ops.iter_mut() {
        match op {
            CreateOp::Variable(var) => scope.declare(var),
            CreateOp::RepeaterCreate(repeater) => {
                if let Some(track_by_ops) = &mut repeater.track_by_ops {
                    resolve_update_scope(track_by_ops, unit, is_root)?;
                }
            }
            other => {
                if let Some(handler_ops) = other.handler_ops_mut() {
                    resolve_update_scope(handler_ops, unit, is_root)?;
                }
            }
        }
    }
    scope.finish();

    let mut error = None;
    for op in ops.iter_mut() {
        op.transform_expressions(
            &mut |expr, _| scope.resolve(expr, &mut error),
            VisitorContextFlag::NONE,
        );
    }
    error.map_or(Ok(()), Err)
}

fn resolve_update_scope(ops: &mut OpList<UpdateOp>, unit: XrefId, is_root: bool) -> Result<()> {
    let mut scope = Scope::new(unit, is_root);
    for op in ops.iter() {
        if let UpdateOp::Variable(var) = op {
            scope.declare(var);
        }
    }
    scope.finish();

    let mut error = None;
    for op in ops.iter_mut() {
        op.transform_expressions(
            &mut |expr, _| scope.resolve(expr, &mut error),
            VisitorContextFlag::NONE,
        );
    }
    error.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::expression::{context, next_context};
    use crate::template::pipeline::ir::ops::StatementOp;
    use crate::template::pipeline::ir::VariableFlags;
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn statement_exprs(ops: &OpList<UpdateOp>) -> Vec<Expression> {
        ops.iter()
            .filter_map(|op| match op {
                UpdateOp::Statement(stmt) => match &stmt.statement {
                    o::Statement::Expression(e) => Some(e.expr.as_ref().clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_contexts_resolve_to_ctx_or_context_variables() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        let var = job.base.allocate_xref_id();
        let view = &mut job.views[&child];
        view.update.push(UpdateOp::Variable(VariableOp::new(
            var,
            SemanticVariable::context(root),
            next_context(1),
            VariableFlags::NONE,
        )));
        view.update
            .push(UpdateOp::Statement(StatementOp::new(context(child).to_stmt())));
        view.update
            .push(UpdateOp::Statement(StatementOp::new(context(root).to_stmt())));

        resolve_contexts(&mut job).unwrap();

        let exprs = statement_exprs(&job.views[&child].update);
        assert!(exprs[0].is_equivalent(&o::variable("ctx")));
        assert!(matches!(&exprs[1], Expression::ReadVariable(r) if r.xref == var));
    }

    #[test]
    fn test_unknown_context_is_an_error() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        job.views[&child]
            .update
            .push(UpdateOp::Statement(StatementOp::new(context(root).to_stmt())));

        assert!(matches!(
            resolve_contexts(&mut job),
            Err(PipelineError::NoContext { .. })
        ));
    }
}
