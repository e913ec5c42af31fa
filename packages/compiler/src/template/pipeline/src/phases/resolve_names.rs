//! Resolve Names
//!
//! Resolves lexical references in views (`ir.LexicalReadExpr`) to either a target variable or to
//! property reads on the top-level component context.
//!
//! Also matches `ir.RestoreViewExpr` expressions with the variables of their corresponding saved
//! views.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::expression::{context, read_variable, RestoreViewTarget};
use crate::template::pipeline::ir::ops::VariableOp;
use crate::template::pipeline::ir::{
    CreateOp, OpList, SemanticVariable, UpdateOp, VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::CompilationJob;

#[derive(Clone, Copy)]
struct SavedView {
    view: XrefId,
    variable: XrefId,
}

/// Names defined in one lexical scope: a view's create or update block, or a listener body.
///
/// Since variables are generated in each view for the entire lexical scope (including any
/// identifiers from parent templates) only local variables need be considered here.
#[derive(Default)]
struct Scope {
    names: HashMap<String, XrefId>,
    /// Symbols defined within the current scope. They take precedence over ones defined outside.
    local_definitions: HashMap<String, XrefId>,
    saved_view: Option<SavedView>,
}

impl Scope {
    fn nested(&self) -> Scope {
        Scope {
            saved_view: self.saved_view,
            ..Scope::default()
        }
    }

    fn declare(&mut self, op: &VariableOp) {
        match &op.variable {
            SemanticVariable::Identifier(var) => {
                if var.local {
                    if self.local_definitions.contains_key(&var.identifier) {
                        return;
                    }
                    self.local_definitions.insert(var.identifier.clone(), op.xref);
                } else if self.names.contains_key(&var.identifier) {
                    return;
                }
                self.names.insert(var.identifier.clone(), op.xref);
            }
            SemanticVariable::Alias(var) => {
                self.names.entry(var.identifier.clone()).or_insert(op.xref);
            }
            SemanticVariable::SavedView(var) => {
                // A snapshot of the current view context, used to restore that context within
                // listener functions.
                self.saved_view = Some(SavedView {
                    view: var.view,
                    variable: op.xref,
                });
            }
            SemanticVariable::Context(_) => {}
        }
    }

    /// `expr` with lexical reads and restored views resolved against this scope. The first
    /// failure is recorded in `error`.
    fn resolve(
        &self,
        expr: Expression,
        root: XrefId,
        unit: XrefId,
        error: &mut Option<PipelineError>,
    ) -> Expression {
        match expr {
            // `expr` is a read of a name within the lexical scope of this view. Either that name is
            // defined within the current view, or it represents a property from the main component
            // context.
            Expression::LexicalRead(read) => match self
                .local_definitions
                .get(&read.name)
                .or_else(|| self.names.get(&read.name))
            {
                Some(&xref) => read_variable(xref),
                None => context(root).prop(read.name),
            },
            // Listener functions restore the view saved by the parent creation block.
            Expression::RestoreView(mut restore) => {
                if let RestoreViewTarget::Static(view) = restore.view {
                    match self.saved_view.filter(|saved| saved.view == view) {
                        Some(saved) => {
                            restore.view =
                                RestoreViewTarget::Dynamic(Box::new(read_variable(saved.variable)));
                        }
                        None => {
                            error.get_or_insert(PipelineError::NoSavedView { view, from: unit });
                        }
                    }
                }
                Expression::RestoreView(restore)
            }
            other => other,
        }
    }
}

pub fn resolve_names(job: &mut dyn CompilationJob) -> Result<()> {
    let root = job.root_xref();
    for unit in job.units_mut() {
        let xref = unit.xref();
        let (create, update) = unit.lists_mut();
        resolve_create_scope(create, root, xref)?;
        resolve_update_scope(update, Scope::default(), root, xref)?;
    }
    Ok(())
}

fn resolve_create_scope(ops: &mut OpList<CreateOp>, root: XrefId, unit: XrefId) -> Result<()> {
    let mut scope = Scope::default();
    for op in ops.iter_mut() {
        match op {
            CreateOp::Variable(var) => scope.declare(var),
            CreateOp::RepeaterCreate(repeater) => {
                if let Some(track_by_ops) = &mut repeater.track_by_ops {
                    resolve_update_scope(track_by_ops, scope.nested(), root, unit)?;
                }
            }
            other => {
                // Listener functions have separate variable declarations, so they form their own
                // lexical scope.
                if let Some(handler_ops) = other.handler_ops_mut() {
                    resolve_update_scope(handler_ops, scope.nested(), root, unit)?;
                }
            }
        }
    }

    let mut error = None;
    for op in ops.iter_mut() {
        // Listeners were already processed with their own scopes.
        if op.handler_ops().is_some() {
            continue;
        }
        op.transform_expressions(
            &mut |expr, _| scope.resolve(expr, root, unit, &mut error),
            VisitorContextFlag::NONE,
        );
    }
    if let Some(error) = error {
        return Err(error);
    }

    for op in ops.iter_mut() {
        let mut unresolved = None;
        op.visit_expressions(&mut |expr, _| record_lexical_read(expr, &mut unresolved));
        if let Some(name) = unresolved {
            return Err(PipelineError::UnresolvedName(name));
        }
    }
    Ok(())
}

fn resolve_update_scope(
    ops: &mut OpList<UpdateOp>,
    mut scope: Scope,
    root: XrefId,
    unit: XrefId,
) -> Result<()> {
    for op in ops.iter() {
        if let UpdateOp::Variable(var) = op {
            scope.declare(var);
        }
    }

    let mut error = None;
    for op in ops.iter_mut() {
        op.transform_expressions(
            &mut |expr, _| scope.resolve(expr, root, unit, &mut error),
            VisitorContextFlag::NONE,
        );
    }
    if let Some(error) = error {
        return Err(error);
    }

    for op in ops.iter_mut() {
        let mut unresolved = None;
        op.visit_expressions(&mut |expr, _| record_lexical_read(expr, &mut unresolved));
        if let Some(name) = unresolved {
            return Err(PipelineError::UnresolvedName(name));
        }
    }
    Ok(())
}

fn record_lexical_read(expr: &Expression, unresolved: &mut Option<String>) {
    if let Expression::LexicalRead(read) = expr {
        unresolved.get_or_insert_with(|| read.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::{lexical_read, restore_view};
    use crate::template::pipeline::ir::ops::{create_listener_op, StatementOp};
    use crate::template::pipeline::ir::{SlotHandle, VariableFlags};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn statement(expr: Expression) -> UpdateOp {
        UpdateOp::Statement(StatementOp::new(expr.to_stmt()))
    }

    fn statement_expr(op: &UpdateOp) -> &Expression {
        match op {
            UpdateOp::Statement(stmt) => match &stmt.statement {
                o::Statement::Expression(e) => e.expr.as_ref(),
                _ => panic!("expected an expression statement"),
            },
            _ => panic!("expected a statement op"),
        }
    }

    #[test]
    fn test_names_resolve_to_variables_or_component_context() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let var = job.base.allocate_xref_id();
        let view = &mut job.views[&root];
        view.update.push(UpdateOp::Variable(VariableOp::new(
            var,
            SemanticVariable::identifier("item", false),
            o::variable("x"),
            VariableFlags::NONE,
        )));
        view.update.push(statement(lexical_read("item")));
        view.update.push(statement(lexical_read("title")));

        resolve_names(&mut job).unwrap();

        let ops: Vec<_> = job.views[&root].update.iter().collect();
        assert!(matches!(statement_expr(ops[1]), Expression::ReadVariable(r) if r.xref == var));
        assert!(statement_expr(ops[2]).is_equivalent(&context(root).prop("title")));
    }

    #[test]
    fn test_restore_view_reads_saved_view_variable() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let saved = job.base.allocate_xref_id();
        let list = job.base.allocate_list_id();
        let view = &mut job.views[&root];
        view.create.push(CreateOp::Variable(VariableOp::new(
            saved,
            SemanticVariable::saved_view(root),
            o::variable("view"),
            VariableFlags::NONE,
        )));
        view.create.push(CreateOp::Listener(create_listener_op(
            XrefId(50),
            SlotHandle::new(),
            "click",
            None,
            vec![statement(restore_view(RestoreViewTarget::Static(root)))],
            false,
            list,
        )));

        resolve_names(&mut job).unwrap();

        let handler = job.views[&root]
            .create
            .iter()
            .find_map(|op| op.handler_ops())
            .unwrap();
        let Expression::RestoreView(restore) = statement_expr(handler.iter().next().unwrap())
        else {
            panic!("expected a restore view");
        };
        assert!(matches!(
            &restore.view,
            RestoreViewTarget::Dynamic(expr) if matches!(expr.as_ref(), Expression::ReadVariable(r) if r.xref == saved)
        ));
    }

    #[test]
    fn test_restore_view_without_saved_view_fails() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let list = job.base.allocate_list_id();
        job.views[&root].create.push(CreateOp::Listener(create_listener_op(
            XrefId(50),
            SlotHandle::new(),
            "click",
            None,
            vec![statement(restore_view(RestoreViewTarget::Static(root)))],
            false,
            list,
        )));

        assert!(matches!(
            resolve_names(&mut job),
            Err(PipelineError::NoSavedView { .. })
        ));
    }
}
