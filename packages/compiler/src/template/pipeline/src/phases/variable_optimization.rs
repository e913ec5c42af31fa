//! Optimizes variables declared and used in the IR.
//!
//! Variables are eagerly generated by the pipeline for every possible value that could be
//! referenced. This phase:
//! - inlines variables flagged `ALWAYS_INLINE` into every usage,
//! - removes unused variables, keeping the initializer as a statement when it has side effects
//!   that something later depends on,
//! - inlines variables used exactly once into their usage, when no context access in between
//!   prevents it.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::expression::visit_expressions_in_expression;
use crate::template::pipeline::ir::ops::{StatementOp, VariableOp};
use crate::template::pipeline::ir::{
    CreateOp, ExpressionHolder, OpId, OpList, SemanticVariable, UpdateOp, VariableFlags,
    VisitorContextFlag, XrefId,
};
use crate::template::pipeline::src::compilation::CompilationJob;

bitflags! {
    /// Ordering constraints an expression puts on the code around it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Fence: u8 {
        /// Reads the current view context.
        const CONTEXT_READ = 0b001;
        /// Changes the current view context.
        const CONTEXT_WRITE = 0b010;
        /// Must be executed even when its result is unused.
        const SIDE_EFFECTFUL = 0b100;
    }
}

fn fences_for_expression(expr: &Expression) -> Fence {
    match expr {
        Expression::NextContext(_) => Fence::CONTEXT_READ | Fence::CONTEXT_WRITE,
        Expression::RestoreView(_) => {
            Fence::CONTEXT_READ | Fence::CONTEXT_WRITE | Fence::SIDE_EFFECTFUL
        }
        Expression::StoreLet(_) => Fence::SIDE_EFFECTFUL,
        Expression::Reference(_) | Expression::ContextLetReference(_) => Fence::CONTEXT_READ,
        _ => Fence::empty(),
    }
}

/// Whether an initializer with `decl_fences` may move past code with `fences`.
fn safe_to_inline_past_fences(fences: Fence, decl_fences: Fence) -> bool {
    if fences.contains(Fence::CONTEXT_WRITE) {
        !decl_fences.contains(Fence::CONTEXT_READ)
    } else if fences.contains(Fence::CONTEXT_READ) {
        !decl_fences.contains(Fence::CONTEXT_WRITE)
    } else {
        true
    }
}

/// An op list entry that may declare a variable.
trait VariableHolder: ExpressionHolder + Sized {
    fn as_variable(&self) -> Option<&VariableOp>;

    fn statement(op: StatementOp) -> Self;
}

impl VariableHolder for CreateOp {
    fn as_variable(&self) -> Option<&VariableOp> {
        match self {
            CreateOp::Variable(var) => Some(var),
            _ => None,
        }
    }

    fn statement(op: StatementOp) -> Self {
        CreateOp::Statement(op)
    }
}

impl VariableHolder for UpdateOp {
    fn as_variable(&self) -> Option<&VariableOp> {
        match self {
            UpdateOp::Variable(var) => Some(var),
            _ => None,
        }
    }

    fn statement(op: StatementOp) -> Self {
        UpdateOp::Statement(op)
    }
}

pub fn optimize_variables(job: &mut dyn CompilationJob) -> Result<()> {
    let compat = job.base().is_compat();
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();

        inline_always_inline_variables(create)?;
        inline_always_inline_variables(update)?;
        for op in create.iter_mut() {
            if let Some(ops) = nested_list(op) {
                inline_always_inline_variables(ops)?;
            }
        }

        optimize_variables_in_op_list(create, compat)?;
        optimize_variables_in_op_list(update, compat)?;
        for op in create.iter_mut() {
            if let Some(ops) = nested_list(op) {
                optimize_variables_in_op_list(ops, compat)?;
            }
        }
    }
    Ok(())
}

/// The handler body of a listener, or the track function body of a repeater.
fn nested_list(op: &mut CreateOp) -> Option<&mut OpList<UpdateOp>> {
    match op {
        CreateOp::RepeaterCreate(repeater) => repeater.track_by_ops.as_mut(),
        other => other.handler_ops_mut(),
    }
}

fn inline_always_inline_variables<T: VariableHolder>(ops: &mut OpList<T>) -> Result<()> {
    let mut vars: HashMap<XrefId, (OpId, Expression)> = HashMap::new();
    for id in ops.ids() {
        let op = ops.get_mut(id)?;
        if let Some(var) = op.as_variable() {
            if var.flags.contains(VariableFlags::ALWAYS_INLINE) {
                let mut initializer = var.initializer.as_ref().clone();
                let mut context_sensitive = false;
                visit_expressions_in_expression(
                    &mut initializer,
                    &mut |expr, _| context_sensitive |= !fences_for_expression(expr).is_empty(),
                    VisitorContextFlag::NONE,
                );
                if context_sensitive {
                    return Err(PipelineError::assertion(
                        "a context-sensitive variable was marked always-inline",
                    ));
                }
                vars.insert(var.xref, (id, initializer));
            }
        }
        if vars.is_empty() {
            continue;
        }
        // Inlined by cloning, since a variable may be read in several places.
        op.transform_expressions(
            &mut |expr, _| match expr {
                Expression::ReadVariable(read) => match vars.get(&read.xref) {
                    Some((_, initializer)) => initializer.clone(),
                    None => Expression::ReadVariable(read),
                },
                other => other,
            },
            VisitorContextFlag::NONE,
        );
    }
    for (id, _) in vars.into_values() {
        ops.remove(id)?;
    }
    Ok(())
}

/// What one op reads and which context fences it carries.
#[derive(Debug, Default, Clone)]
struct OpInfo {
    variables_used: HashSet<XrefId>,
    fences: Fence,
}

fn collect_op_info(op: &mut impl ExpressionHolder) -> OpInfo {
    let mut info = OpInfo::default();
    visit_op(op, &mut |expr, _| match expr {
        Expression::ReadVariable(read) => {
            info.variables_used.insert(read.xref);
        }
        other => info.fences |= fences_for_expression(other),
    });
    info
}

fn visit_op(op: &mut impl ExpressionHolder, visitor: &mut dyn FnMut(&Expression, VisitorContextFlag)) {
    op.transform_expressions(
        &mut |expr, flags| {
            visitor(&expr, flags);
            expr
        },
        VisitorContextFlag::NONE,
    );
}

fn count_variable_usages(
    op: &mut impl ExpressionHolder,
    usages: &mut IndexMap<XrefId, usize>,
    remote: &mut HashSet<XrefId>,
) {
    visit_op(op, &mut |expr, flags| {
        let Expression::ReadVariable(read) = expr else {
            return;
        };
        if let Some(count) = usages.get_mut(&read.xref) {
            *count += 1;
            if flags.contains(VisitorContextFlag::IN_CHILD_OPERATION) {
                remote.insert(read.xref);
            }
        }
    });
}

fn uncount_variable_usages(
    op: &mut impl ExpressionHolder,
    usages: &mut IndexMap<XrefId, usize>,
) -> Result<()> {
    let mut error = None;
    visit_op(op, &mut |expr, _| {
        let Expression::ReadVariable(read) = expr else {
            return;
        };
        match usages.get_mut(&read.xref) {
            Some(count) if *count > 0 => *count -= 1,
            Some(_) => {
                error.get_or_insert_with(|| {
                    PipelineError::assertion(format!(
                        "variable {:?} has no remaining usages to remove",
                        read.xref
                    ))
                });
            }
            None => {}
        }
    });
    error.map_or(Ok(()), Err)
}

fn optimize_variables_in_op_list<T: VariableHolder>(
    ops: &mut OpList<T>,
    compat: bool,
) -> Result<()> {
    let mut decls: HashMap<XrefId, OpId> = HashMap::new();
    let mut usages: IndexMap<XrefId, usize> = IndexMap::new();
    let mut remote: HashSet<XrefId> = HashSet::new();
    let mut infos: HashMap<OpId, OpInfo> = HashMap::new();

    for id in ops.ids() {
        let op = ops.get_mut(id)?;
        if let Some(var) = op.as_variable() {
            if decls.insert(var.xref, id).is_some() {
                return Err(PipelineError::assertion(format!(
                    "saw two declarations of variable {:?}",
                    var.xref
                )));
            }
            usages.insert(var.xref, 0);
        }
        infos.insert(id, collect_op_info(op));
        count_variable_usages(op, &mut usages, &mut remote);
    }

    // Walk backwards so removing one variable can make the variables it read unused as well.
    let mut context_is_used = false;
    for id in ops.ids().into_iter().rev() {
        let fences = infos.get(&id).map(|info| info.fences).unwrap_or_default();
        let unused = ops
            .get(id)?
            .as_variable()
            .map(|var| var.xref)
            .filter(|xref| usages.get(xref) == Some(&0));
        if let Some(xref) = unused {
            let info = infos.remove(&id).unwrap_or_default();
            if (context_is_used && fences.contains(Fence::CONTEXT_WRITE))
                || fences.contains(Fence::SIDE_EFFECTFUL)
            {
                // The initializer changes the view context for a later op, or has side effects of
                // its own, so it has to run.
                let new_id = ops.replace_with(id, |op| {
                    let statement = op
                        .as_variable()
                        .map(|var| StatementOp::new(var.initializer.as_ref().clone().to_stmt()));
                    match statement {
                        Some(statement) => T::statement(statement),
                        None => op,
                    }
                })?;
                infos.insert(new_id, info);
            } else {
                let mut removed = ops.remove(id)?;
                uncount_variable_usages(&mut removed, &mut usages)?;
            }
            decls.remove(&xref);
            usages.shift_remove(&xref);
            continue;
        }
        if fences.contains(Fence::CONTEXT_READ) {
            context_is_used = true;
        }
    }

    let candidates: Vec<XrefId> = usages
        .iter()
        .filter(|&(xref, &count)| count == 1 && !remote.contains(xref))
        .map(|(&xref, _)| xref)
        .collect();
    for candidate in candidates {
        let Some(&decl_id) = decls.get(&candidate) else {
            continue;
        };
        let Some(decl) = ops.get(decl_id)?.as_variable() else {
            continue;
        };
        if decl.flags.contains(VariableFlags::ALWAYS_INLINE) {
            continue;
        }
        let decl = decl.clone();
        let decl_info = infos.get(&decl_id).cloned().unwrap_or_default();

        // Find the one op using the variable, stopping early at ops the initializer can't move
        // past.
        let mut cursor = ops.next(decl_id);
        while let Some(target) = cursor {
            cursor = ops.next(target);
            let target_info = infos.get(&target).cloned().unwrap_or_default();
            if !target_info.variables_used.contains(&candidate) {
                if !safe_to_inline_past_fences(target_info.fences, decl_info.fences) {
                    break;
                }
                continue;
            }

            let target_op = ops.get_mut(target)?;
            if compat && !allow_conservative_inlining(&decl, target_op.as_variable().is_some()) {
                break;
            }
            if try_inline_variable_initializer(
                candidate,
                decl.initializer.as_ref().clone(),
                target_op,
                decl_info.fences,
            ) {
                if let Some(info) = infos.get_mut(&target) {
                    info.variables_used.remove(&candidate);
                    info.variables_used.extend(decl_info.variables_used.iter().copied());
                    info.fences |= decl_info.fences;
                }
                ops.remove(decl_id)?;
                infos.remove(&decl_id);
                decls.remove(&candidate);
            }
            break;
        }
    }
    Ok(())
}

/// Compatibility output only inlines a few kinds of variables.
fn allow_conservative_inlining(decl: &VariableOp, into_variable: bool) -> bool {
    match &decl.variable {
        // Aliases of the context are still inlined, as in control flow blocks.
        SemanticVariable::Identifier(_) => {
            matches!(decl.initializer.as_ref(), Expression::ReadVar(read) if read.name == "ctx")
        }
        // Context can only be inlined into other variables.
        SemanticVariable::Context(_) => into_variable,
        _ => true,
    }
}

fn try_inline_variable_initializer(
    xref: XrefId,
    initializer: Expression,
    target: &mut impl ExpressionHolder,
    decl_fences: Fence,
) -> bool {
    let mut initializer = Some(initializer);
    let mut inlined = false;
    let mut inlining_allowed = true;
    target.transform_expressions(
        &mut |expr, flags| {
            if !expr.is_ir_expression() || inlined || !inlining_allowed {
                return expr;
            }
            if flags.contains(VisitorContextFlag::IN_CHILD_OPERATION)
                && decl_fences.contains(Fence::CONTEXT_READ)
            {
                return expr;
            }
            match expr {
                Expression::ReadVariable(read) if read.xref == xref => {
                    match initializer.take() {
                        Some(value) => {
                            inlined = true;
                            value
                        }
                        None => Expression::ReadVariable(read),
                    }
                }
                other => {
                    inlining_allowed &=
                        safe_to_inline_past_fences(fences_for_expression(&other), decl_fences);
                    other
                }
            }
        },
        VisitorContextFlag::NONE,
    );
    inlined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::{
        next_context, read_variable, restore_view, RestoreViewTarget,
    };
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn job() -> ComponentCompilationJob {
        ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default())
    }

    fn variable(xref: XrefId, name: &str, initializer: Expression, flags: VariableFlags) -> UpdateOp {
        UpdateOp::Variable(VariableOp::new(
            xref,
            SemanticVariable::identifier(name, false),
            initializer,
            flags,
        ))
    }

    fn statement(expr: Expression) -> UpdateOp {
        UpdateOp::Statement(StatementOp::new(expr.to_stmt()))
    }

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
    fn test_unused_variables_are_removed() {
        let mut job = job();
        let root = job.root;
        let unused = job.base.allocate_xref_id();
        job.views[&root].update.push(variable(
            unused,
            "item",
            o::variable("ctx").prop("item"),
            VariableFlags::NONE,
        ));

        optimize_variables(&mut job).unwrap();

        assert!(job.views[&root].update.is_empty());
    }

    #[test]
    fn test_side_effectful_initializer_is_kept_as_statement() {
        let mut job = job();
        let root = job.root;
        let saved = job.base.allocate_xref_id();
        let var = job.base.allocate_xref_id();
        job.views[&root].update.push(UpdateOp::Variable(VariableOp::new(
            var,
            SemanticVariable::context(root),
            restore_view(RestoreViewTarget::Dynamic(Box::new(read_variable(saved)))),
            VariableFlags::NONE,
        )));

        optimize_variables(&mut job).unwrap();

        let exprs = statement_exprs(&job.views[&root].update);
        assert_eq!(exprs.len(), 1);
        assert!(matches!(exprs[0], Expression::RestoreView(_)));
    }

    #[test]
    fn test_always_inline_variables_are_inlined_everywhere() {
        let mut job = job();
        let root = job.root;
        let alias = job.base.allocate_xref_id();
        let update = &mut job.views[&root].update;
        update.push(variable(
            alias,
            "$count",
            o::variable("ctx").prop("items").prop("length"),
            VariableFlags::ALWAYS_INLINE,
        ));
        update.push(statement(read_variable(alias)));
        update.push(statement(read_variable(alias).prop("x")));

        optimize_variables(&mut job).unwrap();

        let exprs = statement_exprs(&job.views[&root].update);
        assert_eq!(job.views[&root].update.len(), 2);
        assert!(exprs[0].is_equivalent(&o::variable("ctx").prop("items").prop("length")));
        assert!(exprs[1].is_equivalent(&o::variable("ctx").prop("items").prop("length").prop("x")));
    }

    #[test]
    fn test_single_use_variable_is_inlined() {
        let mut job = job();
        let root = job.root;
        let item = job.base.allocate_xref_id();
        let update = &mut job.views[&root].update;
        update.push(variable(item, "item", o::variable("ctx").prop("item"), VariableFlags::NONE));
        update.push(statement(read_variable(item).prop("name")));

        optimize_variables(&mut job).unwrap();

        let exprs = statement_exprs(&job.views[&root].update);
        assert_eq!(job.views[&root].update.len(), 1);
        assert!(exprs[0].is_equivalent(&o::variable("ctx").prop("item").prop("name")));
    }

    #[test]
    fn test_context_read_is_not_inlined_past_context_write() {
        let mut job = job();
        let root = job.root;
        let parent = job.base.allocate_xref_id();
        let ctx = job.base.allocate_xref_id();
        let update = &mut job.views[&root].update;
        // `const parent = nextContext()` writes the context, so it must stay before the read.
        update.push(UpdateOp::Variable(VariableOp::new(
            parent,
            SemanticVariable::context(root),
            next_context(1),
            VariableFlags::NONE,
        )));
        update.push(UpdateOp::Variable(VariableOp::new(
            ctx,
            SemanticVariable::context(root),
            next_context(1),
            VariableFlags::NONE,
        )));
        update.push(statement(read_variable(parent).prop("a")));
        update.push(statement(read_variable(ctx).prop("b")));

        optimize_variables(&mut job).unwrap();

        let exprs = statement_exprs(&job.views[&root].update);
        // The first variable can't move past the second `nextContext()`.
        assert!(job.views[&root]
            .update
            .iter()
            .any(|op| matches!(op, UpdateOp::Variable(v) if v.xref == parent)));
        assert!(exprs
            .iter()
            .any(|e| matches!(e, Expression::ReadProp(p) if matches!(p.receiver.as_ref(), Expression::NextContext(_)))));
    }
}
