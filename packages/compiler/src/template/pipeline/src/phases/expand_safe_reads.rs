//! Finds all unresolved safe read expressions, and converts them into the appropriate output AST
//! reads, guarded by null checks. Temporaries are generated as needed, to avoid re-evaluating the
//! same sub-expression multiple times.
//!
//! Safe reads such as `a?.b` default to `null` rather than `undefined` in templates.

use std::collections::HashSet;

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::expression::{
    assign_temporary, read_temporary, safe_ternary, transform_expressions_in_expression,
    SafeTernaryExpr,
};
use crate::template::pipeline::ir::{VisitorContextFlag, XrefId};
use crate::template::pipeline::src::compilation::{
    transform_unit_expressions, CompilationJob, JobBase,
};

pub fn expand_safe_reads(job: &mut dyn CompilationJob) -> Result<()> {
    let (base, units) = job.parts_mut();
    for unit in units {
        transform_unit_expressions(unit, &mut |expr, _| safe_transform(expr, base));
        transform_unit_expressions(unit, &mut |expr, _| ternary_transform(expr));
    }
    Ok(())
}

/// One property, keyed or call access applied to a receiver.
enum Access {
    Prop(String),
    Key(Expression),
    Call(Vec<Expression>),
}

impl Access {
    fn apply(self, receiver: Expression) -> Expression {
        match self {
            Access::Prop(name) => receiver.prop(name),
            Access::Key(index) => receiver.key(index),
            Access::Call(args) => receiver.call_fn(args),
        }
    }
}

fn access_receiver(expr: &Expression) -> Option<&Expression> {
    match expr {
        Expression::SafePropertyRead(e) => Some(&e.receiver),
        Expression::SafeKeyedRead(e) => Some(&e.receiver),
        Expression::SafeInvokeFunction(e) => Some(&e.receiver),
        Expression::ReadProp(e) => Some(&e.receiver),
        Expression::ReadKey(e) => Some(&e.receiver),
        Expression::InvokeFn(e) => Some(&e.fn_),
        _ => None,
    }
}

/// Splits an access expression into its receiver, the access itself, and whether it is safe.
fn split_access(expr: Expression) -> std::result::Result<(Expression, Access, bool), Expression> {
    Ok(match expr {
        Expression::SafePropertyRead(e) => (*e.receiver, Access::Prop(e.name), true),
        Expression::SafeKeyedRead(e) => (*e.receiver, Access::Key(*e.index), true),
        Expression::SafeInvokeFunction(e) => (*e.receiver, Access::Call(e.args), true),
        Expression::ReadProp(e) => (*e.receiver, Access::Prop(e.name), false),
        Expression::ReadKey(e) => (*e.receiver, Access::Key(*e.index), false),
        Expression::InvokeFn(e) => (*e.fn_, Access::Call(e.args), false),
        other => return Err(other),
    })
}

fn safe_transform(expr: Expression, base: &mut JobBase) -> Expression {
    let is_safe = matches!(
        expr,
        Expression::SafePropertyRead(_)
            | Expression::SafeKeyedRead(_)
            | Expression::SafeInvokeFunction(_)
    );
    let extends_ternary = matches!(access_receiver(&expr), Some(Expression::SafeTernary(_)));
    if !is_safe && !extends_ternary {
        return expr;
    }
    let (receiver, access, safe) = match split_access(expr) {
        Ok(parts) => parts,
        Err(expr) => return expr,
    };

    match receiver {
        // An access on an already expanded safe chain continues the chain inside the deepest
        // ternary, so `a?.b.c` guards `.c` with the same null check as `.b`.
        Expression::SafeTernary(ternary) => Expression::SafeTernary(extend_deepest(
            ternary,
            |inner| {
                if safe {
                    safe_ternary_with_temporary(inner, |r| access.apply(r), base)
                } else {
                    access.apply(inner)
                }
            },
        )),
        receiver => safe_ternary_with_temporary(receiver, |r| access.apply(r), base),
    }
}

fn extend_deepest(
    mut ternary: SafeTernaryExpr,
    extend: impl FnOnce(Expression) -> Expression,
) -> SafeTernaryExpr {
    let inner = match *ternary.expr {
        Expression::SafeTernary(nested) => Expression::SafeTernary(extend_deepest(nested, extend)),
        other => extend(other),
    };
    ternary.expr = Box::new(inner);
    ternary
}

/// Whether the guard of a safe access has to be stored in a temporary to avoid evaluating it
/// twice.
fn needs_temporary_in_safe_access(expr: &Expression) -> bool {
    match expr {
        Expression::Unary(e) => needs_temporary_in_safe_access(&e.expr),
        Expression::BinaryOp(e) => {
            needs_temporary_in_safe_access(&e.lhs) || needs_temporary_in_safe_access(&e.rhs)
        }
        Expression::Conditional(e) => {
            e.false_case
                .as_deref()
                .is_some_and(needs_temporary_in_safe_access)
                || needs_temporary_in_safe_access(&e.condition)
                || needs_temporary_in_safe_access(&e.true_case)
        }
        Expression::NotExpr(e) => needs_temporary_in_safe_access(&e.condition),
        Expression::AssignTemporary(e) => needs_temporary_in_safe_access(&e.expr),
        Expression::ReadProp(e) => needs_temporary_in_safe_access(&e.receiver),
        Expression::ReadKey(e) => {
            needs_temporary_in_safe_access(&e.receiver) || needs_temporary_in_safe_access(&e.index)
        }
        Expression::Parens(e) => needs_temporary_in_safe_access(&e.expr),
        // An already expanded chain, such as the key in `a?.[b?.c()]?.d`.
        Expression::SafeTernary(e) => {
            needs_temporary_in_safe_access(&e.guard) || needs_temporary_in_safe_access(&e.expr)
        }
        Expression::InvokeFn(_)
        | Expression::LiteralArray(_)
        | Expression::LiteralMap(_)
        | Expression::SafeInvokeFunction(_)
        | Expression::PipeBinding(_) => true,
        _ => false,
    }
}

fn temporaries_in(expr: &Expression) -> HashSet<XrefId> {
    let mut temporaries = HashSet::new();
    transform_expressions_in_expression(
        expr.clone(),
        &mut |e, _| {
            if let Expression::AssignTemporary(assign) = &e {
                temporaries.insert(assign.xref);
            }
            e
        },
        VisitorContextFlag::NONE,
    );
    temporaries
}

fn eliminate_temporary_assignments(
    expr: Expression,
    temporaries: &HashSet<XrefId>,
    base: &JobBase,
) -> Expression {
    transform_expressions_in_expression(
        expr,
        &mut |e, _| match e {
            Expression::AssignTemporary(assign) if temporaries.contains(&assign.xref) => {
                // Compatibility output assigns the temporary to itself.
                if base.is_compat() {
                    assign_temporary(read_temporary(assign.xref), assign.xref)
                } else {
                    read_temporary(assign.xref)
                }
            }
            other => other,
        },
        VisitorContextFlag::NONE,
    )
}

/// A safe ternary guarded by `guard`, with a body built from the guard by `body`.
fn safe_ternary_with_temporary(
    guard: Expression,
    body: impl FnOnce(Expression) -> Expression,
    base: &mut JobBase,
) -> Expression {
    if needs_temporary_in_safe_access(&guard) {
        let xref = base.allocate_xref_id();
        return safe_ternary(assign_temporary(guard, xref), body(read_temporary(xref)));
    }
    // In `a?.[b?.c()]?.d` the temporary assigned in the key would be duplicated into both sides of
    // the `?.d` check, so the body side reads it instead.
    let temporaries = temporaries_in(&guard);
    let read = eliminate_temporary_assignments(guard.clone(), &temporaries, base);
    safe_ternary(guard, body(read))
}

/// `(guard == null ? null : expr)`
fn ternary_transform(expr: Expression) -> Expression {
    let Expression::SafeTernary(ternary) = expr else {
        return expr;
    };
    o::parens(
        ternary
            .guard
            .equals(o::null_expr())
            .conditional(o::null_expr(), Some(*ternary.expr)),
    )
}
