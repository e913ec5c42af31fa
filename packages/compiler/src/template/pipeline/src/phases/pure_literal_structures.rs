//! Pure Literal Structures
//!
//! Literal arrays and maps in bindings are rewritten into pure functions of their non-constant
//! entries, so the runtime only allocates a new structure when one of those entries changes.

use crate::error::Result;
use crate::output::output_ast::{
    self as o, Expression, LiteralArrayExpr, LiteralMapEntry, LiteralMapExpr,
};
use crate::template::pipeline::ir::expression::{pure_function, pure_function_parameter};
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn generate_pure_literal_structures(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        for op in unit.update_mut().iter_mut() {
            op.transform_expressions(&mut transform_literal, VisitorContextFlag::NONE);
        }
    }
    Ok(())
}

fn transform_literal(expr: Expression, flags: VisitorContextFlag) -> Expression {
    if flags.contains(VisitorContextFlag::IN_CHILD_OPERATION) {
        return expr;
    }
    match expr {
        Expression::LiteralArray(array) => transform_literal_array(array),
        Expression::LiteralMap(map) => transform_literal_map(map),
        other => other,
    }
}

fn transform_literal_array(expr: LiteralArrayExpr) -> Expression {
    let mut non_constant_args = Vec::new();
    let derived_entries = expr
        .entries
        .into_iter()
        .map(|entry| {
            if entry.is_constant() {
                return entry;
            }
            let index = non_constant_args.len();
            non_constant_args.push(entry);
            pure_function_parameter(index)
        })
        .collect();
    pure_function(o::literal_arr(derived_entries), non_constant_args)
}

fn transform_literal_map(expr: LiteralMapExpr) -> Expression {
    let mut non_constant_args = Vec::new();
    let derived_entries = expr
        .entries
        .into_iter()
        .map(|entry| {
            if entry.value.is_constant() {
                return entry;
            }
            let index = non_constant_args.len();
            non_constant_args.push(*entry.value);
            LiteralMapEntry {
                key: entry.key,
                value: Box::new(pure_function_parameter(index)),
                quoted: entry.quoted,
            }
        })
        .collect();
    pure_function(o::literal_map(derived_entries), non_constant_args)
}
