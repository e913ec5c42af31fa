//! Transforms a `TwoWayBindingSet` expression into an expression that either sets a value through
//! the `twoWayBindingSet` instruction or falls back to setting the value directly. E.g. the
//! expression `TwoWayBindingSet(target, value)` becomes:
//! `ng.twoWayBindingSet(target, value) || (target = value)`.

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::{CreateOp, VisitorContextFlag};
use crate::template::pipeline::src::compilation::CompilationJob;
use crate::template::pipeline::src::instruction as ng;

pub fn transform_two_way_binding_set(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        for op in unit.create_mut().iter_mut() {
            if !matches!(op, CreateOp::TwoWayListener(_)) {
                continue;
            }
            let mut error = None;
            op.transform_expressions(
                &mut |expr, flags| {
                    if !flags.contains(VisitorContextFlag::IN_CHILD_OPERATION) {
                        return expr;
                    }
                    match expr {
                        Expression::TwoWayBindingSet(set) => {
                            let (target, value) = (*set.target, *set.value);
                            match target {
                                Expression::ReadProp(_) | Expression::ReadKey(_) => {
                                    ng::two_way_binding_set(target.clone(), value.clone())
                                        .or(target.set(value))
                                }
                                // A variable read targets a local template variable. Writing into
                                // it would assign a constant, so only the instruction is emitted.
                                Expression::ReadVariable(_) => ng::two_way_binding_set(target, value),
                                other => {
                                    error.get_or_insert_with(|| {
                                        PipelineError::unsupported(format!(
                                            "unsupported expression in two-way action binding: {:?}",
                                            other
                                        ))
                                    });
                                    value
                                }
                            }
                        }
                        other => other,
                    }
                },
                VisitorContextFlag::IN_CHILD_OPERATION,
            );
            if let Some(error) = error {
                return Err(error);
            }
        }
    }
    Ok(())
}
