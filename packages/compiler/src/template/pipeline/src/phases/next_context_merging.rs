//! Merges back-to-back `NextContext` expressions. A `nextContext()` call whose result is discarded
//! can be folded into the next one, which then steps further up the context stack, as long as no
//! op in between relies on the implicit context.

use crate::error::Result;
use crate::output::output_ast::{Expression, Statement};
use crate::template::pipeline::ir::ops::StatementOp;
use crate::template::pipeline::ir::{OpList, UpdateOp, VisitorContextFlag};
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn merge_next_context_expressions(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        for op in create.iter_mut() {
            if let Some(handler_ops) = op.handler_ops_mut() {
                merge_next_contexts_in_ops(handler_ops)?;
            }
        }
        merge_next_contexts_in_ops(update)?;
    }
    Ok(())
}

fn merge_next_contexts_in_ops(ops: &mut OpList<UpdateOp>) -> Result<()> {
    let mut cursor = ops.first();
    while let Some(id) = cursor {
        cursor = ops.next(id);
        let Some(merge_steps) = discarded_next_context_steps(ops.get(id)?) else {
            continue;
        };

        let mut try_to_merge = true;
        let mut candidate = ops.next(id);
        while let Some(candidate_id) = candidate {
            if !try_to_merge {
                break;
            }
            let mut merged = false;
            ops.get_mut(candidate_id)?.transform_expressions(
                &mut |expr, flags| {
                    if !try_to_merge || flags.contains(VisitorContextFlag::IN_CHILD_OPERATION) {
                        return expr;
                    }
                    match expr {
                        Expression::NextContext(mut next) => {
                            next.steps += merge_steps;
                            try_to_merge = false;
                            merged = true;
                            Expression::NextContext(next)
                        }
                        Expression::GetCurrentView(_)
                        | Expression::Reference(_)
                        | Expression::ContextLetReference(_) => {
                            try_to_merge = false;
                            expr
                        }
                        other => other,
                    }
                },
                VisitorContextFlag::NONE,
            );
            if merged {
                ops.remove(id)?;
            }
            candidate = ops.next(candidate_id);
        }
    }
    Ok(())
}

/// Steps of a `nextContext()` call made only for its side effect.
fn discarded_next_context_steps(op: &UpdateOp) -> Option<usize> {
    let UpdateOp::Statement(StatementOp {
        statement: Statement::Expression(statement),
    }) = op
    else {
        return None;
    };
    match statement.expr.as_ref() {
        Expression::NextContext(next) => Some(next.steps),
        _ => None,
    }
}
