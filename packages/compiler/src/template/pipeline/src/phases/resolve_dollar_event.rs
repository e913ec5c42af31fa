//! Any variable inside a listener with the name `$event` is transformed into an output lexical
//! read immediately, and does not participate in any of the normal logic for handling variables.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::{CreateOp, VisitorContextFlag};
use crate::template::pipeline::src::compilation::CompilationJob;

const DOLLAR_EVENT: &str = "$event";

pub fn resolve_dollar_event(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        for op in unit.create_mut().iter_mut() {
            if !matches!(op, CreateOp::Listener(_) | CreateOp::TwoWayListener(_)) {
                continue;
            }
            let mut consumes_dollar_event = false;
            op.transform_expressions(
                &mut |expr, _| match expr {
                    Expression::LexicalRead(read) if read.name == DOLLAR_EVENT => {
                        consumes_dollar_event = true;
                        o::variable(read.name)
                    }
                    other => other,
                },
                VisitorContextFlag::IN_CHILD_OPERATION,
            );
            // Two-way listeners always consume `$event`, so they don't track it.
            if let CreateOp::Listener(listener) = op {
                listener.consumes_dollar_event |= consumes_dollar_event;
            }
        }
    }
    Ok(())
}
