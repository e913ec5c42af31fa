//! Calls to the `$any` builtin only exist for type checking. They are replaced by their argument.

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::CompilationJob;

const ANY_CAST: &str = "$any";

pub fn delete_any_casts(job: &mut dyn CompilationJob) -> Result<()> {
    let mut error = None;
    let mut remove_anys = |expr: Expression, _flags: VisitorContextFlag| match expr {
        Expression::InvokeFn(mut call)
            if matches!(call.fn_.as_ref(), Expression::LexicalRead(read) if read.name == ANY_CAST) =>
        {
            if call.args.len() != 1 {
                error.get_or_insert_with(|| {
                    PipelineError::unsupported("the $any builtin function expects exactly one argument")
                });
                return Expression::InvokeFn(call);
            }
            call.args.remove(0)
        }
        other => other,
    };

    for unit in job.units_mut() {
        for op in unit.create_mut().iter_mut() {
            op.transform_expressions(&mut remove_anys, VisitorContextFlag::NONE);
        }
        for op in unit.update_mut().iter_mut() {
            op.transform_expressions(&mut remove_anys, VisitorContextFlag::NONE);
        }
    }
    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
