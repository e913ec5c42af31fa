//! Pipes that accept more than 4 arguments are variadic, and are handled with a different runtime
//! instruction.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::expression::PipeBindingVariadicExpr;
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

/// The largest argument count with a dedicated `pipeBindN` instruction.
const MAX_FIXED_PIPE_ARGS: usize = 4;

pub fn create_variadic_pipes(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for op in unit.update.iter_mut() {
            op.transform_expressions(&mut make_variadic, VisitorContextFlag::NONE);
        }
    }
    Ok(())
}

fn make_variadic(expr: Expression, _flags: VisitorContextFlag) -> Expression {
    match expr {
        Expression::PipeBinding(pipe) if pipe.args.len() > MAX_FIXED_PIPE_ARGS => {
            let num_args = pipe.args.len();
            Expression::PipeBindingVariadic(PipeBindingVariadicExpr {
                var_offset: pipe.var_offset,
                target: pipe.target,
                target_slot: pipe.target_slot,
                name: pipe.name,
                args: Box::new(o::literal_arr(pipe.args)),
                num_args,
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::expression::pipe_binding;
    use crate::template::pipeline::ir::ops::StatementOp;
    use crate::template::pipeline::ir::{SlotHandle, UpdateOp, XrefId};

    fn args(count: usize) -> Vec<Expression> {
        (0..count).map(|i| o::variable(format!("a{}", i))).collect()
    }

    #[test]
    fn test_only_pipes_with_more_than_four_args_become_variadic() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        for count in [4, 5] {
            let pipe = pipe_binding(XrefId(count), SlotHandle::new(), "p", args(count));
            job.views[&root]
                .update
                .push(UpdateOp::Statement(StatementOp::new(pipe.to_stmt())));
        }

        create_variadic_pipes(&mut job).unwrap();

        let pipes: Vec<_> = job.views[&root]
            .update
            .iter()
            .filter_map(|op| match op {
                UpdateOp::Statement(stmt) => match &stmt.statement {
                    o::Statement::Expression(e) => Some(e.expr.as_ref().clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(matches!(&pipes[0], Expression::PipeBinding(p) if p.args.len() == 4));
        let Expression::PipeBindingVariadic(variadic) = &pipes[1] else {
            panic!("expected a variadic pipe");
        };
        assert_eq!(variadic.num_args, 5);
        assert!(matches!(
            variadic.args.as_ref(),
            Expression::LiteralArray(arr) if arr.entries.len() == 5
        ));
    }
}
