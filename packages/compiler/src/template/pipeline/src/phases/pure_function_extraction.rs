//! Moves the bodies of pure functions into shared constants. Each body becomes an arrow function
//! over `a0..aN` in the constant pool, and the expression keeps a reference to it.

use crate::constant_pool::{ConstantPool, GenericKeyFn, SharedConstantDefinition};
use crate::error::Result;
use crate::output::output_ast::{self as o, ArrowFunctionBody, Expression, FnParam};
use crate::template::pipeline::ir::expression::transform_expressions_in_expression;
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn extract_pure_functions(job: &mut dyn CompilationJob) -> Result<()> {
    let (base, units) = job.parts_mut();
    let pool = &mut base.pool;
    for unit in units {
        let (create, update) = unit.lists_mut();
        for op in create.iter_mut() {
            op.transform_expressions(&mut |expr, _| extract(pool, expr), VisitorContextFlag::NONE);
        }
        for op in update.iter_mut() {
            op.transform_expressions(&mut |expr, _| extract(pool, expr), VisitorContextFlag::NONE);
        }
    }
    Ok(())
}

fn extract(pool: &mut ConstantPool, mut expr: Expression) -> Expression {
    if let Expression::PureFunction(pure) = &mut expr {
        if let Some(body) = pure.body.take() {
            let definition = PureFunctionConstant {
                num_args: pure.args.len(),
            };
            pure.fn_ = Some(Box::new(pool.get_shared_constant(&definition, *body)));
        }
    }
    expr
}

struct PureFunctionConstant {
    num_args: usize,
}

impl SharedConstantDefinition for PureFunctionConstant {
    fn key_of(&self, expr: &Expression) -> String {
        GenericKeyFn::INSTANCE.key_of(expr)
    }

    fn to_shared_constant_declaration(&self, name: String, expr: Expression) -> o::Statement {
        let params = (0..self.num_args)
            .map(|index| FnParam {
                name: format!("a{index}"),
            })
            .collect();
        // Parameters of nested pure functions were replaced when those were extracted, so every
        // parameter left belongs to this body.
        let body = transform_expressions_in_expression(
            expr,
            &mut |expr, _| match expr {
                Expression::PureFunctionParameter(param) => o::variable(format!("a{}", param.index)),
                other => other,
            },
            VisitorContextFlag::NONE,
        );
        o::declare_var(
            name,
            Some(o::arrow_fn(params, ArrowFunctionBody::Expression(Box::new(body)))),
            o::StmtModifier::FINAL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::template::pipeline::ir::expression::{pure_function, pure_function_parameter};
    use crate::template::pipeline::ir::ops::create_property_op;
    use crate::template::pipeline::ir::{BindingKind, UpdateOp, XrefId};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn array_binding(arg: &str) -> UpdateOp {
        UpdateOp::Property(create_property_op(
            XrefId(9),
            "items",
            pure_function(
                o::literal_arr(vec![o::literal("x"), pure_function_parameter(0)]),
                vec![o::variable(arg)],
            ),
            BindingKind::Property,
            vec![],
        ))
    }

    #[test]
    fn test_equal_bodies_share_one_constant() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        job.views[&root].update.push(array_binding("a"));
        job.views[&root].update.push(array_binding("b"));

        extract_pure_functions(&mut job).unwrap();

        assert_eq!(job.base.pool.statements.len(), 1);
        match &job.base.pool.statements[0] {
            o::Statement::DeclareVar(decl) => {
                assert_eq!(decl.name, "_c0");
                assert!(matches!(decl.value.as_deref(), Some(Expression::ArrowFn(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
        let mut fns = Vec::new();
        for op in job.views[&root].update.iter_mut() {
            op.visit_expressions(&mut |expr, _| {
                if let Expression::PureFunction(pure) = expr {
                    assert!(pure.body.is_none());
                    fns.extend(pure.fn_.as_deref().cloned());
                }
            });
        }
        assert_eq!(fns.len(), 2);
        assert!(fns.iter().all(|f| f.is_equivalent(&o::variable("_c0"))));
    }
}
