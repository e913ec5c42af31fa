//! Strips parentheses from expressions, except where they are required:
//!
//! 1. A unary operator as the base of an exponentiation. `-2 ** 3` is not valid JavaScript, but
//!    `(-2) ** 3` is.
//! 2. `&&` or `||` as an operand of `??`, and `??` as the left operand of `&&` or `||`. Mixing
//!    them without parentheses is not valid JavaScript.
//! 3. A ternary as an operand of `??`. Printers drop the parentheses of `(a ? b : c) ?? d`
//!    otherwise, which changes its meaning.
//!
//! Children are rewritten before their parents, so every parenthesized node is unwrapped first and
//! the binary operator that needs one wraps its operand again.

use crate::error::Result;
use crate::output::output_ast::{self as o, BinaryOperator, BinaryOperatorExpr, Expression};
use crate::template::pipeline::ir::VisitorContextFlag;
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn strip_nonrequired_parentheses(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        for op in unit.create_mut().iter_mut() {
            op.transform_expressions(&mut strip, VisitorContextFlag::NONE);
        }
        for op in unit.update_mut().iter_mut() {
            op.transform_expressions(&mut strip, VisitorContextFlag::NONE);
        }
    }
    Ok(())
}

fn strip(expr: Expression, _flags: VisitorContextFlag) -> Expression {
    match expr {
        Expression::Parens(parens) => *parens.expr,
        Expression::BinaryOp(mut binary) => {
            if lhs_requires_parens(binary.operator, &binary.lhs) {
                wrap(&mut binary.lhs);
            }
            if binary.operator == BinaryOperator::NullishCoalesce
                && is_nullish_operand_requiring_parens(&binary.rhs)
            {
                wrap(&mut binary.rhs);
            }
            Expression::BinaryOp(binary)
        }
        other => other,
    }
}

fn lhs_requires_parens(operator: BinaryOperator, lhs: &Expression) -> bool {
    match operator {
        BinaryOperator::Exponentiation => matches!(lhs, Expression::Unary(_)),
        BinaryOperator::NullishCoalesce => is_nullish_operand_requiring_parens(lhs),
        BinaryOperator::And | BinaryOperator::Or => matches!(
            lhs,
            Expression::BinaryOp(BinaryOperatorExpr {
                operator: BinaryOperator::NullishCoalesce,
                ..
            })
        ),
        _ => false,
    }
}

fn is_nullish_operand_requiring_parens(operand: &Expression) -> bool {
    match operand {
        Expression::BinaryOp(binary) => {
            matches!(binary.operator, BinaryOperator::And | BinaryOperator::Or)
        }
        Expression::Conditional(_) => true,
        _ => false,
    }
}

fn wrap(operand: &mut Box<Expression>) {
    let inner = std::mem::replace(operand.as_mut(), o::null_expr());
    **operand = o::parens(inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::output_ast::{UnaryOperator, UnaryOperatorExpr};
    use crate::template::pipeline::ir::expression::transform_expressions_in_expression;

    fn stripped(expr: Expression) -> Expression {
        transform_expressions_in_expression(expr, &mut strip, VisitorContextFlag::NONE)
    }

    fn var(name: &str) -> Expression {
        o::variable(name)
    }

    #[test]
    fn test_redundant_parentheses_are_removed() {
        let expr = o::parens(var("a").binary(BinaryOperator::Plus, o::parens(var("b"))));
        assert!(stripped(expr).is_equivalent(&var("a").binary(BinaryOperator::Plus, var("b"))));
    }

    #[test]
    fn test_unary_base_of_exponentiation_keeps_parentheses() {
        let minus_two = Expression::Unary(UnaryOperatorExpr {
            operator: UnaryOperator::Minus,
            expr: Box::new(o::literal(2.0)),
        });
        let expr = o::parens(minus_two.clone())
            .binary(BinaryOperator::Exponentiation, o::literal(3.0));
        let expected =
            o::parens(minus_two).binary(BinaryOperator::Exponentiation, o::literal(3.0));
        assert!(stripped(expr).is_equivalent(&expected));
    }

    #[test]
    fn test_mixed_nullish_and_logical_operators_keep_parentheses() {
        let and = var("b").binary(BinaryOperator::And, var("c"));
        let expr = var("a").binary(BinaryOperator::NullishCoalesce, o::parens(and.clone()));
        let expected = var("a").binary(BinaryOperator::NullishCoalesce, o::parens(and));
        assert!(stripped(expr).is_equivalent(&expected));

        let nullish = var("a").binary(BinaryOperator::NullishCoalesce, var("b"));
        let expr = o::parens(nullish.clone()).binary(BinaryOperator::Or, var("c"));
        let expected = o::parens(nullish).binary(BinaryOperator::Or, var("c"));
        assert!(stripped(expr).is_equivalent(&expected));
    }

    #[test]
    fn test_ternary_operand_of_nullish_keeps_parentheses() {
        let ternary = var("a").conditional(var("b"), Some(var("c")));
        let expr =
            o::parens(o::parens(ternary.clone())).binary(BinaryOperator::NullishCoalesce, var("d"));
        let expected = o::parens(ternary).binary(BinaryOperator::NullishCoalesce, var("d"));
        assert!(stripped(expr).is_equivalent(&expected));
    }
}
