//! Collapse Singleton Interpolations
//!
//! Attribute or style interpolations of the form `[attr.foo]="{{foo}}"` are collapsed into a
//! plain binding instead of an interpolated one.
//!
//! Singleton property interpolations are left alone, since they still need to stringify their
//! expression.

use crate::error::Result;
use crate::template::pipeline::ir::ops::BindingExpression;
use crate::template::pipeline::ir::UpdateOp;
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn collapse_singleton_interpolations(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        for op in unit.update_mut().iter_mut() {
            let expression = match op {
                UpdateOp::Attribute(op) => &mut op.expression,
                UpdateOp::StyleProp(op) => &mut op.expression,
                UpdateOp::StyleMap(op) | UpdateOp::ClassMap(op) => &mut op.expression,
                _ => continue,
            };
            collapse(expression);
        }
    }
    Ok(())
}

fn collapse(expression: &mut BindingExpression) {
    let BindingExpression::Interpolation(interp) = expression else {
        return;
    };
    if !interp.is_singleton() {
        return;
    }
    if let Some(inner) = interp.expressions.pop() {
        *expression = BindingExpression::Expression(inner);
    }
}
