//! Remove Empty Bindings
//!
//! Binding with no content can be safely deleted.

use crate::error::Result;
use crate::template::pipeline::ir::ops::BindingExpression;
use crate::template::pipeline::ir::UpdateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn remove_empty_bindings(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let mut cursor = unit.update.first();
        while let Some(id) = cursor {
            cursor = unit.update.next(id);
            if is_empty_binding(unit.update.get(id)?) {
                unit.update.remove(id)?;
            }
        }
    }
    Ok(())
}

fn is_empty_binding(op: &UpdateOp) -> bool {
    let expression = match op {
        UpdateOp::Attribute(op) => &op.expression,
        UpdateOp::Binding(op) => &op.expression,
        UpdateOp::Property(op) => &op.expression,
        UpdateOp::StyleProp(op) => &op.expression,
        UpdateOp::StyleMap(op) | UpdateOp::ClassMap(op) => &op.expression,
        UpdateOp::ClassProp(op) => return op.expression.is_empty_expr(),
        _ => return false,
    };
    matches!(expression, BindingExpression::Expression(expr) if expr.is_empty_expr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::expression::empty;
    use crate::template::pipeline::ir::ops::{create_property_op, ClassPropOp};
    use crate::template::pipeline::ir::{BindingKind, XrefId};

    #[test]
    fn test_empty_bindings_are_removed() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let update = &mut job.views[&root].update;
        update.push(UpdateOp::Property(create_property_op(
            XrefId(1),
            "a",
            empty(),
            BindingKind::Property,
            vec![],
        )));
        update.push(UpdateOp::ClassProp(ClassPropOp {
            target: XrefId(1),
            name: "b".to_string(),
            expression: empty(),
        }));
        update.push(UpdateOp::Property(create_property_op(
            XrefId(1),
            "c",
            o::variable("c"),
            BindingKind::Property,
            vec![],
        )));

        remove_empty_bindings(&mut job).unwrap();
        let update = &job.views[&root].update;
        assert_eq!(update.len(), 1);
        assert!(matches!(update.iter().next(), Some(UpdateOp::Property(op)) if op.name == "c"));
    }
}
