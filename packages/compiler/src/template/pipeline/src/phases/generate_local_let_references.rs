//! Replaces each `storeLet` op with a variable that can be used to reference the value within
//! the same view.

use crate::error::Result;
use crate::template::pipeline::ir::expression::store_let;
use crate::template::pipeline::ir::ops::VariableOp;
use crate::template::pipeline::ir::{SemanticVariable, UpdateOp, VariableFlags};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn generate_local_let_references(job: &mut ComponentCompilationJob) -> Result<()> {
    let base = &mut job.base;
    for unit in job.views.values_mut() {
        let mut cursor = unit.update.first();
        while let Some(id) = cursor {
            cursor = unit.update.next(id);
            if !matches!(unit.update.get(id)?, UpdateOp::StoreLet(_)) {
                continue;
            }
            let xref = base.allocate_xref_id();
            unit.update.replace_with(id, |op| match op {
                UpdateOp::StoreLet(op) => UpdateOp::Variable(VariableOp::new(
                    xref,
                    SemanticVariable::identifier(op.declared_name, true),
                    store_let(op.target, op.value),
                    VariableFlags::NONE,
                )),
                other => other,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast::{self as o, Expression};
    use crate::template::pipeline::ir::ops::create_store_let_op;

    #[test]
    fn test_store_let_becomes_local_variable() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let decl = job.base.allocate_xref_id();
        job.views[&root]
            .update
            .push(create_store_let_op(decl, "total", o::variable("a")));

        generate_local_let_references(&mut job).unwrap();

        let Some(UpdateOp::Variable(var)) = job.views[&root].update.iter().next() else {
            panic!("expected a variable op");
        };
        let SemanticVariable::Identifier(identifier) = &var.variable else {
            panic!("expected an identifier variable");
        };
        assert_eq!(identifier.identifier, "total");
        assert!(identifier.local);
        assert!(matches!(
            var.initializer.as_ref(),
            Expression::StoreLet(store) if store.target == decl
        ));
    }
}
