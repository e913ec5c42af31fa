//! Removes `storeLet` calls whose `@let` value is never read from another view.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::expression::visit_expressions_in_expression;
use crate::template::pipeline::ir::{CreateOp, VisitorContextFlag, XrefId};
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn optimize_store_let(job: &mut dyn CompilationJob) -> Result<()> {
    // A `@let` can be read from child views both in listeners and in update blocks, so every op has
    // to be checked.
    let mut used_externally: HashSet<XrefId> = HashSet::new();
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        let mut record = |expr: &Expression, _: VisitorContextFlag| {
            if let Expression::ContextLetReference(reference) = expr {
                used_externally.insert(reference.target);
            }
        };
        for op in create.iter_mut() {
            op.visit_expressions(&mut record);
        }
        for op in update.iter_mut() {
            op.visit_expressions(&mut record);
        }
    }

    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();
        let mut removable = HashSet::new();
        for op in update.iter_mut() {
            op.transform_expressions(
                &mut |expr, _| {
                    let Expression::StoreLet(store) = expr else {
                        return expr;
                    };
                    if used_externally.contains(&store.target) {
                        return Expression::StoreLet(store);
                    }
                    // The declaration has to stay when the value uses pipes, since pipes can inject
                    // through the node it creates.
                    let mut value = *store.value;
                    if !has_pipe(&mut value) {
                        removable.insert(store.target);
                    }
                    value
                },
                VisitorContextFlag::NONE,
            );
        }

        let declarations: HashMap<XrefId, _> = create
            .iter_with_ids()
            .filter_map(|(id, op)| match op {
                CreateOp::DeclareLet(decl) if removable.contains(&decl.xref) => Some((decl.xref, id)),
                _ => None,
            })
            .collect();
        for id in declarations.into_values() {
            create.remove(id)?;
        }
    }
    Ok(())
}

fn has_pipe(expr: &mut Expression) -> bool {
    let mut found = false;
    visit_expressions_in_expression(
        expr,
        &mut |e, _| {
            found |= matches!(e, Expression::PipeBinding(_) | Expression::PipeBindingVariadic(_));
        },
        VisitorContextFlag::NONE,
    );
    found
}
