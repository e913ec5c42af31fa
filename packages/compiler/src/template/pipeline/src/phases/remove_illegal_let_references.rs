//! A `@let` declaration may not be read before it is declared, nor from its own initializer. Such
//! reads would otherwise resolve to a variable that is not yet defined, so they are replaced with
//! `undefined` and left for the type checker to report.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression, LiteralValue};
use crate::template::pipeline::ir::{SemanticVariable, UpdateOp, VisitorContextFlag};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn remove_illegal_let_references(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        for id in unit.update.ids() {
            let identifier = match unit.update.get(id)? {
                UpdateOp::Variable(var) if matches!(*var.initializer, Expression::StoreLet(_)) => {
                    match &var.variable {
                        SemanticVariable::Identifier(ident) => ident.identifier.clone(),
                        _ => continue,
                    }
                }
                _ => continue,
            };

            let mut replace = |expr: Expression, _flags: VisitorContextFlag| match expr {
                Expression::LexicalRead(read) if read.name == identifier => {
                    o::literal(LiteralValue::Undefined)
                }
                other => other,
            };
            let mut cursor = Some(id);
            while let Some(current) = cursor {
                unit.update
                    .get_mut(current)?
                    .transform_expressions(&mut replace, VisitorContextFlag::NONE);
                cursor = unit.update.prev(current);
            }
        }
    }
    Ok(())
}
