//! Adds an `i18nApply` after each run of i18n expressions that target the same i18n block or i18n
//! attribute owner.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::{create_i18n_apply_op, I18nExpressionOp};
use crate::template::pipeline::ir::{CreateOp, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn apply_i18n_expressions(job: &mut ComponentCompilationJob) -> Result<()> {
    // Context xref to the i18n block it belongs to, `None` for attribute contexts.
    let mut context_blocks: HashMap<XrefId, Option<XrefId>> = HashMap::new();
    for unit in job.views.values() {
        for op in unit.create.iter() {
            if let CreateOp::I18nContext(context) = op {
                context_blocks.insert(context.xref, context.i18n_block);
            }
        }
    }

    for unit in job.views.values_mut() {
        for id in unit.update.ids() {
            let UpdateOp::I18nExpression(expr) = unit.update.get(id)? else {
                continue;
            };
            let next = match unit.update.next(id) {
                Some(next) => unit.update.get(next)?,
                None => {
                    let apply = create_i18n_apply_op(expr.i18n_owner, expr.handle.clone());
                    unit.update.insert_after(id, apply)?;
                    continue;
                }
            };
            if needs_application(&context_blocks, expr, next)? {
                let apply = create_i18n_apply_op(expr.i18n_owner, expr.handle.clone());
                unit.update.insert_after(id, apply)?;
            }
        }
    }
    Ok(())
}

/// An expression is applied unless the next op is an expression for the same i18n block, or for
/// the same owner in the case of i18n attributes.
fn needs_application(
    context_blocks: &HashMap<XrefId, Option<XrefId>>,
    expr: &I18nExpressionOp,
    next: &UpdateOp,
) -> Result<bool> {
    let UpdateOp::I18nExpression(next) = next else {
        return Ok(true);
    };
    let block = context_blocks
        .get(&expr.context)
        .ok_or(PipelineError::MissingI18nContext(expr.context))?;
    let next_block = context_blocks
        .get(&next.context)
        .ok_or(PipelineError::MissingI18nContext(next.context))?;

    Ok(match block {
        Some(_) => block != next_block,
        None => expr.i18n_owner != next.i18n_owner,
    })
}
