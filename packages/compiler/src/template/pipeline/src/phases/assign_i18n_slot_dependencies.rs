//! Updates i18n expression ops to target the last slot in their owning i18n block, and moves them
//! after the last update instruction that depends on that slot.

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::I18nExpressionOp;
use crate::template::pipeline::ir::{
    CreateOp, I18nExpressionFor, OpId, OpList, UpdateOp, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

struct BlockState {
    block: XrefId,
    last_slot_consumer: XrefId,
}

pub fn assign_i18n_slot_dependencies(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        // The update op the walk has reached. `None` is the end of the list.
        let mut cursor = unit.update.first();
        let mut in_progress: Vec<I18nExpressionOp> = Vec::new();
        let mut state: Option<BlockState> = None;

        for create_op in unit.create.iter() {
            match create_op {
                CreateOp::I18nStart(start) => {
                    state = Some(BlockState {
                        block: start.xref,
                        last_slot_consumer: start.xref,
                    });
                }
                CreateOp::I18nEnd(_) => {
                    let block = state.take().ok_or_else(|| {
                        PipelineError::assertion("i18n end without a matching i18n start")
                    })?;
                    for mut expr in in_progress.drain(..) {
                        expr.target = block.last_slot_consumer;
                        insert_at(&mut unit.update, cursor, UpdateOp::I18nExpression(expr))?;
                    }
                }
                _ => {}
            }

            let Some(slot_consumer) = create_op.as_consumes_slot() else {
                continue;
            };
            let xref = slot_consumer.xref();
            if let Some(state) = &mut state {
                state.last_slot_consumer = xref;
            }

            while let Some(id) = cursor {
                let next = unit.update.next(id);
                let owned_by_block = match (&state, unit.update.get(id)?) {
                    (Some(state), UpdateOp::I18nExpression(expr)) => {
                        expr.usage == I18nExpressionFor::I18nText && expr.i18n_owner == state.block
                    }
                    _ => false,
                };
                if owned_by_block {
                    if let UpdateOp::I18nExpression(expr) = unit.update.remove(id)? {
                        in_progress.push(expr);
                    }
                    cursor = next;
                    continue;
                }
                if depends_on_other_slot(unit.update.get_mut(id)?, xref) {
                    break;
                }
                cursor = next;
            }
        }
    }
    Ok(())
}

fn insert_at(list: &mut OpList<UpdateOp>, cursor: Option<OpId>, op: UpdateOp) -> Result<()> {
    match cursor {
        Some(anchor) => list.insert_before(anchor, op).map(|_| ()),
        None => {
            list.push(op);
            Ok(())
        }
    }
}

/// Whether `op` needs the slot context to point at something other than `xref`. Statements and
/// variables can hold slot-dependent expressions such as `storeLet`.
fn depends_on_other_slot(op: &mut UpdateOp, xref: XrefId) -> bool {
    if let Some(dependent) = op.as_depends_on_slot_context() {
        return dependent.target() != xref;
    }
    if !matches!(op, UpdateOp::Statement(_) | UpdateOp::Variable(_)) {
        return false;
    }
    let mut different = false;
    op.visit_expressions(&mut |expr, _| {
        if let Some(dependent) = expr.as_depends_on_slot_context() {
            different |= dependent.target() != xref;
        }
    });
    different
}
