//! Removes text nodes within i18n blocks since they are already hardcoded into the i18n message.
//! Interpolations on these text nodes become i18n expressions of the non-text portions, which are
//! applied later.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::I18nExpressionOp;
use crate::template::pipeline::ir::{
    CreateOp, I18nExpressionFor, I18nParamResolutionTime, SlotHandle, UpdateOp, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

/// Where a removed text node lived.
struct TextOwner {
    block: XrefId,
    handle: SlotHandle,
    context: XrefId,
    /// Set when the text is inside an ICU, whose params are resolved in post-processing.
    icu_context: Option<XrefId>,
}

pub fn convert_i18n_text(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let mut current_block: Option<(XrefId, SlotHandle, XrefId)> = None;
        let mut current_icu: Option<XrefId> = None;
        let mut owners: HashMap<XrefId, TextOwner> = HashMap::new();
        let mut removed = Vec::new();

        for (id, op) in unit.create.iter_with_ids() {
            match op {
                CreateOp::I18nStart(start) => {
                    let context = start.context.ok_or_else(|| {
                        PipelineError::assertion("i18n op should have its context set")
                    })?;
                    current_block = Some((start.xref, start.handle.clone(), context));
                }
                CreateOp::I18nEnd(_) => current_block = None,
                CreateOp::IcuStart(icu) => {
                    let context = icu.context.ok_or_else(|| {
                        PipelineError::assertion("icu op should have its context set")
                    })?;
                    current_icu = Some(context);
                }
                CreateOp::IcuEnd(_) => current_icu = None,
                CreateOp::Text(text) => {
                    if let Some((block, handle, context)) = &current_block {
                        owners.insert(
                            text.xref,
                            TextOwner {
                                block: *block,
                                handle: handle.clone(),
                                context: *context,
                                icu_context: current_icu,
                            },
                        );
                        removed.push(id);
                    }
                }
                _ => {}
            }
        }
        for id in removed {
            unit.create.remove(id)?;
        }

        for id in unit.update.ids() {
            let UpdateOp::InterpolateText(interpolate) = unit.update.get(id)? else {
                continue;
            };
            let Some(owner) = owners.get(&interpolate.target) else {
                continue;
            };
            let resolution_time = if owner.icu_context.is_some() {
                I18nParamResolutionTime::Postprocessing
            } else {
                I18nParamResolutionTime::Creation
            };
            let interpolation = &interpolate.interpolation;
            let expressions: Vec<UpdateOp> = interpolation
                .expressions
                .iter()
                .enumerate()
                .map(|(i, expr)| {
                    // For now the expression depends on the slot context of the enclosing block.
                    // Slot dependency assignment moves it later.
                    UpdateOp::I18nExpression(I18nExpressionOp {
                        context: owner.icu_context.unwrap_or(owner.context),
                        target: interpolate.target,
                        i18n_owner: owner.block,
                        handle: owner.handle.clone(),
                        expression: expr.clone(),
                        icu_placeholder: None,
                        i18n_placeholder: interpolation.i18n_placeholders.get(i).cloned(),
                        resolution_time,
                        usage: I18nExpressionFor::I18nText,
                        name: String::new(),
                    })
                })
                .collect();
            unit.update.insert_all_before(id, expressions)?;
            unit.update.remove(id)?;
        }
    }
    Ok(())
}
