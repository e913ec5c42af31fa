//! Some property and attribute bindings carry an i18n message. Their interpolated parts are
//! turned into `i18nExp` expressions applied through the element's `I18nAttributes` op.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::{I18nAttributesOp, I18nExpressionOp, Interpolation};
use crate::template::pipeline::ir::{
    CreateOp, I18nExpressionFor, I18nParamResolutionTime, SlotHandle, UpdateOp, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn convert_i18n_bindings(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        // Element xref to its attributes op xref and slot.
        let owners: HashMap<XrefId, (XrefId, SlotHandle)> = unit
            .create
            .iter()
            .filter_map(|op| match op {
                CreateOp::I18nAttributes(I18nAttributesOp {
                    xref,
                    handle,
                    target,
                    ..
                }) => Some((*target, (*xref, handle.clone()))),
                _ => None,
            })
            .collect();

        for id in unit.update.ids() {
            let (target, name, context, expression) = match unit.update.get(id)? {
                UpdateOp::Property(op) => (op.target, &op.name, op.i18n_context, &op.expression),
                UpdateOp::Attribute(op) => (op.target, &op.name, op.i18n_context, &op.expression),
                _ => continue,
            };
            let (Some(context), Some(interpolation)) = (context, expression.as_interpolation())
            else {
                continue;
            };
            let (owner, handle) = owners.get(&target).ok_or_else(|| {
                PipelineError::assertion(
                    "an i18n attribute binding requires its element to have an I18nAttributes op",
                )
            })?;
            let expressions = attribute_expressions(
                context,
                target,
                *owner,
                handle,
                name,
                interpolation,
            )?;
            unit.update.insert_all_before(id, expressions)?;
            unit.update.remove(id)?;
        }
    }
    Ok(())
}

fn attribute_expressions(
    context: XrefId,
    target: XrefId,
    owner: XrefId,
    handle: &SlotHandle,
    name: &str,
    interpolation: &Interpolation,
) -> Result<Vec<UpdateOp>> {
    if interpolation.i18n_placeholders.len() != interpolation.expressions.len() {
        return Err(PipelineError::assertion(format!(
            "an i18n attribute binding requires one placeholder per expression, but found {} \
             placeholders and {} expressions",
            interpolation.i18n_placeholders.len(),
            interpolation.expressions.len()
        )));
    }
    Ok(interpolation
        .expressions
        .iter()
        .zip(&interpolation.i18n_placeholders)
        .map(|(expression, placeholder)| {
            UpdateOp::I18nExpression(I18nExpressionOp {
                context,
                target,
                i18n_owner: owner,
                handle: handle.clone(),
                expression: expression.clone(),
                icu_placeholder: None,
                i18n_placeholder: Some(placeholder.clone()),
                resolution_time: I18nParamResolutionTime::Creation,
                usage: I18nExpressionFor::I18nAttribute,
                name: name.to_string(),
            })
        })
        .collect())
}
