//! Resolve the i18n expression placeholders in i18n messages: each i18n expression is recorded in
//! its context's params under its placeholder, valued with its expression index.

use std::collections::{HashMap, HashSet};

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::{I18nExpressionOp, I18nParamValue, I18nValue};
use crate::template::pipeline::ir::{
    CreateOp, I18nExpressionFor, I18nParamResolutionTime, I18nParamValueFlags, UpdateOp, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

struct Resolved {
    context: XrefId,
    placeholder: String,
    resolution_time: I18nParamResolutionTime,
    value: I18nParamValue,
}

pub fn resolve_i18n_expression_placeholders(job: &mut ComponentCompilationJob) -> Result<()> {
    let mut sub_template_indices: HashMap<XrefId, Option<usize>> = HashMap::new();
    let mut contexts: HashSet<XrefId> = HashSet::new();
    for unit in job.views.values() {
        for op in unit.create.iter() {
            match op {
                CreateOp::I18nStart(start) => {
                    sub_template_indices.insert(start.xref, start.sub_template_index);
                }
                CreateOp::I18nContext(context) => {
                    contexts.insert(context.xref);
                }
                _ => {}
            }
        }
    }

    // Next available expression index per i18n block (text) or per context (attributes). Child
    // blocks in templates share the parent's message but may target another slot.
    let mut expression_indices: HashMap<XrefId, usize> = HashMap::new();
    let mut resolved = Vec::new();
    for unit in job.views.values() {
        for op in unit.update.iter() {
            let UpdateOp::I18nExpression(expr) = op else {
                continue;
            };
            let index = expression_indices.entry(reference_index(expr)).or_insert(0);
            let value = I18nParamValue {
                value: I18nValue::Slot(*index),
                sub_template_index: sub_template_indices.get(&expr.i18n_owner).copied().flatten(),
                flags: I18nParamValueFlags::EXPRESSION_INDEX,
            };
            *index += 1;

            let Some(placeholder) = &expr.i18n_placeholder else {
                continue;
            };
            if !contexts.contains(&expr.context) {
                return Err(PipelineError::MissingI18nContext(expr.context));
            }
            resolved.push(Resolved {
                context: expr.context,
                placeholder: placeholder.clone(),
                resolution_time: expr.resolution_time,
                value,
            });
        }
    }

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::I18nContext(context) = op else {
                continue;
            };
            for entry in resolved.iter().filter(|r| r.context == context.xref) {
                let params = match entry.resolution_time {
                    I18nParamResolutionTime::Creation => &mut context.params,
                    I18nParamResolutionTime::Postprocessing => &mut context.postprocessing_params,
                };
                params
                    .entry(entry.placeholder.clone())
                    .or_default()
                    .push(entry.value.clone());
            }
        }
    }
    Ok(())
}

fn reference_index(expr: &I18nExpressionOp) -> XrefId {
    match expr.usage {
        I18nExpressionFor::I18nText => expr.i18n_owner,
        I18nExpressionFor::I18nAttribute => expr.context,
    }
}
