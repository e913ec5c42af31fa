//! Creates an i18n message op for each i18n context, formatting the context's param values into
//! the literal strings used by the final output. ICU sub-messages are linked to their root
//! message, and the ICU start and end ops are removed.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::ops::{
    I18nContextOp, I18nMessageOp, I18nParamValue, I18nValue,
};
use crate::template::pipeline::ir::{
    CreateOp, I18nContextKind, I18nParamValueFlags, XrefId,
};
use crate::template::pipeline::src::compilation::{ComponentCompilationJob, JobBase};

/// Delimits a serialized param value.
const ESCAPE: char = '\u{FFFD}';
const ELEMENT_MARKER: &str = "#";
const TEMPLATE_MARKER: &str = "*";
const TAG_CLOSE_MARKER: &str = "/";
/// Precedes the sub-template index.
const CONTEXT_MARKER: &str = ":";
const LIST_START_MARKER: &str = "[";
const LIST_END_MARKER: &str = "]";
const LIST_DELIMITER: &str = "|";

pub fn extract_i18n_messages(job: &mut ComponentCompilationJob) -> Result<()> {
    let ComponentCompilationJob { base, views, .. } = job;

    // Context xref to the xref of its message.
    let mut messages_by_context: HashMap<XrefId, XrefId> = HashMap::new();
    // Block xref to its root block and context.
    let mut blocks: HashMap<XrefId, (XrefId, Option<XrefId>)> = HashMap::new();
    // Context xref to its kind and block.
    let mut contexts: HashMap<XrefId, (I18nContextKind, Option<XrefId>)> = HashMap::new();

    for unit in views.values_mut() {
        let mut messages = Vec::new();
        for op in unit.create.iter() {
            match op {
                CreateOp::I18nContext(context) => {
                    let message = create_i18n_message(base, context)?;
                    messages_by_context.insert(context.xref, message.xref);
                    contexts.insert(context.xref, (context.context_kind, context.i18n_block));
                    messages.push(CreateOp::I18nMessage(message));
                }
                CreateOp::I18nStart(start) => {
                    blocks.insert(start.xref, (start.root, start.context));
                }
                _ => {}
            }
        }
        unit.create.push_all(messages);
    }

    // Sub-message placeholders keyed by message xref, and root message to sub-message links.
    let mut sub_message_placeholders: HashMap<XrefId, String> = HashMap::new();
    let mut sub_messages: IndexMap<XrefId, Vec<XrefId>> = IndexMap::new();

    for unit in views.values_mut() {
        for id in unit.create.ids() {
            match unit.create.get(id)? {
                CreateOp::IcuStart(icu) => {
                    if let Some((sub_message, root_message)) = link_sub_message(
                        icu.context,
                        &contexts,
                        &blocks,
                        &messages_by_context,
                    )? {
                        sub_message_placeholders
                            .insert(sub_message, icu.message_placeholder.clone());
                        sub_messages.entry(root_message).or_default().push(sub_message);
                    }
                }
                CreateOp::IcuEnd(_) => {}
                _ => continue,
            }
            unit.create.remove(id)?;
        }
    }

    for unit in views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::I18nMessage(message) = op else {
                continue;
            };
            if let Some(placeholder) = sub_message_placeholders.remove(&message.xref) {
                message.message_placeholder = Some(placeholder);
            }
            if let Some(subs) = sub_messages.shift_remove(&message.xref) {
                message.sub_messages.extend(subs);
            }
        }
    }
    Ok(())
}

/// For an ICU with its own context nested in an i18n block, returns its message and the message of
/// the root block it belongs to. ICUs sharing their block's context are root-level, not
/// sub-messages.
fn link_sub_message(
    icu_context: Option<XrefId>,
    contexts: &HashMap<XrefId, (I18nContextKind, Option<XrefId>)>,
    blocks: &HashMap<XrefId, (XrefId, Option<XrefId>)>,
    messages_by_context: &HashMap<XrefId, XrefId>,
) -> Result<Option<(XrefId, XrefId)>> {
    let Some(icu_context) = icu_context else {
        return Ok(None);
    };
    let Some((I18nContextKind::Icu, Some(block))) = contexts.get(&icu_context) else {
        return Ok(None);
    };
    let Some((root, block_context)) = blocks.get(block) else {
        return Ok(None);
    };
    if *block_context == Some(icu_context) {
        return Ok(None);
    }
    let root_message = blocks
        .get(root)
        .and_then(|(_, context)| *context)
        .and_then(|context| messages_by_context.get(&context))
        .ok_or_else(|| {
            PipelineError::assertion("ICU sub-message should belong to a root message")
        })?;
    Ok(messages_by_context
        .get(&icu_context)
        .map(|sub_message| (*sub_message, *root_message)))
}

fn create_i18n_message(base: &mut JobBase, context: &I18nContextOp) -> Result<I18nMessageOp> {
    let params = format_params(&context.params)?;
    let postprocessing_params = format_params(&context.postprocessing_params)?;
    // A placeholder with several values has to be picked apart at runtime.
    let needs_postprocessing = context.params.values().any(|values| values.len() > 1);
    Ok(I18nMessageOp {
        xref: base.allocate_xref_id(),
        i18n_context: context.xref,
        i18n_block: context.i18n_block,
        message: context.message.clone(),
        message_placeholder: None,
        params,
        postprocessing_params,
        needs_postprocessing,
        sub_messages: Vec::new(),
    })
}

fn format_params(
    params: &IndexMap<String, Vec<I18nParamValue>>,
) -> Result<IndexMap<String, Expression>> {
    let mut formatted = IndexMap::new();
    for (placeholder, values) in params {
        if let Some(serialized) = format_param_values(values)? {
            formatted.insert(placeholder.clone(), o::literal(serialized));
        }
    }
    Ok(formatted)
}

fn format_param_values(values: &[I18nParamValue]) -> Result<Option<String>> {
    let serialized = values.iter().map(format_value).collect::<Result<Vec<_>>>()?;
    Ok(match serialized.len() {
        0 => None,
        1 => serialized.into_iter().next(),
        _ => Some(format!(
            "{LIST_START_MARKER}{}{LIST_END_MARKER}",
            serialized.join(LIST_DELIMITER)
        )),
    })
}

fn with_flags(value: &I18nParamValue, inner: I18nValue, flags: I18nParamValueFlags) -> I18nParamValue {
    I18nParamValue {
        value: inner,
        sub_template_index: value.sub_template_index,
        flags,
    }
}

fn format_value(value: &I18nParamValue) -> Result<String> {
    let flags = value.flags;

    // An element with a structural directive concatenates the element and template values.
    if flags.contains(I18nParamValueFlags::ELEMENT_TAG | I18nParamValueFlags::TEMPLATE_TAG) {
        let I18nValue::Compound { element, template } = value.value else {
            return Err(PipelineError::assertion(
                "expected i18n param value to have an element and template slot",
            ));
        };
        let element_value = format_value(&with_flags(
            value,
            I18nValue::Slot(element),
            flags - I18nParamValueFlags::TEMPLATE_TAG,
        ))?;
        let template_value = format_value(&with_flags(
            value,
            I18nValue::Slot(template),
            flags - I18nParamValueFlags::ELEMENT_TAG,
        ))?;
        // A self-closing element records the template value on both sides.
        if flags.contains(I18nParamValueFlags::OPEN_TAG | I18nParamValueFlags::CLOSE_TAG) {
            return Ok(format!("{template_value}{element_value}{template_value}"));
        }
        return Ok(if flags.contains(I18nParamValueFlags::CLOSE_TAG) {
            format!("{element_value}{template_value}")
        } else {
            format!("{template_value}{element_value}")
        });
    }

    // Self-closing tags concatenate the start and close values.
    if flags.contains(I18nParamValueFlags::OPEN_TAG | I18nParamValueFlags::CLOSE_TAG) {
        let open = format_value(&with_flags(
            value,
            value.value.clone(),
            flags - I18nParamValueFlags::CLOSE_TAG,
        ))?;
        let close = format_value(&with_flags(
            value,
            value.value.clone(),
            flags - I18nParamValueFlags::OPEN_TAG,
        ))?;
        return Ok(open + &close);
    }

    let raw = match &value.value {
        I18nValue::Slot(slot) => slot.to_string(),
        I18nValue::String(string) => string.clone(),
        I18nValue::Compound { .. } => {
            return Err(PipelineError::assertion(
                "compound i18n param value without element and template flags",
            ))
        }
    };
    if flags.is_empty() {
        return Ok(raw);
    }

    let tag_marker = if flags.contains(I18nParamValueFlags::ELEMENT_TAG) {
        ELEMENT_MARKER
    } else if flags.contains(I18nParamValueFlags::TEMPLATE_TAG) {
        TEMPLATE_MARKER
    } else {
        ""
    };
    let close_marker = if !tag_marker.is_empty() && flags.contains(I18nParamValueFlags::CLOSE_TAG) {
        TAG_CLOSE_MARKER
    } else {
        ""
    };
    let context = value
        .sub_template_index
        .map(|index| format!("{CONTEXT_MARKER}{index}"))
        .unwrap_or_default();
    Ok(format!("{ESCAPE}{close_marker}{tag_marker}{raw}{context}{ESCAPE}"))
}
