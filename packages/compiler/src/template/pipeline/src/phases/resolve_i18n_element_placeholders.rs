//! Resolve the element placeholders in i18n messages: record the slot of every element, projection
//! and template acting as a placeholder in the params of its i18n context.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::{PipelineError, Result};
use crate::i18n::i18n_ast::{I18nPlaceholder, TagPlaceholder};
use crate::template::pipeline::ir::ops::{I18nParamValue, I18nValue};
use crate::template::pipeline::ir::{CreateOp, I18nParamValueFlags, TemplateKind, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn resolve_i18n_element_placeholders(job: &mut ComponentCompilationJob) -> Result<()> {
    let mut recorder = Recorder::new(job);
    recorder.resolve_view(job.root, None)?;
    let mut records = recorder.records;

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            let CreateOp::I18nContext(context) = op else {
                continue;
            };
            for (placeholder, value) in records.shift_remove(&context.xref).unwrap_or_default() {
                context.params.entry(placeholder).or_default().push(value);
            }
        }
    }
    Ok(())
}

/// The i18n block enclosing the op being visited.
#[derive(Clone, Copy)]
struct CurrentBlock {
    context: XrefId,
    sub_template_index: Option<usize>,
}

fn require_block(block: Option<CurrentBlock>) -> Result<CurrentBlock> {
    block.ok_or_else(|| {
        PipelineError::assertion("i18n tag placeholder should only occur inside an i18n block")
    })
}

/// Walks the views read-only and collects param values per context, so contexts living in other
/// views can be updated afterwards.
struct Recorder<'a> {
    job: &'a ComponentCompilationJob,
    contexts: HashSet<XrefId>,
    /// Slot and placeholder of every element start carrying a tag placeholder.
    elements: HashMap<XrefId, (usize, TagPlaceholder)>,
    records: IndexMap<XrefId, Vec<(String, I18nParamValue)>>,
}

impl<'a> Recorder<'a> {
    fn new(job: &'a ComponentCompilationJob) -> Self {
        let mut contexts = HashSet::new();
        let mut elements = HashMap::new();
        for unit in job.views.values() {
            for op in unit.create.iter() {
                match op {
                    CreateOp::I18nContext(context) => {
                        contexts.insert(context.xref);
                    }
                    CreateOp::ElementStart(element) => {
                        if let (Some(placeholder), Some(slot)) =
                            (&element.i18n_placeholder, element.base.handle.slot())
                        {
                            elements.insert(element.base.xref, (slot, placeholder.clone()));
                        }
                    }
                    _ => {}
                }
            }
        }
        Recorder {
            job,
            contexts,
            elements,
            records: IndexMap::new(),
        }
    }

    fn add_param(
        &mut self,
        block: CurrentBlock,
        placeholder: &str,
        value: I18nValue,
        sub_template_index: Option<usize>,
        flags: I18nParamValueFlags,
    ) {
        self.records.entry(block.context).or_default().push((
            placeholder.to_string(),
            I18nParamValue {
                value,
                sub_template_index,
                flags,
            },
        ));
    }

    /// Element and template placeholders of one view. `structural` is the slot of a structural
    /// directive template whose placeholder is shared with the next element or template.
    fn resolve_view(&mut self, view: XrefId, mut structural: Option<usize>) -> Result<()> {
        let job = self.job;
        let unit = job.view(view)?;
        let mut current: Option<CurrentBlock> = None;
        let mut structural_closes: HashMap<XrefId, usize> = HashMap::new();

        for op in unit.create.iter() {
            match op {
                CreateOp::I18nStart(start) => {
                    let context = start.context.ok_or_else(|| {
                        PipelineError::assertion("could not find i18n context for i18n op")
                    })?;
                    if !self.contexts.contains(&context) {
                        return Err(PipelineError::MissingI18nContext(context));
                    }
                    current = Some(CurrentBlock {
                        context,
                        sub_template_index: start.sub_template_index,
                    });
                }
                CreateOp::I18nEnd(_) => current = None,
                CreateOp::ElementStart(element) => {
                    let Some(placeholder) = &element.i18n_placeholder else {
                        continue;
                    };
                    let block = require_block(current)?;
                    let slot = element.base.handle.get()?;
                    self.record_element_start(block, slot, placeholder, structural);
                    // A separate close tag closes the structural directive as well.
                    if let Some(template) = structural {
                        if !placeholder.close_name.is_empty() {
                            structural_closes.insert(element.base.xref, template);
                        }
                    }
                    structural = None;
                }
                CreateOp::ElementEnd(end) => {
                    let Some((slot, placeholder)) = self.elements.get(&end.xref).cloned() else {
                        continue;
                    };
                    let block = require_block(current)?;
                    let template = structural_closes.remove(&end.xref);
                    self.record_element_close(block, slot, &placeholder, template);
                }
                CreateOp::Projection(projection) => {
                    if let Some(placeholder) = &projection.i18n_placeholder {
                        let block = require_block(current)?;
                        let slot = projection.handle.get()?;
                        self.record_element_start(block, slot, placeholder, structural);
                        self.record_element_close(block, slot, placeholder, structural);
                        structural = None;
                    }
                    if let Some(fallback) = projection.fallback_view {
                        match &projection.fallback_i18n_placeholder {
                            None => self.resolve_view(fallback, None)?,
                            Some(placeholder) => {
                                let block = require_block(current)?;
                                let slot = projection.handle.get()?;
                                self.record_template(fallback, slot, placeholder, block, structural)?;
                                structural = None;
                            }
                        }
                    }
                }
                CreateOp::Template(template)
                | CreateOp::ConditionalCreate(template)
                | CreateOp::ConditionalBranchCreate(template) => {
                    let child = template.base.xref;
                    let Some(placeholder) = &template.i18n_placeholder else {
                        // The view may still contain i18n blocks of its own.
                        self.resolve_view(child, None)?;
                        continue;
                    };
                    let block = require_block(current)?;
                    let slot = template.base.handle.get()?;
                    if template.template_kind == TemplateKind::Structural {
                        // Recorded together with the element or template it belongs to, so both
                        // share one combined value.
                        self.resolve_view(child, Some(slot))?;
                    } else {
                        self.record_template(child, slot, placeholder, block, structural)?;
                        structural = None;
                    }
                }
                CreateOp::RepeaterCreate(repeater) => {
                    if structural.is_some() {
                        return Err(PipelineError::assertion(
                            "unexpected structural directive associated with @for block",
                        ));
                    }
                    // The repeater uses its own slot, then the @for template, then @empty.
                    let slot = repeater.base.handle.get()?;
                    self.resolve_optional_template(
                        repeater.base.xref,
                        slot + 1,
                        repeater.i18n_placeholder.as_ref(),
                        current,
                    )?;
                    if let Some(empty) = repeater.empty_view {
                        self.resolve_optional_template(
                            empty,
                            slot + 2,
                            repeater.empty_i18n_placeholder.as_ref(),
                            current,
                        )?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn resolve_optional_template(
        &mut self,
        view: XrefId,
        slot: usize,
        placeholder: Option<&I18nPlaceholder>,
        current: Option<CurrentBlock>,
    ) -> Result<()> {
        match placeholder {
            None => self.resolve_view(view, None),
            Some(placeholder) => {
                let block = require_block(current)?;
                self.record_template(view, slot, placeholder, block, None)
            }
        }
    }

    fn record_element_start(
        &mut self,
        block: CurrentBlock,
        slot: usize,
        placeholder: &TagPlaceholder,
        structural: Option<usize>,
    ) {
        let mut flags = I18nParamValueFlags::ELEMENT_TAG | I18nParamValueFlags::OPEN_TAG;
        let mut value = I18nValue::Slot(slot);
        if let Some(template) = structural {
            flags |= I18nParamValueFlags::TEMPLATE_TAG;
            value = I18nValue::Compound {
                element: slot,
                template,
            };
        }
        // Self-closing tags have no close placeholder; the start accounts for both.
        if placeholder.close_name.is_empty() {
            flags |= I18nParamValueFlags::CLOSE_TAG;
        }
        self.add_param(block, &placeholder.start_name, value, block.sub_template_index, flags);
    }

    fn record_element_close(
        &mut self,
        block: CurrentBlock,
        slot: usize,
        placeholder: &TagPlaceholder,
        structural: Option<usize>,
    ) {
        if placeholder.close_name.is_empty() {
            return;
        }
        let mut flags = I18nParamValueFlags::ELEMENT_TAG | I18nParamValueFlags::CLOSE_TAG;
        let mut value = I18nValue::Slot(slot);
        if let Some(template) = structural {
            flags |= I18nParamValueFlags::TEMPLATE_TAG;
            value = I18nValue::Compound {
                element: slot,
                template,
            };
        }
        self.add_param(block, &placeholder.close_name, value, block.sub_template_index, flags);
    }

    /// Records the start of a template, its view's own placeholders, then its close.
    fn record_template(
        &mut self,
        view: XrefId,
        slot: usize,
        placeholder: &I18nPlaceholder,
        block: CurrentBlock,
        structural: Option<usize>,
    ) -> Result<()> {
        let start_name = placeholder.start_name();
        let close_name = placeholder.close_name();
        let view_index = self.sub_template_index_for_template_tag(view, block)?;

        let mut flags = I18nParamValueFlags::TEMPLATE_TAG | I18nParamValueFlags::OPEN_TAG;
        if close_name.is_empty() {
            flags |= I18nParamValueFlags::CLOSE_TAG;
        }
        // The structural directive's start comes first. This template lives in the directive's
        // view, so the current block's index applies.
        if let Some(template) = structural {
            self.add_param(block, start_name, I18nValue::Slot(template), block.sub_template_index, flags);
        }
        self.add_param(block, start_name, I18nValue::Slot(slot), view_index, flags);

        self.resolve_view(view, None)?;

        if !close_name.is_empty() {
            let flags = I18nParamValueFlags::TEMPLATE_TAG | I18nParamValueFlags::CLOSE_TAG;
            self.add_param(block, close_name, I18nValue::Slot(slot), view_index, flags);
            if let Some(template) = structural {
                self.add_param(
                    block,
                    close_name,
                    I18nValue::Slot(template),
                    block.sub_template_index,
                    flags,
                );
            }
        }
        Ok(())
    }

    /// A template tag uses the sub-template index of the i18n block inside its view, if any.
    fn sub_template_index_for_template_tag(
        &self,
        view: XrefId,
        block: CurrentBlock,
    ) -> Result<Option<usize>> {
        let inner = self.job.view(view)?.create.iter().find_map(|op| match op {
            CreateOp::I18nStart(start) => Some(start.sub_template_index),
            _ => None,
        });
        Ok(inner.unwrap_or(block.sub_template_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::i18n::i18n_ast::{BlockPlaceholder, Message};
    use crate::template::pipeline::ir::ops::{
        create_element_end_op, create_element_start_op, create_i18n_context_op,
        create_i18n_end_op, create_i18n_start_op, create_template_op,
    };
    use crate::template::pipeline::ir::{I18nContextKind, Namespace};

    fn block_with_context(job: &mut ComponentCompilationJob) -> (XrefId, XrefId) {
        let block = job.base.allocate_xref_id();
        let context = job.base.allocate_xref_id();
        let root = job.root;
        let message = Message::new("m", "m");
        let mut start = create_i18n_start_op(block, message.clone(), None);
        if let CreateOp::I18nStart(op) = &mut start {
            op.context = Some(context);
            op.handle.assign(0).unwrap();
        }
        let unit = &mut job.views[&root];
        unit.create.push(start);
        unit.create.push(create_i18n_context_op(
            I18nContextKind::RootI18n,
            context,
            Some(block),
            message,
        ));
        (block, context)
    }

    fn params(job: &ComponentCompilationJob) -> IndexMap<String, Vec<I18nParamValue>> {
        job.views[&job.root]
            .create
            .iter()
            .find_map(|op| match op {
                CreateOp::I18nContext(context) => Some(context.params.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_element_placeholders_record_open_and_close() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let (block, _) = block_with_context(&mut job);
        let span = job.base.allocate_xref_id();
        let root = job.root;
        let placeholder = TagPlaceholder {
            tag: "span".into(),
            start_name: "START_TAG_SPAN".into(),
            close_name: "CLOSE_TAG_SPAN".into(),
            is_void: false,
        };
        let mut element = create_element_start_op("span", span, Namespace::HTML, Some(placeholder));
        if let Some(base) = element.element_base_mut() {
            base.handle.assign(1).unwrap();
        }
        let unit = &mut job.views[&root];
        unit.create.push(element);
        unit.create.push(create_element_end_op(span));
        unit.create.push(create_i18n_end_op(block));

        resolve_i18n_element_placeholders(&mut job).unwrap();

        let params = params(&job);
        let start = &params["START_TAG_SPAN"][0];
        assert_eq!(start.value, I18nValue::Slot(1));
        assert_eq!(
            start.flags,
            I18nParamValueFlags::ELEMENT_TAG | I18nParamValueFlags::OPEN_TAG
        );
        assert_eq!(
            params["CLOSE_TAG_SPAN"][0].flags,
            I18nParamValueFlags::ELEMENT_TAG | I18nParamValueFlags::CLOSE_TAG
        );
    }

    #[test]
    fn test_block_template_records_start_and_close() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let (block, _) = block_with_context(&mut job);
        let root = job.root;
        let child = job.allocate_view(root).unwrap();
        let placeholder = I18nPlaceholder::Block(BlockPlaceholder {
            name: "if".into(),
            start_name: "START_BLOCK_IF".into(),
            close_name: "CLOSE_BLOCK_IF".into(),
        });
        let mut template = create_template_op(
            child,
            TemplateKind::Block,
            None,
            "Conditional",
            Namespace::HTML,
            Some(placeholder),
        );
        if let Some(base) = template.element_base_mut() {
            base.handle.assign(1).unwrap();
        }
        let unit = &mut job.views[&root];
        unit.create.push(template);
        unit.create.push(create_i18n_end_op(block));

        resolve_i18n_element_placeholders(&mut job).unwrap();

        let params = params(&job);
        assert_eq!(params["START_BLOCK_IF"][0].value, I18nValue::Slot(1));
        assert_eq!(
            params["CLOSE_BLOCK_IF"][0].flags,
            I18nParamValueFlags::TEMPLATE_TAG | I18nParamValueFlags::CLOSE_TAG
        );
    }
}
