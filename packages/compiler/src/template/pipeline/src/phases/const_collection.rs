//! Converts the extracted attributes of element-like ops into constant attribute arrays and lifts
//! them into the component's consts. Host bindings collect theirs into the host unit instead.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::core::{parse_selector_to_r3_selector, AttributeMarker, R3SelectorPart};
use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::ops::ExtractedAttributeOp;
use crate::template::pipeline::ir::{BindingKind, ConstIndex, CreateOp, XrefId};
use crate::template::pipeline::src::compilation::{
    CompilationJob, ComponentCompilationJob, HostBindingCompilationJob,
};

pub fn collect_element_consts(job: &mut dyn CompilationJob) -> Result<()> {
    let compat = job.base().is_compat();
    let mut all_attributes: IndexMap<XrefId, ElementAttributes> = IndexMap::new();
    for unit in job.units_mut() {
        let create = unit.create_mut();
        for id in create.ids() {
            if !matches!(create.get(id)?, CreateOp::ExtractedAttribute(_)) {
                continue;
            }
            if let CreateOp::ExtractedAttribute(attribute) = create.remove(id)? {
                all_attributes
                    .entry(attribute.target)
                    .or_insert_with(|| ElementAttributes::new(compat))
                    .add(attribute)?;
            }
        }
    }

    if let Some(component) = job.as_component_mut() {
        return collect_component_consts(component, &all_attributes);
    }
    if let Some(host) = job.as_host_mut() {
        return collect_host_attributes(host, &all_attributes);
    }
    Ok(())
}

fn collect_component_consts(
    job: &mut ComponentCompilationJob,
    all_attributes: &IndexMap<XrefId, ElementAttributes>,
) -> Result<()> {
    // Consts are added in op order, before any op is updated.
    let mut targets = Vec::new();
    for unit in job.views.values() {
        for op in unit.create.iter() {
            if let Some(base) = op.element_base() {
                targets.push(base.xref);
            }
            if let CreateOp::RepeaterCreate(repeater) = op {
                targets.extend(repeater.empty_view);
            }
        }
    }
    let mut indices: HashMap<XrefId, ConstIndex> = HashMap::new();
    for xref in targets {
        let Some(attributes) = all_attributes.get(&xref) else {
            continue;
        };
        let array = attributes.serialize()?;
        if !array.is_empty() {
            indices.insert(xref, job.add_const(o::literal_arr(array), vec![]));
        }
    }

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            if let CreateOp::Projection(projection) = op {
                if let Some(attributes) = all_attributes.get(&projection.xref) {
                    let array = attributes.serialize()?;
                    if !array.is_empty() {
                        projection.attributes = Some(o::literal_arr(array));
                    }
                }
                continue;
            }
            if let CreateOp::RepeaterCreate(repeater) = op {
                // The `@empty` view needs a second attribute array.
                if let Some(empty) = repeater.empty_view {
                    repeater.empty_attributes = indices.get(&empty).copied();
                }
            }
            if let Some(base) = op.element_base_mut() {
                base.attributes = indices.get(&base.xref).copied();
            }
        }
    }
    Ok(())
}

fn collect_host_attributes(
    job: &mut HostBindingCompilationJob,
    all_attributes: &IndexMap<XrefId, ElementAttributes>,
) -> Result<()> {
    for (xref, attributes) in all_attributes {
        if *xref != job.root.xref {
            return Err(PipelineError::assertion(
                "an attribute would be const collected into the host binding function, but is \
                 not associated with the root xref",
            ));
        }
        let array = attributes.serialize()?;
        if !array.is_empty() {
            job.root.attributes = Some(o::literal_arr(array));
        }
    }
    Ok(())
}

fn marker(marker: AttributeMarker) -> Expression {
    o::literal(f64::from(marker as u8))
}

/// All of the attributes applied on one element, grouped by kind.
#[derive(Debug, Default)]
struct ElementAttributes {
    compat: bool,
    known: HashSet<(BindingKind, String)>,
    attributes: Vec<Expression>,
    classes: Vec<Expression>,
    styles: Vec<Expression>,
    bindings: Vec<Expression>,
    template: Vec<Expression>,
    i18n: Vec<Expression>,
    project_as: Option<String>,
}

impl ElementAttributes {
    fn new(compat: bool) -> Self {
        ElementAttributes {
            compat,
            ..Default::default()
        }
    }

    /// Returns true the first time a name is seen for a kind.
    fn mark_known(&mut self, kind: BindingKind, name: &str) -> bool {
        self.known.insert((kind, name.to_string()))
    }

    fn array_for(&mut self, kind: BindingKind) -> Option<&mut Vec<Expression>> {
        match kind {
            BindingKind::Property | BindingKind::TwoWayProperty => Some(&mut self.bindings),
            BindingKind::Attribute => Some(&mut self.attributes),
            BindingKind::ClassName => Some(&mut self.classes),
            BindingKind::StyleProperty => Some(&mut self.styles),
            BindingKind::Template => Some(&mut self.template),
            BindingKind::I18n => Some(&mut self.i18n),
            BindingKind::LegacyAnimation | BindingKind::Animation => None,
        }
    }

    fn add(&mut self, attribute: ExtractedAttributeOp) -> Result<()> {
        let kind = attribute.binding_kind;
        // In compatibility mode duplicate attribute, class and style values all land in the
        // consts array.
        let allow_duplicates = self.compat
            && matches!(
                kind,
                BindingKind::Attribute | BindingKind::ClassName | BindingKind::StyleProperty
            );
        if !allow_duplicates && !self.mark_known(kind, &attribute.name) {
            return Ok(());
        }

        if attribute.name == "ngProjectAs" {
            let selector = attribute
                .expression
                .as_ref()
                .and_then(Expression::as_string_literal)
                .ok_or_else(|| {
                    PipelineError::unsupported("ngProjectAs must have a string literal value")
                })?;
            self.project_as = Some(selector.to_string());
        }

        let needs_value = matches!(kind, BindingKind::Attribute | BindingKind::StyleProperty);
        let value = if needs_value {
            let value = attribute.expression.ok_or_else(|| {
                PipelineError::assertion("attribute and style element attributes must have a value")
            })?;
            Some(match attribute.trusted_value_fn {
                Some(trusted) => {
                    let literal = value.as_string_literal().ok_or_else(|| {
                        PipelineError::assertion("extracted attribute value should be string literal")
                    })?;
                    trusted.call_fn(vec![o::literal(literal)])
                }
                None => value,
            })
        } else {
            None
        };

        let Some(array) = self.array_for(kind) else {
            return Ok(());
        };
        match attribute.namespace {
            Some(namespace) if !namespace.is_empty() => {
                array.push(marker(AttributeMarker::NamespaceURI));
                array.push(o::literal(namespace));
                array.push(o::literal(attribute.name));
            }
            _ => array.push(o::literal(attribute.name)),
        }
        array.extend(value);
        Ok(())
    }

    /// The flat runtime attribute array: plain attributes first, then each marker section.
    fn serialize(&self) -> Result<Vec<Expression>> {
        let mut array = self.attributes.clone();
        if let Some(project_as) = &self.project_as {
            // Only the first selector is supported in `ngProjectAs`.
            if let Some(selector) = parse_selector_to_r3_selector(project_as).into_iter().next() {
                array.push(marker(AttributeMarker::ProjectAs));
                array.push(o::literal_arr(
                    selector
                        .into_iter()
                        .map(|part| match part {
                            R3SelectorPart::Str(s) => o::literal(s),
                            R3SelectorPart::Flag(flag) => o::literal(f64::from(flag)),
                        })
                        .collect(),
                ));
            }
        }
        for (section, values) in [
            (AttributeMarker::Classes, &self.classes),
            (AttributeMarker::Styles, &self.styles),
            (AttributeMarker::Bindings, &self.bindings),
            (AttributeMarker::Template, &self.template),
            (AttributeMarker::I18n, &self.i18n),
        ] {
            if !values.is_empty() {
                array.push(marker(section));
                array.extend(values.iter().cloned());
            }
        }
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::core::SecurityContext;
    use crate::template::pipeline::ir::ops::{
        create_element_end_op, create_element_start_op, create_extracted_attribute_op,
    };
    use crate::template::pipeline::ir::Namespace;

    fn extracted(target: XrefId, kind: BindingKind, name: &str, value: Option<&str>) -> CreateOp {
        CreateOp::ExtractedAttribute(create_extracted_attribute_op(
            target,
            kind,
            None,
            name,
            value.map(o::literal),
            vec![SecurityContext::NONE],
        ))
    }

    #[test]
    fn test_attributes_serialize_with_markers() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let div = job.base.allocate_xref_id();
        let root = job.root;
        let unit = &mut job.views[&root];
        unit.create
            .push(create_element_start_op("div", div, Namespace::HTML, None));
        unit.create.push(extracted(div, BindingKind::Attribute, "id", Some("main")));
        unit.create.push(extracted(div, BindingKind::ClassName, "a", None));
        unit.create.push(extracted(div, BindingKind::Property, "title", None));
        unit.create.push(extracted(div, BindingKind::Property, "title", None));
        unit.create.push(create_element_end_op(div));

        collect_element_consts(&mut job).unwrap();

        let expected = o::literal_arr(vec![
            o::literal("id"),
            o::literal("main"),
            marker(AttributeMarker::Classes),
            o::literal("a"),
            marker(AttributeMarker::Bindings),
            o::literal("title"),
        ]);
        assert_eq!(job.consts.len(), 1);
        assert!(job.consts[0].is_equivalent(&expected));
        let unit = &job.views[&root];
        assert_eq!(unit.create.len(), 2);
        assert_eq!(
            unit.create.iter().next().and_then(|op| op.element_base()).and_then(|b| b.attributes),
            Some(ConstIndex(0))
        );
    }

    #[test]
    fn test_compat_mode_keeps_duplicate_attributes() {
        let mut attributes = ElementAttributes::new(true);
        for _ in 0..2 {
            attributes
                .add(create_extracted_attribute_op(
                    XrefId(1),
                    BindingKind::Attribute,
                    None,
                    "id",
                    Some(o::literal("x")),
                    vec![],
                ))
                .unwrap();
        }
        assert_eq!(attributes.serialize().unwrap().len(), 4);
    }

    #[test]
    fn test_host_attributes_land_on_the_host_unit() {
        let mut job =
            HostBindingCompilationJob::new("Host", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root.xref;
        job.root.create.push(CreateOp::ExtractedAttribute(create_extracted_attribute_op(
            root,
            BindingKind::StyleProperty,
            None,
            "color",
            Some(o::literal("red")),
            vec![],
        )));

        collect_element_consts(&mut job).unwrap();

        let expected = o::literal_arr(vec![
            marker(AttributeMarker::Styles),
            o::literal("color"),
            o::literal("red"),
        ]);
        assert!(job.root.attributes.as_ref().is_some_and(|a| a.is_equivalent(&expected)));
    }
}
