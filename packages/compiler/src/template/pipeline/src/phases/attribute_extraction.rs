//! Attribute Extraction
//!
//! Find all extractable attribute and binding ops, and create `ExtractedAttributeOp`s for them.
//! In cases where no instruction needs to be generated for the attribute or binding, it is
//! removed.

use indexmap::IndexMap;

use crate::core::SecurityContext;
use crate::error::Result;
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::ops::{
    create_extracted_attribute_op, AttributeOp, BindingExpression, ExtractedAttributeOp,
};
use crate::template::pipeline::ir::{BindingKind, CreateOp, OpId, OpList, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::{CompilationJob, CompilationJobKind};
use crate::template::pipeline::src::util::elements::{create_op_xref_map, lookup_element};

pub fn extract_attributes(job: &mut dyn CompilationJob) -> Result<()> {
    let is_host = job.kind() == CompilationJobKind::Host;
    let (base, units) = job.parts_mut();
    let compat = base.is_compat();

    for unit in units {
        let elements = create_op_xref_map(unit.create());
        let (create, update) = unit.lists_mut();
        let mut extracted = Vec::new();

        for op in create.iter() {
            match op {
                CreateOp::Listener(listener) if listener.animation_kind.is_none() => {
                    // TemplateDefinitionBuilder does not extract listener bindings to the const
                    // array.
                    if is_host && compat {
                        continue;
                    }
                    extracted.push(name_only(
                        listener.target,
                        BindingKind::Property,
                        &listener.name,
                        vec![SecurityContext::NONE],
                    ));
                }
                // Two-way listeners aren't supported in host bindings.
                CreateOp::TwoWayListener(listener) if !is_host => {
                    extracted.push(name_only(
                        listener.target,
                        BindingKind::Property,
                        &listener.name,
                        vec![SecurityContext::NONE],
                    ));
                }
                _ => {}
            }
        }

        let mut cursor = update.first();
        while let Some(id) = cursor {
            cursor = update.next(id);
            match update.get(id)? {
                UpdateOp::Attribute(attr) => {
                    if let Some(attribute) = extract_attribute(attr, compat) {
                        extracted.push(attribute);
                        update.remove(id)?;
                    }
                }
                UpdateOp::Property(prop) => {
                    if matches!(
                        prop.binding_kind,
                        BindingKind::LegacyAnimation | BindingKind::Animation
                    ) {
                        continue;
                    }
                    let binding_kind = if prop.i18n_message.is_some() && prop.template_kind.is_none()
                    {
                        // An i18n attribute on a plain element is extracted as an i18n attribute.
                        BindingKind::I18n
                    } else if prop.is_structural_template_attribute {
                        BindingKind::Template
                    } else {
                        BindingKind::Property
                    };
                    extracted.push(name_only(
                        prop.target,
                        binding_kind,
                        &prop.name,
                        prop.security_context.clone(),
                    ));
                }
                UpdateOp::Control(control) => {
                    extracted.push(name_only(
                        control.target,
                        BindingKind::Property,
                        "field",
                        control.security_context.clone(),
                    ));
                }
                UpdateOp::TwoWayProperty(prop) => {
                    extracted.push(name_only(
                        prop.target,
                        BindingKind::TwoWayProperty,
                        &prop.name,
                        prop.security_context.clone(),
                    ));
                }
                // The old compiler treated empty style bindings as regular bindings for the
                // purpose of directive matching. That behavior is incorrect, but we emulate it in
                // compatibility mode.
                UpdateOp::StyleProp(style) if compat && is_empty_binding(&style.expression) => {
                    extracted.push(name_only(
                        style.target,
                        BindingKind::Property,
                        &style.name,
                        vec![SecurityContext::STYLE],
                    ));
                }
                UpdateOp::ClassProp(class) if compat && class.expression.is_empty_expr() => {
                    extracted.push(name_only(
                        class.target,
                        BindingKind::Property,
                        &class.name,
                        vec![SecurityContext::STYLE],
                    ));
                }
                _ => {}
            }
        }

        for attribute in extracted {
            place(create, &elements, is_host, attribute)?;
        }
    }
    Ok(())
}

/// An extracted attribute carrying only its name, used for directive matching.
fn name_only(
    target: XrefId,
    binding_kind: BindingKind,
    name: &str,
    security_context: Vec<SecurityContext>,
) -> ExtractedAttributeOp {
    create_extracted_attribute_op(target, binding_kind, None, name, None, security_context)
}

fn is_empty_binding(expression: &BindingExpression) -> bool {
    expression
        .as_expression()
        .is_some_and(Expression::is_empty_expr)
}

fn extract_attribute(attr: &AttributeOp, compat: bool) -> Option<ExtractedAttributeOp> {
    let BindingExpression::Expression(expression) = &attr.expression else {
        return None;
    };
    let mut extractable = attr.is_text_attribute || expression.is_constant();
    if compat {
        // TemplateDefinitionBuilder only extracts text attributes. It does not extract attribute
        // bindings, even if they are constants.
        extractable &= attr.is_text_attribute;
    }
    if !extractable {
        return None;
    }

    let binding_kind = if attr.is_structural_template_attribute {
        BindingKind::Template
    } else {
        BindingKind::Attribute
    };
    let mut extracted = create_extracted_attribute_op(
        attr.target,
        binding_kind,
        attr.namespace.clone(),
        attr.name.clone(),
        Some(expression.clone()),
        attr.security_context.clone(),
    );
    extracted.i18n_context = attr.i18n_context;
    extracted.i18n_message = attr.i18n_message.clone();
    Some(extracted)
}

fn place(
    create: &mut OpList<CreateOp>,
    elements: &IndexMap<XrefId, OpId>,
    is_host: bool,
    attribute: ExtractedAttributeOp,
) -> Result<()> {
    if is_host {
        create.push(CreateOp::ExtractedAttribute(attribute));
    } else {
        let owner = lookup_element(elements, attribute.target)?;
        create.insert_before(owner, CreateOp::ExtractedAttribute(attribute))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::ops::{
        create_attribute_op, create_element_start_op, create_property_op,
    };
    use crate::template::pipeline::ir::{CompatibilityMode, Namespace, Op, OpKind};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn job_with_element(options: &PipelineOptions) -> (ComponentCompilationJob, XrefId) {
        let mut job = ComponentCompilationJob::new("Cmp", ConstantPool::new(), options);
        let element = job.base.allocate_xref_id();
        let root = job.root;
        job.views[&root]
            .create
            .push(create_element_start_op("div", element, Namespace::HTML, None));
        (job, element)
    }

    #[test]
    fn test_text_attribute_is_extracted_and_removed() {
        let (mut job, element) = job_with_element(&PipelineOptions::default());
        let root = job.root;
        job.views[&root].update.push(UpdateOp::Attribute(create_attribute_op(
            element,
            None,
            "title",
            o::literal("hello"),
            vec![],
            true,
        )));
        job.views[&root].update.push(UpdateOp::Property(create_property_op(
            element,
            "value",
            o::variable("v"),
            BindingKind::Property,
            vec![],
        )));

        extract_attributes(&mut job).unwrap();

        let view = &job.views[&root];
        assert_eq!(
            view.update.iter().map(Op::kind).collect::<Vec<_>>(),
            vec![OpKind::Property]
        );
        let create: Vec<_> = view.create.iter().collect();
        assert_eq!(create.len(), 3);
        let CreateOp::ExtractedAttribute(title) = create[0] else {
            panic!("expected an extracted attribute");
        };
        assert_eq!(title.binding_kind, BindingKind::Attribute);
        assert!(title.expression.is_some());
        let CreateOp::ExtractedAttribute(value) = create[1] else {
            panic!("expected an extracted attribute");
        };
        assert_eq!(value.binding_kind, BindingKind::Property);
        assert!(value.expression.is_none());
        assert_eq!(create[2].kind(), OpKind::ElementStart);
    }

    #[test]
    fn test_constant_attribute_binding_kept_in_compat_mode() {
        let options = PipelineOptions {
            compatibility: CompatibilityMode::TemplateDefinitionBuilder,
            ..PipelineOptions::default()
        };
        let (mut job, element) = job_with_element(&options);
        let root = job.root;
        job.views[&root].update.push(UpdateOp::Attribute(create_attribute_op(
            element,
            None,
            "role",
            o::literal("button"),
            vec![],
            false,
        )));

        extract_attributes(&mut job).unwrap();
        assert_eq!(job.views[&root].update.len(), 1);
        assert_eq!(job.views[&root].create.len(), 1);
    }
}
