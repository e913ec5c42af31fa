//! Binding Specialization
//!
//! Specializes generic `Binding` ops into the more specific op kinds reify knows how to emit,
//! based on the binding kind, the binding name and the compilation mode.

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::{
    AnimationBindingOp, AttributeOp, BindingExpression, BindingOp, ControlCreateOp, ControlOp,
    DomPropertyOp, PropertyOp, TwoWayPropertyOp,
};
use crate::template::pipeline::ir::{BindingKind, CreateOp, UpdateOp};
use crate::template::pipeline::src::compilation::{
    CompilationJob, CompilationJobKind, TemplateCompilationMode,
};
use crate::template::pipeline::src::util::attributes::{is_aria_attribute, split_ns_name};
use crate::template::pipeline::src::util::elements::{create_op_xref_map, lookup_element};

const NG_NON_BINDABLE: &str = "ngNonBindable";
const ANIMATE_PREFIX: &str = "animate.";
const CONTROL_PROPERTY: &str = "field";

/// What a single `Binding` op turns into.
enum Specialization {
    NonBindable,
    Animation,
    Attribute { namespace: Option<String>, name: String },
    AriaAttribute,
    DomProperty,
    Control,
    Property,
    TwoWayProperty,
}

pub fn specialize_bindings(job: &mut dyn CompilationJob) -> Result<()> {
    let job_kind = job.kind();
    let (base, units) = job.parts_mut();
    let dom_only = base.mode == TemplateCompilationMode::DomOnly;

    for unit in units {
        let elements = create_op_xref_map(unit.create());
        let (create, update) = unit.lists_mut();

        let mut cursor = update.first();
        while let Some(id) = cursor {
            cursor = update.next(id);
            let UpdateOp::Binding(binding) = update.get(id)? else {
                continue;
            };
            let target = binding.target;
            let specialization = classify(binding, job_kind, dom_only)?;

            match specialization {
                Specialization::NonBindable => {
                    let element = lookup_element(&elements, target)?;
                    update.remove(id)?;
                    if let Some(element) = create.get_mut(element)?.element_base_mut() {
                        element.non_bindable = true;
                    }
                }
                Specialization::Control => {
                    let element = lookup_element(&elements, target)?;
                    update.replace_with(id, |op| specialize(op, Specialization::Control))?;
                    create.insert_after(
                        element,
                        CreateOp::ControlCreate(ControlCreateOp { target }),
                    )?;
                }
                other => {
                    update.replace_with(id, |op| specialize(op, other))?;
                }
            }
        }
    }
    Ok(())
}

fn classify(
    binding: &BindingOp,
    job_kind: CompilationJobKind,
    dom_only: bool,
) -> Result<Specialization> {
    let specialization = match binding.kind {
        BindingKind::Attribute => {
            if binding.name == NG_NON_BINDABLE {
                Specialization::NonBindable
            } else if binding.name.starts_with(ANIMATE_PREFIX) {
                Specialization::Animation
            } else {
                let (namespace, name) = split_ns_name(&binding.name)?;
                Specialization::Attribute { namespace, name }
            }
        }
        BindingKind::Animation => Specialization::Animation,
        BindingKind::Property | BindingKind::LegacyAnimation | BindingKind::Template => {
            // A host job is always DOM-only, so ARIA attributes are checked first.
            if dom_only && is_aria_attribute(&binding.name) {
                Specialization::AriaAttribute
            } else if job_kind == CompilationJobKind::Host {
                Specialization::DomProperty
            } else if binding.name == CONTROL_PROPERTY {
                Specialization::Control
            } else {
                Specialization::Property
            }
        }
        BindingKind::TwoWayProperty => {
            if binding.expression.as_interpolation().is_some() {
                return Err(PipelineError::assertion(format!(
                    "expected value of two-way property binding \"{}\" to be an expression",
                    binding.name
                )));
            }
            Specialization::TwoWayProperty
        }
        BindingKind::I18n | BindingKind::ClassName | BindingKind::StyleProperty => {
            return Err(PipelineError::assertion(format!(
                "unhandled binding of kind {:?}",
                binding.kind
            )));
        }
    };
    Ok(specialization)
}

fn specialize(op: UpdateOp, specialization: Specialization) -> UpdateOp {
    let UpdateOp::Binding(binding) = op else {
        return op;
    };
    match specialization {
        Specialization::Animation => UpdateOp::AnimationBinding(AnimationBindingOp {
            target: binding.target,
            name: binding.name,
            expression: binding.expression,
        }),
        Specialization::Attribute { namespace, name } => UpdateOp::Attribute(AttributeOp {
            target: binding.target,
            namespace,
            name,
            expression: binding.expression,
            security_context: binding.security_context,
            sanitizer: None,
            is_text_attribute: binding.is_text_attribute,
            is_structural_template_attribute: binding.is_structural_template_attribute,
            template_kind: binding.template_kind,
            i18n_context: binding.i18n_context,
            i18n_message: binding.i18n_message,
        }),
        Specialization::AriaAttribute => UpdateOp::Attribute(AttributeOp {
            target: binding.target,
            namespace: None,
            name: binding.name,
            expression: binding.expression,
            security_context: binding.security_context,
            sanitizer: None,
            is_text_attribute: binding.is_text_attribute,
            is_structural_template_attribute: binding.is_structural_template_attribute,
            template_kind: binding.template_kind,
            i18n_context: binding.i18n_context,
            i18n_message: binding.i18n_message,
        }),
        Specialization::DomProperty => UpdateOp::DomProperty(DomPropertyOp {
            name: binding.name,
            expression: binding.expression,
            binding_kind: binding.kind,
            i18n_context: binding.i18n_context,
            security_context: binding.security_context,
            sanitizer: None,
        }),
        Specialization::Control => UpdateOp::Control(ControlOp {
            target: binding.target,
            name: binding.name,
            expression: binding.expression,
            security_context: binding.security_context,
            sanitizer: None,
        }),
        Specialization::Property => UpdateOp::Property(PropertyOp {
            target: binding.target,
            name: binding.name,
            expression: binding.expression,
            binding_kind: binding.kind,
            security_context: binding.security_context,
            sanitizer: None,
            is_structural_template_attribute: binding.is_structural_template_attribute,
            template_kind: binding.template_kind,
            i18n_context: binding.i18n_context,
            i18n_message: binding.i18n_message,
        }),
        Specialization::TwoWayProperty => match binding.expression {
            BindingExpression::Expression(expression) => {
                UpdateOp::TwoWayProperty(TwoWayPropertyOp {
                    target: binding.target,
                    name: binding.name,
                    expression,
                    security_context: binding.security_context,
                    sanitizer: None,
                })
            }
            // Rejected by `classify`.
            expression => UpdateOp::Binding(BindingOp {
                expression,
                ..binding
            }),
        },
        // Removed rather than replaced.
        Specialization::NonBindable => UpdateOp::Binding(binding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::ops::{create_binding_op, create_element_start_op};
    use crate::template::pipeline::ir::{Namespace, Op, OpKind, XrefId};
    use crate::template::pipeline::src::compilation::{
        ComponentCompilationJob, HostBindingCompilationJob,
    };

    fn component_with_bindings(
        options: &PipelineOptions,
        bindings: &[(BindingKind, &str)],
    ) -> (ComponentCompilationJob, XrefId) {
        let mut job = ComponentCompilationJob::new("Cmp", ConstantPool::new(), options);
        let element = job.base.allocate_xref_id();
        let root = job.root;
        let view = &mut job.views[&root];
        view.create
            .push(create_element_start_op("div", element, Namespace::HTML, None));
        for (kind, name) in bindings {
            view.update.push(UpdateOp::Binding(create_binding_op(
                element,
                *kind,
                *name,
                o::variable("v"),
                None,
                vec![],
                false,
            )));
        }
        (job, element)
    }

    fn update_kinds(job: &ComponentCompilationJob) -> Vec<OpKind> {
        job.views[&job.root].update.iter().map(Op::kind).collect()
    }

    #[test]
    fn test_bindings_specialize_by_kind_and_name() {
        let (mut job, _) = component_with_bindings(
            &PipelineOptions::default(),
            &[
                (BindingKind::Property, "title"),
                (BindingKind::Attribute, ":xlink:href"),
                (BindingKind::Attribute, "animate.enter"),
                (BindingKind::TwoWayProperty, "value"),
                (BindingKind::Property, "aria-label"),
            ],
        );
        specialize_bindings(&mut job).unwrap();
        assert_eq!(
            update_kinds(&job),
            vec![
                OpKind::Property,
                OpKind::Attribute,
                OpKind::AnimationBinding,
                OpKind::TwoWayProperty,
                OpKind::Property,
            ]
        );
        let Some(UpdateOp::Attribute(attr)) = job.views[&job.root].update.iter().nth(1) else {
            panic!("expected an attribute op");
        };
        assert_eq!(attr.namespace.as_deref(), Some("xlink"));
        assert_eq!(attr.name, "href");
    }

    #[test]
    fn test_aria_property_becomes_attribute_in_dom_only_mode() {
        let options = PipelineOptions {
            mode: TemplateCompilationMode::DomOnly,
            ..PipelineOptions::default()
        };
        let (mut job, _) =
            component_with_bindings(&options, &[(BindingKind::Property, "aria-label")]);
        specialize_bindings(&mut job).unwrap();
        assert_eq!(update_kinds(&job), vec![OpKind::Attribute]);
    }

    #[test]
    fn test_non_bindable_marks_element() {
        let (mut job, _) =
            component_with_bindings(&PipelineOptions::default(), &[(BindingKind::Attribute, NG_NON_BINDABLE)]);
        specialize_bindings(&mut job).unwrap();
        assert!(update_kinds(&job).is_empty());
        let first = job.views[&job.root].create.iter().next().unwrap();
        assert!(first.element_base().unwrap().non_bindable);
    }

    #[test]
    fn test_field_binding_creates_control() {
        let (mut job, element) =
            component_with_bindings(&PipelineOptions::default(), &[(BindingKind::Property, "field")]);
        specialize_bindings(&mut job).unwrap();
        assert_eq!(update_kinds(&job), vec![OpKind::Control]);
        let create: Vec<_> = job.views[&job.root].create.iter().collect();
        assert!(matches!(create[1], CreateOp::ControlCreate(op) if op.target == element));
    }

    #[test]
    fn test_host_property_becomes_dom_property() {
        let mut job = HostBindingCompilationJob::new(
            "Cmp",
            ConstantPool::new(),
            &PipelineOptions::default(),
        );
        let xref = job.root.xref;
        job.root.update.push(UpdateOp::Binding(create_binding_op(
            xref,
            BindingKind::Property,
            "id",
            o::variable("v"),
            None,
            vec![],
            false,
        )));
        specialize_bindings(&mut job).unwrap();
        assert!(matches!(job.root.update.iter().next(), Some(UpdateOp::DomProperty(_))));
    }

    #[test]
    fn test_unspecialized_class_binding_is_an_error() {
        let (mut job, _) =
            component_with_bindings(&PipelineOptions::default(), &[(BindingKind::ClassName, "a")]);
        assert!(specialize_bindings(&mut job).is_err());
    }
}
