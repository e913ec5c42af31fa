//! Resolves sanitization functions for ops that need them.

use crate::core::SecurityContext;
use crate::error::{PipelineError, Result};
use crate::output::output_ast::{self as o, ExternalReference};
use crate::render3::r3_identifiers::Identifiers;
use crate::template::pipeline::ir::{CreateOp, OpList, UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::{CompilationJob, CompilationJobKind};
use crate::template::pipeline::src::util::attributes::is_iframe_security_sensitive_attr;
use crate::template::pipeline::src::util::elements::{create_op_xref_map, lookup_element};

fn sanitizer_fn(context: SecurityContext) -> Option<ExternalReference> {
    match context {
        SecurityContext::HTML => Some(Identifiers::sanitize_html()),
        SecurityContext::ResourceUrl => Some(Identifiers::sanitize_resource_url()),
        SecurityContext::SCRIPT => Some(Identifiers::sanitize_script()),
        SecurityContext::STYLE => Some(Identifiers::sanitize_style()),
        SecurityContext::URL => Some(Identifiers::sanitize_url()),
        SecurityContext::NONE => None,
    }
}

fn trusted_value_fn(context: SecurityContext) -> Option<ExternalReference> {
    match context {
        SecurityContext::HTML => Some(Identifiers::trust_constant_html()),
        SecurityContext::ResourceUrl => Some(Identifiers::trust_constant_resource_url()),
        _ => None,
    }
}

/// The single security context of a binding.
fn only_security_context(contexts: &[SecurityContext]) -> Result<SecurityContext> {
    match contexts {
        [] => Ok(SecurityContext::NONE),
        [context] => Ok(*context),
        _ => Err(PipelineError::assertion("ambiguous security context")),
    }
}

fn sanitizer_for(contexts: &[SecurityContext]) -> Result<Option<ExternalReference>> {
    // When the host element isn't known, some URL attributes (such as "src" and "href") may be
    // part of multiple different security contexts. The runtime then selects the actual sanitizer
    // based on the tag name.
    if contexts.len() == 2
        && contexts.contains(&SecurityContext::URL)
        && contexts.contains(&SecurityContext::ResourceUrl)
    {
        return Ok(Some(Identifiers::sanitize_url_or_resource_url()));
    }
    Ok(sanitizer_fn(only_security_context(contexts)?))
}

pub fn resolve_sanitizers(job: &mut dyn CompilationJob) -> Result<()> {
    let is_host = job.kind() == CompilationJobKind::Host;
    for unit in job.units_mut() {
        let (create, update) = unit.lists_mut();

        // Security sensitive constant attributes get trusted values, except in host bindings.
        if !is_host {
            for op in create.iter_mut() {
                if let CreateOp::ExtractedAttribute(attr) = op {
                    attr.trusted_value_fn = trusted_value_fn(only_security_context(
                        &attr.security_context,
                    )?)
                    .map(o::import_ref);
                }
            }
        }

        for op in update.iter_mut() {
            let (target, name, contexts, sanitizer) = match op {
                UpdateOp::Property(op) => (
                    Some(op.target),
                    op.name.as_str(),
                    &op.security_context,
                    &mut op.sanitizer,
                ),
                UpdateOp::Attribute(op) => (
                    Some(op.target),
                    op.name.as_str(),
                    &op.security_context,
                    &mut op.sanitizer,
                ),
                UpdateOp::DomProperty(op) => {
                    (None, op.name.as_str(), &op.security_context, &mut op.sanitizer)
                }
                _ => continue,
            };

            let resolved = sanitizer_for(contexts)?;
            *sanitizer = resolved.clone().map(o::import_ref);
            if resolved.is_some() {
                continue;
            }

            // Without a sanitizer, security-sensitive `<iframe>` attributes are still validated.
            // The element of a host or DOM property binding is unknown, so it is assumed to be an
            // `<iframe>` and checked at runtime.
            let is_iframe = match target {
                Some(target) if !is_host => is_iframe_element(create, target)?,
                _ => true,
            };
            if is_iframe && is_iframe_security_sensitive_attr(name) {
                *sanitizer = Some(o::import_ref(Identifiers::validate_iframe_attribute()));
            }
        }
    }
    Ok(())
}

fn is_iframe_element(create: &OpList<CreateOp>, target: XrefId) -> Result<bool> {
    let elements = create_op_xref_map(create);
    let owner = create.get(lookup_element(&elements, target)?)?;
    if !owner.is_element_or_container() {
        return Err(PipelineError::assertion(
            "property should have an element-like owner",
        ));
    }
    Ok(match owner {
        CreateOp::ElementStart(op) | CreateOp::Element(op) => op
            .base
            .tag
            .as_deref()
            .is_some_and(|tag| tag.eq_ignore_ascii_case("iframe")),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::{
        create_attribute_op, create_element_start_op, create_property_op,
    };
    use crate::template::pipeline::ir::{BindingKind, Namespace};
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;

    fn job_with_element(tag: &str) -> (ComponentCompilationJob, XrefId) {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let element = job.base.allocate_xref_id();
        job.views[&root]
            .create
            .push(create_element_start_op(tag, element, Namespace::HTML, None));
        (job, element)
    }

    fn sanitizers(job: &ComponentCompilationJob) -> Vec<Option<o::Expression>> {
        job.views[&job.root]
            .update
            .iter()
            .map(|op| match op {
                UpdateOp::Property(op) => op.sanitizer.clone(),
                UpdateOp::Attribute(op) => op.sanitizer.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_url_property_gets_url_sanitizer() {
        let (mut job, element) = job_with_element("a");
        let root = job.root;
        job.views[&root].update.push(UpdateOp::Property(create_property_op(
            element,
            "href",
            o::variable("link"),
            BindingKind::Property,
            vec![SecurityContext::URL],
        )));

        resolve_sanitizers(&mut job).unwrap();

        let expected = o::import_ref(Identifiers::sanitize_url());
        assert!(sanitizers(&job)[0]
            .as_ref()
            .is_some_and(|s| s.is_equivalent(&expected)));
    }

    #[test]
    fn test_ambiguous_url_context_uses_runtime_selection() {
        let (mut job, element) = job_with_element("div");
        let root = job.root;
        job.views[&root].update.push(UpdateOp::Property(create_property_op(
            element,
            "src",
            o::variable("src"),
            BindingKind::Property,
            vec![SecurityContext::URL, SecurityContext::ResourceUrl],
        )));

        resolve_sanitizers(&mut job).unwrap();

        let expected = o::import_ref(Identifiers::sanitize_url_or_resource_url());
        assert!(sanitizers(&job)[0]
            .as_ref()
            .is_some_and(|s| s.is_equivalent(&expected)));
    }

    #[test]
    fn test_iframe_sensitive_attribute_is_validated() {
        let (mut job, element) = job_with_element("iframe");
        let root = job.root;
        job.views[&root]
            .update
            .push(UpdateOp::Attribute(create_attribute_op(
                element,
                None,
                "sandbox",
                o::variable("policy"),
                vec![],
                false,
            )));

        resolve_sanitizers(&mut job).unwrap();

        let expected = o::import_ref(Identifiers::validate_iframe_attribute());
        assert!(sanitizers(&job)[0]
            .as_ref()
            .is_some_and(|s| s.is_equivalent(&expected)));
    }
}
