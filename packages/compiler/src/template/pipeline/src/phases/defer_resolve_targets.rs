//! Some `defer` conditions can reference other elements in the template, using their local
//! reference names. This phase resolves those names to the xrefs and slots of the referenced
//! elements, along with the number of views between the trigger and its target.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::DeferTriggerTarget;
use crate::template::pipeline::ir::{
    CreateOp, DeferOpModifierKind, OpId, SlotHandle, XrefId,
};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

/// Elements with a plain local reference, by reference name.
type Targets = HashMap<String, (XrefId, SlotHandle)>;

struct Resolution {
    view: XrefId,
    op: OpId,
    target: DeferTriggerTarget,
}

pub fn resolve_defer_target_names(job: &mut ComponentCompilationJob) -> Result<()> {
    let mut scopes: HashMap<XrefId, Targets> = HashMap::new();
    let mut resolutions = Vec::new();

    for (&xref, view) in &job.views {
        let mut placeholders = HashMap::new();
        for (id, op) in view.create.iter_with_ids() {
            match op {
                CreateOp::Defer(defer) => {
                    placeholders.insert(defer.xref, (defer.placeholder_view, defer.main_view));
                }
                CreateOp::DeferOn(on) => {
                    let Some(&(placeholder, main)) = placeholders.get(&on.defer) else {
                        continue;
                    };
                    let Some(target) = on.trigger.target() else {
                        continue;
                    };
                    // Hydration triggers look inside the main content instead of the placeholder.
                    let placeholder = if on.modifier == DeferOpModifierKind::Hydrate {
                        Some(main)
                    } else {
                        placeholder
                    };
                    let resolved = resolve_target(job, &mut scopes, xref, target, placeholder)?;
                    resolutions.push(Resolution {
                        view: xref,
                        op: id,
                        target: resolved,
                    });
                }
                _ => {}
            }
        }
    }

    for resolution in resolutions {
        let view = job.view_mut(resolution.view)?;
        if let CreateOp::DeferOn(on) = view.create.get_mut(resolution.op)? {
            if let Some(target) = on.trigger.target_mut() {
                *target = resolution.target;
            }
        }
    }
    Ok(())
}

fn resolve_target(
    job: &ComponentCompilationJob,
    scopes: &mut HashMap<XrefId, Targets>,
    owner: XrefId,
    target: &DeferTriggerTarget,
    placeholder: Option<XrefId>,
) -> Result<DeferTriggerTarget> {
    let mut resolved = target.clone();

    let Some(name) = &target.target_name else {
        // No target name means the trigger listens on the first element of the placeholder.
        let placeholder = placeholder.ok_or_else(|| {
            PipelineError::assertion(
                "defer on trigger with no target name must have a placeholder block",
            )
        })?;
        let first = job.view(placeholder)?.create.iter().find(|op| {
            op.as_consumes_slot().is_some()
                && (op.is_element_or_container() || matches!(op, CreateOp::Projection(_)))
        });
        if let Some(slot_op) = first.and_then(CreateOp::as_consumes_slot) {
            resolved.target_xref = Some(slot_op.xref());
            resolved.target_view = Some(placeholder);
            resolved.target_slot_view_steps = Some(-1);
            resolved.target_slot = Some(slot_op.handle().clone());
        }
        return Ok(resolved);
    };

    let (mut view, mut step) = match placeholder {
        Some(placeholder) => (Some(placeholder), -1),
        None => (Some(owner), 0),
    };
    while let Some(xref) = view {
        if !scopes.contains_key(&xref) {
            scopes.insert(xref, targets_for_view(job, xref)?);
        }
        if let Some((target_xref, slot)) = scopes.get(&xref).and_then(|t| t.get(name)) {
            resolved.target_xref = Some(*target_xref);
            resolved.target_view = Some(xref);
            resolved.target_slot_view_steps = Some(step);
            resolved.target_slot = Some(slot.clone());
            return Ok(resolved);
        }
        view = job.view(xref)?.parent;
        step += 1;
    }
    Ok(resolved)
}

fn targets_for_view(job: &ComponentCompilationJob, xref: XrefId) -> Result<Targets> {
    let mut targets = Targets::new();
    for op in job.view(xref)?.create.iter() {
        let Some(base) = op.element_base() else {
            continue;
        };
        for local_ref in &base.local_refs {
            if local_ref.target.is_empty() {
                targets.insert(local_ref.name.clone(), (base.xref, base.handle.clone()));
            }
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::{
        create_defer_on_op, create_defer_op, create_element_start_op, DeferTrigger, LocalRef,
    };
    use crate::template::pipeline::ir::Namespace;

    fn trigger_target(job: &ComponentCompilationJob, view: XrefId) -> DeferTriggerTarget {
        job.views[&view]
            .create
            .iter()
            .find_map(|op| match op {
                CreateOp::DeferOn(on) => on.trigger.target().cloned(),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_named_target_resolves_in_parent_view() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let button = job.base.allocate_xref_id();
        let defer = job.base.allocate_xref_id();
        let child = job.allocate_view(root).unwrap();
        let main = job.allocate_view(child).unwrap();

        let mut start = create_element_start_op("button", button, Namespace::HTML, None);
        if let Some(base) = start.element_base_mut() {
            base.local_refs.push(LocalRef {
                name: "trigger".to_string(),
                target: String::new(),
            });
        }
        job.views[&root].create.push(start);
        job.views[&child].create.push(CreateOp::Defer(create_defer_op(
            defer,
            main,
            SlotHandle::new(),
            None,
        )));
        job.views[&child].create.push(create_defer_on_op(
            defer,
            DeferTrigger::Hover(DeferTriggerTarget::named("trigger")),
            DeferOpModifierKind::None,
        ));

        resolve_defer_target_names(&mut job).unwrap();

        let target = trigger_target(&job, child);
        assert_eq!(target.target_xref, Some(button));
        assert_eq!(target.target_view, Some(root));
        assert_eq!(target.target_slot_view_steps, Some(1));
    }

    #[test]
    fn test_unnamed_target_uses_first_placeholder_element() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let defer = job.base.allocate_xref_id();
        let main = job.allocate_view(root).unwrap();
        let placeholder = job.allocate_view(root).unwrap();
        let element = job.base.allocate_xref_id();
        job.views[&placeholder]
            .create
            .push(create_element_start_op("div", element, Namespace::HTML, None));

        let mut op = create_defer_op(defer, main, SlotHandle::new(), None);
        op.placeholder_view = Some(placeholder);
        job.views[&root].create.push(CreateOp::Defer(op));
        job.views[&root].create.push(create_defer_on_op(
            defer,
            DeferTrigger::Interaction(DeferTriggerTarget::default()),
            DeferOpModifierKind::None,
        ));

        resolve_defer_target_names(&mut job).unwrap();

        let target = trigger_target(&job, root);
        assert_eq!(target.target_xref, Some(element));
        assert_eq!(target.target_view, Some(placeholder));
        assert_eq!(target.target_slot_view_steps, Some(-1));
    }
}
