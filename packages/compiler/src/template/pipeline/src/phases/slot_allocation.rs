//! Assign data slots for all operations which implement `ConsumesSlotOpTrait`, and propagate the
//! assigned data slots of those operations to any expressions which reference them.
//!
//! This phase is also responsible for counting the number of slots used for each view (its
//! `decls`) and propagating that number into the `Template` operations which declare embedded
//! views.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{PipelineError, Result};
use crate::output::output_ast::Expression;
use crate::template::pipeline::ir::{CreateOp, SlotHandle, UpdateOp, VisitorContextFlag, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn allocate_slots(job: &mut ComponentCompilationJob) -> Result<()> {
    // Slot assignments of every declaration in the component. Global across views, since a slot
    // of one view can be referenced from another (local references work this way).
    let mut slot_map: HashMap<XrefId, usize> = HashMap::new();

    for unit in job.views.values_mut() {
        // Slot indices start at 0 for each view and are not unique between views.
        let mut slot_count = 0;
        for op in unit.create.iter() {
            let Some(consumer) = op.as_consumes_slot() else {
                continue;
            };
            consumer.handle().assign(slot_count)?;
            slot_map.insert(consumer.xref(), slot_count);
            slot_count += consumer.num_slots_used();
        }
        trace!(view = ?unit.xref, decls = slot_count, "allocated slots");
        unit.set_decls(slot_count)?;
    }

    let decls: HashMap<XrefId, usize> = job
        .views
        .iter()
        .map(|(xref, view)| Ok((*xref, view.decls()?)))
        .collect::<Result<_>>()?;

    for unit in job.views.values_mut() {
        for op in unit.create.iter_mut() {
            match op {
                CreateOp::Template(op)
                | CreateOp::ConditionalCreate(op)
                | CreateOp::ConditionalBranchCreate(op) => {
                    op.decls = Some(view_decls(&decls, op.base.xref)?);
                }
                // The `@empty` view's decls are read directly when the repeater is reified.
                CreateOp::RepeaterCreate(op) => {
                    op.decls = Some(view_decls(&decls, op.base.xref)?);
                }
                _ => {}
            }
            propagate_in_create_op(op, &slot_map)?;
        }
        for op in unit.update.iter_mut() {
            propagate_in_update_op(op, &slot_map)?;
        }
    }
    Ok(())
}

fn view_decls(decls: &HashMap<XrefId, usize>, view: XrefId) -> Result<usize> {
    decls.get(&view).copied().ok_or(PipelineError::MissingView(view))
}

/// Handles are shared with the declaration they point at, so most are already assigned. Handles
/// created separately are filled in from the declaration's slot.
fn propagate(handle: &SlotHandle, target: XrefId, slot_map: &HashMap<XrefId, usize>) -> Result<()> {
    if handle.slot().is_some() {
        return Ok(());
    }
    match slot_map.get(&target) {
        Some(slot) => handle.assign(*slot),
        None => Ok(()),
    }
}

fn propagate_in_create_op(op: &mut CreateOp, slot_map: &HashMap<XrefId, usize>) -> Result<()> {
    match op {
        CreateOp::Listener(listener) => propagate(&listener.target_slot, listener.target, slot_map)?,
        CreateOp::TwoWayListener(listener) => {
            propagate(&listener.target_slot, listener.target, slot_map)?
        }
        CreateOp::Animation(animation) => {
            propagate(&animation.target_slot, animation.target, slot_map)?
        }
        CreateOp::Defer(defer) => {
            propagate(&defer.main_slot, defer.main_view, slot_map)?;
            for (slot, view) in [
                (&defer.loading_slot, defer.loading_view),
                (&defer.placeholder_slot, defer.placeholder_view),
                (&defer.error_slot, defer.error_view),
            ] {
                if let (Some(slot), Some(view)) = (slot, view) {
                    propagate(slot, view, slot_map)?;
                }
            }
        }
        CreateOp::DeferOn(defer_on) => {
            if let Some(target) = defer_on.trigger.target() {
                if let (Some(slot), Some(xref)) = (&target.target_slot, target.target_xref) {
                    propagate(slot, xref, slot_map)?;
                }
            }
        }
        _ => {}
    }
    propagate_in_expressions(|visit| op.visit_expressions(visit), slot_map)
}

fn propagate_in_update_op(op: &mut UpdateOp, slot_map: &HashMap<XrefId, usize>) -> Result<()> {
    if let UpdateOp::Repeater(repeater) = op {
        propagate(&repeater.target_slot, repeater.target, slot_map)?;
    }
    propagate_in_expressions(|visit| op.visit_expressions(visit), slot_map)
}

fn propagate_in_expressions(
    walk: impl FnOnce(&mut dyn FnMut(&Expression, VisitorContextFlag)),
    slot_map: &HashMap<XrefId, usize>,
) -> Result<()> {
    let mut error: Option<PipelineError> = None;
    walk(&mut |expr, _| {
        let linked = match expr {
            Expression::Reference(e) => Some((&e.target_slot, e.target)),
            Expression::PipeBinding(e) => Some((&e.target_slot, e.target)),
            Expression::PipeBindingVariadic(e) => Some((&e.target_slot, e.target)),
            Expression::ContextLetReference(e) => Some((&e.target_slot, e.target)),
            Expression::ConditionalCase(e) => Some((&e.target_slot, e.target)),
            _ => None,
        };
        if let Some((handle, target)) = linked {
            if let Err(err) = propagate(handle, target, slot_map) {
                error.get_or_insert(err);
            }
        }
    });
    error.map_or(Ok(()), Err)
}
