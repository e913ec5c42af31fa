//! Generates `advance` ops between update ops so the runtime's implicit slot context points at
//! the right slot before each op that depends on it.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::ops::create_advance_op;
use crate::template::pipeline::ir::{UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn generate_advance(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let mut slot_map: HashMap<XrefId, usize> = HashMap::new();
        for op in unit.create.iter() {
            if let Some(consumer) = op.as_consumes_slot() {
                let slot = consumer.handle().slot().ok_or_else(|| {
                    PipelineError::assertion(
                        "expected slots to have been allocated before generating advance() calls",
                    )
                })?;
                slot_map.insert(consumer.xref(), slot);
            }
        }

        // The runtime's slot counter as of the op being visited.
        let mut slot_context = 0;
        for id in unit.update.ids() {
            let Some(target) = slot_target(unit.update.get_mut(id)?) else {
                continue;
            };
            let slot = *slot_map.get(&target).ok_or_else(|| {
                PipelineError::assertion(format!("reference to unknown slot for target {target:?}"))
            })?;
            if slot == slot_context {
                continue;
            }
            let delta = slot.checked_sub(slot_context).ok_or_else(|| {
                PipelineError::assertion("slot counter should never need to move backwards")
            })?;
            unit.update.insert_before(id, create_advance_op(delta))?;
            slot_context = slot;
        }
    }
    Ok(())
}

/// The slot an op depends on: its own target, or the first slot-dependent expression it holds.
fn slot_target(op: &mut UpdateOp) -> Option<XrefId> {
    if let Some(dependent) = op.as_depends_on_slot_context() {
        return Some(dependent.target());
    }
    let mut target = None;
    op.visit_expressions(&mut |expr, _| {
        if target.is_none() {
            target = expr.as_depends_on_slot_context().map(|e| e.target());
        }
    });
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::output::output_ast as o;
    use crate::template::pipeline::ir::ops::{create_property_op, create_text_op};
    use crate::template::pipeline::ir::{BindingKind, CreateOp, Op, OpKind};

    fn job_with_texts(count: usize) -> (ComponentCompilationJob, Vec<XrefId>) {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let root = job.root;
        let mut xrefs = Vec::new();
        for slot in 0..count {
            let xref = job.base.allocate_xref_id();
            let op = create_text_op(xref, "");
            if let CreateOp::Text(text) = &op {
                text.handle.assign(slot).unwrap();
            }
            job.views[&root].create.push(op);
            xrefs.push(xref);
        }
        (job, xrefs)
    }

    fn property(target: XrefId) -> UpdateOp {
        UpdateOp::Property(create_property_op(
            target,
            "title",
            o::variable("t"),
            BindingKind::Property,
            vec![],
        ))
    }

    #[test]
    fn test_advance_inserted_for_skipped_slots() {
        let (mut job, xrefs) = job_with_texts(4);
        let root = job.root;
        job.views[&root].update.push(property(xrefs[0]));
        job.views[&root].update.push(property(xrefs[3]));

        generate_advance(&mut job).unwrap();

        let ops: Vec<_> = job.views[&root].update.iter().collect();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].kind(), OpKind::Property);
        match ops[1] {
            UpdateOp::Advance(advance) => assert_eq!(advance.delta, 3),
            other => panic!("unexpected {:?}", other.kind()),
        }
    }

    #[test]
    fn test_backwards_move_is_an_error() {
        let (mut job, xrefs) = job_with_texts(2);
        let root = job.root;
        job.views[&root].update.push(property(xrefs[1]));
        job.views[&root].update.push(property(xrefs[0]));
        assert!(generate_advance(&mut job).is_err());
    }
}
