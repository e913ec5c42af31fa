//! Wraps the children of `ngNonBindable` elements in `disableBindings`/`enableBindings` ops.

use std::collections::HashSet;

use crate::error::Result;
use crate::template::pipeline::ir::ops::BindingsToggleOp;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn disable_bindings(job: &mut dyn CompilationJob) -> Result<()> {
    let mut non_bindable = HashSet::new();
    for unit in job.units() {
        for op in unit.create().iter() {
            if let Some(base) = op.element_base() {
                if base.non_bindable {
                    non_bindable.insert(base.xref);
                }
            }
        }
    }
    if non_bindable.is_empty() {
        return Ok(());
    }

    for unit in job.units_mut() {
        let create = unit.create_mut();
        for id in create.ids() {
            // `true` disables bindings after a start op, `false` re-enables them before an end op.
            let toggle = match create.get(id)? {
                CreateOp::ElementStart(op) | CreateOp::ContainerStart(op)
                    if non_bindable.contains(&op.base.xref) =>
                {
                    Some((op.base.xref, true))
                }
                CreateOp::ElementEnd(op) | CreateOp::ContainerEnd(op)
                    if non_bindable.contains(&op.xref) =>
                {
                    Some((op.xref, false))
                }
                _ => None,
            };
            match toggle {
                Some((xref, true)) => {
                    create.insert_after(id, CreateOp::DisableBindings(BindingsToggleOp { xref }))?;
                }
                Some((xref, false)) => {
                    create.insert_before(id, CreateOp::EnableBindings(BindingsToggleOp { xref }))?;
                }
                None => {}
            }
        }
    }
    Ok(())
}
