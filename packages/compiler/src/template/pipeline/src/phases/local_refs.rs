//! Lifts local reference declarations on element-like structures within each view into an entry
//! in the `consts` array for the whole component.

use crate::error::Result;
use crate::output::output_ast::{self as o, Expression};
use crate::template::pipeline::ir::ops::LocalRef;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn lift_local_refs(job: &mut ComponentCompilationJob) -> Result<()> {
    let views: Vec<_> = job.views.keys().copied().collect();
    for xref in views {
        for id in job.view(xref)?.create.ids() {
            let op = job.view_mut(xref)?.create.get_mut(id)?;
            if !matches!(
                op,
                CreateOp::ElementStart(_)
                    | CreateOp::Template(_)
                    | CreateOp::ConditionalCreate(_)
                    | CreateOp::ConditionalBranchCreate(_)
            ) {
                continue;
            }
            let Some(base) = op.element_base_mut() else {
                continue;
            };
            let local_refs = std::mem::take(&mut base.local_refs);
            base.num_slots_used += local_refs.len();
            if local_refs.is_empty() {
                continue;
            }

            let index = job.add_const(serialize_local_refs(&local_refs), vec![]);
            if let Some(base) = job.view_mut(xref)?.create.get_mut(id)?.element_base_mut() {
                base.local_refs_index = Some(index);
            }
        }
    }
    Ok(())
}

/// `[name, target, name, target, ...]`
fn serialize_local_refs(refs: &[LocalRef]) -> Expression {
    o::literal_arr(
        refs.iter()
            .flat_map(|r| [o::literal(r.name.as_str()), o::literal(r.target.as_str())])
            .collect(),
    )
}
