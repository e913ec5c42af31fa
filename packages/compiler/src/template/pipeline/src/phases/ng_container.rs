//! Turns `<ng-container>` elements into container ops.

use std::collections::HashSet;

use crate::error::Result;
use crate::template::pipeline::ir::CreateOp;
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

const CONTAINER_TAG: &str = "ng-container";

pub fn generate_ng_container_ops(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let mut containers = HashSet::new();
        for id in unit.create.ids() {
            let start = match unit.create.get(id)? {
                CreateOp::ElementStart(op) if op.base.tag.as_deref() == Some(CONTAINER_TAG) => {
                    containers.insert(op.base.xref);
                    true
                }
                CreateOp::ElementEnd(op) if containers.contains(&op.xref) => false,
                _ => continue,
            };
            unit.create.replace_with(id, |op| match op {
                CreateOp::ElementStart(element) if start => CreateOp::ContainerStart(element),
                CreateOp::ElementEnd(end) if !start => CreateOp::ContainerEnd(end),
                other => other,
            })?;
        }
    }
    Ok(())
}
