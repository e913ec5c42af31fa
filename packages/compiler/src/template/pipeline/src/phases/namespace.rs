//! Namespace Changes
//!
//! Change namespaces between HTML, SVG and MathML, depending on the next element.

use crate::error::Result;
use crate::template::pipeline::ir::ops::create_namespace_op;
use crate::template::pipeline::ir::{CreateOp, Namespace};
use crate::template::pipeline::src::compilation::ComponentCompilationJob;

pub fn emit_namespace_changes(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let mut active_namespace = Namespace::HTML;

        let mut cursor = unit.create.first();
        while let Some(id) = cursor {
            cursor = unit.create.next(id);
            let CreateOp::ElementStart(element) = unit.create.get(id)? else {
                continue;
            };
            let namespace = element.base.namespace;
            if namespace != active_namespace {
                unit.create.insert_before(id, create_namespace_op(namespace))?;
                active_namespace = namespace;
            }
        }
    }
    Ok(())
}
