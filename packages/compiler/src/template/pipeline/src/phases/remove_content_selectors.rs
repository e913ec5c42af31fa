//! Remove Content Selectors
//!
//! Attributes of `ng-content` named `select` control which content matches as a property of the
//! projection, and are not a plain attribute.

use crate::error::Result;
use crate::template::pipeline::ir::{CreateOp, UpdateOp};
use crate::template::pipeline::src::compilation::{CompilationUnit, ComponentCompilationJob};
use crate::template::pipeline::src::util::elements::{create_op_xref_map, lookup_element};

pub fn remove_content_selectors(job: &mut ComponentCompilationJob) -> Result<()> {
    for unit in job.views.values_mut() {
        let elements = create_op_xref_map(unit.create());
        let (create, update) = unit.lists_mut();

        let mut cursor = update.first();
        while let Some(id) = cursor {
            cursor = update.next(id);
            let UpdateOp::Binding(binding) = update.get(id)? else {
                continue;
            };
            if !is_select_attribute(&binding.name) {
                continue;
            }
            let target = lookup_element(&elements, binding.target)?;
            if matches!(create.get(target)?, CreateOp::Projection(_)) {
                update.remove(id)?;
            }
        }
    }
    Ok(())
}

fn is_select_attribute(name: &str) -> bool {
    name.eq_ignore_ascii_case("select")
}
