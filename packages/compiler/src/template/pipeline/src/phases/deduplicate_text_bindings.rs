//! Deduplicate Text Bindings
//!
//! Deduplicate text bindings, e.g. `<div class="cls1" class="cls2">`.

use indexmap::{IndexMap, IndexSet};

use crate::error::Result;
use crate::template::pipeline::ir::{UpdateOp, XrefId};
use crate::template::pipeline::src::compilation::CompilationJob;

pub fn deduplicate_text_bindings(job: &mut dyn CompilationJob) -> Result<()> {
    let mut seen: IndexMap<XrefId, IndexSet<String>> = IndexMap::new();
    let (base, units) = job.parts_mut();
    let compat = base.is_compat();

    for unit in units {
        let update = unit.update_mut();
        let mut cursor = update.last();
        while let Some(id) = cursor {
            cursor = update.prev(id);
            let UpdateOp::Binding(binding) = update.get(id)? else {
                continue;
            };
            if !binding.is_text_attribute {
                continue;
            }

            let seen_for_element = seen.entry(binding.target).or_default();
            let duplicate = !seen_for_element.insert(binding.name.clone());
            // For most duplicated attributes, TemplateDefinitionBuilder lists all of the values in
            // the consts array. However, for style and class attributes it only keeps the last one.
            // We replicate that behavior here since it has actual consequences for apps with
            // duplicate class or style attrs.
            if duplicate && compat && (binding.name == "style" || binding.name == "class") {
                update.remove(id)?;
            }
        }
    }
    Ok(())
}
