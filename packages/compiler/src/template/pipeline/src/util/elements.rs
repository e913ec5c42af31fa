//! Element Utilities

use indexmap::IndexMap;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::{CreateOp, OpId, OpList, XrefId};

/// Gets a map of all slot-consuming ops in the given create list by their xref id.
///
/// A `@for` block with an `@empty` view is also registered under the empty view's xref, since
/// bindings on the empty view's root target the repeater.
pub fn create_op_xref_map(create: &OpList<CreateOp>) -> IndexMap<XrefId, OpId> {
    let mut map = IndexMap::new();
    for (id, op) in create.iter_with_ids() {
        let Some(slot_op) = op.as_consumes_slot() else {
            continue;
        };
        map.insert(slot_op.xref(), id);
        if let CreateOp::RepeaterCreate(repeater) = op {
            if let Some(empty_view) = repeater.empty_view {
                map.insert(empty_view, id);
            }
        }
    }
    map
}

/// Look up the op declaring `xref`, failing when the cross-reference is dangling.
pub fn lookup_element(map: &IndexMap<XrefId, OpId>, xref: XrefId) -> Result<OpId> {
    map.get(&xref)
        .copied()
        .ok_or_else(|| PipelineError::assertion(format!("all attributes should have an element-like target, missing {:?}", xref)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::pipeline::ir::expression::lexical_read;
    use crate::template::pipeline::ir::ops::{
        create_element_start_op, create_repeater_create_op, RepeaterVarNames,
    };
    use crate::template::pipeline::ir::{ListId, Namespace};

    #[test]
    fn test_repeater_is_registered_under_its_empty_view() {
        let mut create = OpList::new(ListId(0));
        let div = create.push(create_element_start_op("div", XrefId(1), Namespace::HTML, None));
        let repeater = create.push(create_repeater_create_op(
            XrefId(2),
            Some(XrefId(3)),
            None,
            lexical_read("$index"),
            RepeaterVarNames::default(),
            None,
        ));
        let map = create_op_xref_map(&create);
        assert_eq!(lookup_element(&map, XrefId(1)), Ok(div));
        assert_eq!(lookup_element(&map, XrefId(3)), Ok(repeater));
        assert!(lookup_element(&map, XrefId(9)).is_err());
    }
}
