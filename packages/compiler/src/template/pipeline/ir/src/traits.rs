//! IR Traits
//!
//! Capabilities shared by unrelated operation and expression variants. Generic phases (slot
//! allocation, variable counting, advance generation) query these instead of matching on concrete
//! kinds. Op and expression enums expose each capability through an `as_*` accessor returning
//! `Option<&dyn Trait>`, so only the variants that carry the data answer `Some`.

use crate::template::pipeline::ir::expression::{ExpressionTransform, VisitorContextFlag};
use crate::template::pipeline::ir::handle::{SlotHandle, XrefId};

/// Marks an operation as requiring allocation of one or more data slots for storage.
pub trait ConsumesSlotOpTrait {
    /// Assigned data slot (the starting index, if more than one slot is needed) for this operation.
    fn handle(&self) -> &SlotHandle;

    /// The number of slots which will be used by this operation. By default 1, but can be increased
    /// if necessary.
    fn num_slots_used(&self) -> usize {
        1
    }

    /// `XrefId` of this operation (e.g. the element stored in the assigned slot). Used to link this
    /// operation with `DependsOnSlotContextOpTrait` implementors.
    fn xref(&self) -> XrefId;
}

/// Marks an operation as depending on the runtime's implicit slot context being set to a particular
/// slot.
///
/// The runtime has an implicit slot context which is adjusted using the `advance()` instruction
/// during the execution of template update functions. This trait marks an operation as requiring
/// this implicit context to be `advance()`'d to point at a particular slot prior to execution.
pub trait DependsOnSlotContextOpTrait {
    /// `XrefId` of the `ConsumesSlotOpTrait` which the implicit slot context must reference before
    /// this operation can be executed.
    fn target(&self) -> XrefId;
}

/// Marks an operation or expression as consuming variable storage space.
pub trait ConsumesVarsTrait {
    /// Number of variable slots this node consumes.
    fn vars_used(&self) -> usize;
}

/// Marks an expression as requiring knowledge of the number of variable storage slots used prior
/// to it.
pub trait UsesVarOffsetTrait {
    fn var_offset(&self) -> Option<usize>;

    fn set_var_offset(&mut self, offset: usize);
}

/// An operation whose expressions can be rewritten. Lets phases treat create and update lists
/// alike.
pub trait ExpressionHolder {
    fn transform_expressions(
        &mut self,
        transform: &mut ExpressionTransform<'_>,
        flags: VisitorContextFlag,
    );
}
