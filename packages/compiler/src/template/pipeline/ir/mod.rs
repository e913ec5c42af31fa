//! Template Pipeline IR
//!
//! Operation lists, operations, IR expressions and the capability traits phases query.

pub mod enums;
pub mod src;

pub use src::{expression, handle, operations, ops, traits, variable};

pub use enums::*;
pub use expression::{ExpressionTransform, VisitorContextFlag};
pub use handle::{ConstIndex, SlotHandle, XrefId};
pub use operations::{ListId, Op, OpId, OpList};
pub use ops::{CreateOp, UpdateOp};
pub use traits::{
    ConsumesSlotOpTrait, ConsumesVarsTrait, DependsOnSlotContextOpTrait, ExpressionHolder,
    UsesVarOffsetTrait,
};
pub use variable::{SemanticVariable, VariableFlags, CTX_REF};
