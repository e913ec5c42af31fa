//! IR Ops
//!
//! The closed `CreateOp` / `UpdateOp` families and the operations shared by both lists.

pub mod create;
pub mod shared;
pub mod update;

pub use create::*;
pub use shared::*;
pub use update::*;
