//! Template Pipeline
//!
//! `ir` holds the operation and expression IR; `src` holds the compilation model, the phases
//! and the driver that runs them.

pub mod ir;
pub mod src;
