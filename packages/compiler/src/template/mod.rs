//! Template Module
//!
//! The template pipeline: IR and lowering phases.

pub mod pipeline;
