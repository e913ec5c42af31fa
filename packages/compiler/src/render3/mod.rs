//! Render3 Module
//!
//! Runtime symbols the pipeline lowers into.

pub mod r3_identifiers;

pub use r3_identifiers::Identifiers;
