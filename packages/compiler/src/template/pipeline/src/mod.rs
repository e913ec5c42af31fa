//! Compilation model, instruction builders and the phase pipeline.

pub mod compilation;
pub mod emit;
pub mod instruction;
pub mod phases;
pub mod util;

pub use compilation::*;
