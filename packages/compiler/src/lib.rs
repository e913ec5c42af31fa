//! Template Pipeline
//!
//! Middle-end of a template compiler: lowers per-view operation lists into
//! runtime instruction calls through an ordered set of phases.

#![deny(clippy::all)]

pub mod config;
pub mod constant_pool;
pub mod core;
pub mod error;
pub mod i18n;
pub mod output;
pub mod render3;
pub mod template;

// Re-exports
pub use config::PipelineOptions;
pub use error::{PipelineError, Result};
pub use template::pipeline::src::emit::{compile_jobs, AnyJob};
