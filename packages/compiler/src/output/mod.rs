//! Output Module
//!
//! The output AST the pipeline lowers into, and a compact emitter used for diagnostics and tests.

pub mod abstract_emitter;
pub mod output_ast;
