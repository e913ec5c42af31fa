//! I18n Module
//!
//! Message and placeholder types produced by the upstream i18n extractor.

pub mod i18n_ast;

pub use i18n_ast::{BlockPlaceholder, I18nPlaceholder, Message, TagPlaceholder};
