//! I18n AST
//!
//! The pipeline only needs a message's identity, its metadata and its serialized text; message
//! id computation and ICU text handling happen before ops are built.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Serialized message text, placeholders written as `{$NAME}`.
    pub message_string: String,
    pub meaning: String,
    pub description: String,
    pub custom_id: String,
    pub id: String,
    pub legacy_ids: Vec<String>,
}

impl Message {
    pub fn new(message_string: impl Into<String>, id: impl Into<String>) -> Arc<Self> {
        Arc::new(Message {
            message_string: message_string.into(),
            id: id.into(),
            ..Default::default()
        })
    }
}

/// Placeholder for an element's open and close tags inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlaceholder {
    pub tag: String,
    pub start_name: String,
    /// Empty for void elements.
    pub close_name: String,
    pub is_void: bool,
}

/// Placeholder for a control flow block (`@if`, `@for`, ...) inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlaceholder {
    pub name: String,
    pub start_name: String,
    pub close_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nPlaceholder {
    Tag(TagPlaceholder),
    Block(BlockPlaceholder),
}

impl I18nPlaceholder {
    pub fn start_name(&self) -> &str {
        match self {
            I18nPlaceholder::Tag(tag) => &tag.start_name,
            I18nPlaceholder::Block(block) => &block.start_name,
        }
    }

    pub fn close_name(&self) -> &str {
        match self {
            I18nPlaceholder::Tag(tag) => &tag.close_name,
            I18nPlaceholder::Block(block) => &block.close_name,
        }
    }
}

/// Identity of a shared message, used to group bindings that translate the same message.
pub fn message_identity(message: &Arc<Message>) -> usize {
    Arc::as_ptr(message) as usize
}
