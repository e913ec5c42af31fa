//! Core Types
//!
//! Runtime-facing enums shared between the pipeline and the instructions it emits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
#[repr(u8)]
pub enum SecurityContext {
    NONE = 0,
    HTML = 1,
    STYLE = 2,
    SCRIPT = 3,
    URL = 4,
    ResourceUrl = 5,
}

/// Markers separating the sections of a serialized element attribute array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeMarker {
    NamespaceURI = 0,
    Classes = 1,
    Styles = 2,
    Bindings = 3,
    Template = 4,
    ProjectAs = 5,
    I18n = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorFlags {
    NOT = 0b0001,
    ATTRIBUTE = 0b0010,
    ELEMENT = 0b0100,
    CLASS = 0b1000,
}

/// One entry of a parsed selector: either a string part or a flag marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum R3SelectorPart {
    Str(String),
    Flag(u32),
}

pub type R3CssSelector = Vec<R3SelectorPart>;
pub type R3CssSelectorList = Vec<R3CssSelector>;

/// Parse a comma separated list of simple CSS selectors (`tag.cls[attr=value]`) into the flat
/// runtime format: `[tag, attrName, attrValue, ..., CLASS, cls, ...]`.
pub fn parse_selector_to_r3_selector(selector: &str) -> R3CssSelectorList {
    selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_simple_selector)
        .collect()
}

fn parse_simple_selector(selector: &str) -> R3CssSelector {
    let mut tag = String::new();
    let mut attrs: Vec<R3SelectorPart> = Vec::new();
    let mut classes: Vec<R3SelectorPart> = Vec::new();
    let mut chars = selector.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '.' => {
                chars.next();
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n == '.' || n == '[' {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                classes.push(R3SelectorPart::Str(name));
            }
            '[' => {
                chars.next();
                let mut body = String::new();
                for n in chars.by_ref() {
                    if n == ']' {
                        break;
                    }
                    body.push(n);
                }
                let (name, value) = match body.split_once('=') {
                    Some((name, value)) => (
                        name.trim().to_string(),
                        value.trim().trim_matches(|q| q == '"' || q == '\'').to_string(),
                    ),
                    None => (body.trim().to_string(), String::new()),
                };
                attrs.push(R3SelectorPart::Str(name));
                attrs.push(R3SelectorPart::Str(value));
            }
            _ => {
                tag.push(c);
                chars.next();
            }
        }
    }

    let mut parts = vec![R3SelectorPart::Str(if tag == "*" { String::new() } else { tag })];
    parts.extend(attrs);
    if !classes.is_empty() {
        parts.push(R3SelectorPart::Flag(SelectorFlags::CLASS as u32));
        parts.extend(classes);
    }
    parts
}
