//! Parse Extracted Styles
//!
//! Parses extracted style and class attributes into separate `ExtractedAttributeOp`s per style or
//! class property.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::SecurityContext;
use crate::error::Result;
use crate::output::output_ast as o;
use crate::template::pipeline::ir::ops::{create_extracted_attribute_op, ExtractedAttributeOp};
use crate::template::pipeline::ir::{BindingKind, CreateOp, TemplateKind};
use crate::template::pipeline::src::compilation::CompilationJob;
use crate::template::pipeline::src::util::elements::create_op_xref_map;

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new("([a-z])([A-Z])").expect("static pattern"));

const OPEN_PAREN: u8 = b'(';
const CLOSE_PAREN: u8 = b')';
const COLON: u8 = b':';
const SEMICOLON: u8 = b';';
const BACK_SLASH: u8 = b'\\';
const QUOTE_DOUBLE: u8 = b'"';
const QUOTE_SINGLE: u8 = b'\'';

/// Parses string representation of a style into ordered `(name, value)` pairs, e.g.
/// `color: red; height: auto` into `[("color", "red"), ("height", "auto")]`.
pub fn parse_style(value: &str) -> Vec<(String, String)> {
    let bytes = value.as_bytes();
    let mut styles = Vec::new();

    let mut paren_depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut value_start = 0;
    let mut prop_start = 0;
    let mut current_prop: Option<String> = None;

    for (index, &token) in bytes.iter().enumerate() {
        // Position just past the current token.
        let i = index + 1;
        match token {
            OPEN_PAREN => paren_depth += 1,
            CLOSE_PAREN => paren_depth -= 1,
            QUOTE_SINGLE | QUOTE_DOUBLE => match quote {
                // `value_start` needs to be there since prop values don't have quotes in CSS.
                None => quote = Some(token),
                Some(open) if open == token => {
                    if index == 0 || bytes[index - 1] != BACK_SLASH {
                        quote = None;
                    }
                }
                Some(_) => {}
            },
            COLON if current_prop.is_none() && paren_depth == 0 && quote.is_none() => {
                let name = value[prop_start..index].trim();
                current_prop = Some(if name.starts_with("--") {
                    name.to_string()
                } else {
                    hyphenate(name)
                });
                value_start = i;
            }
            SEMICOLON if value_start > 0 && paren_depth == 0 && quote.is_none() => {
                if let Some(prop) = current_prop.take() {
                    styles.push((prop, value[value_start..index].trim().to_string()));
                    prop_start = i;
                    value_start = 0;
                }
            }
            _ => {}
        }
    }

    if let Some(prop) = current_prop {
        if value_start > 0 {
            styles.push((prop, value[value_start..].trim().to_string()));
        }
    }
    styles
}

/// `backgroundColor` to `background-color`.
pub fn hyphenate(value: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(value, "$1-$2")
        .to_lowercase()
}

pub fn parse_extracted_styles(job: &mut dyn CompilationJob) -> Result<()> {
    for unit in job.units_mut() {
        let elements = create_op_xref_map(unit.create());
        let create = unit.create_mut();

        let mut cursor = create.first();
        while let Some(id) = cursor {
            cursor = create.next(id);
            let CreateOp::ExtractedAttribute(attr) = create.get(id)? else {
                continue;
            };
            if attr.binding_kind != BindingKind::Attribute {
                continue;
            }
            let Some(text) = attr.expression.as_ref().and_then(|e| e.as_string_literal()) else {
                continue;
            };

            if let Some(&target) = elements.get(&attr.target) {
                let structural = create.get(target)?.as_template().is_some_and(|template| {
                    template.template_kind == TemplateKind::Structural
                });
                // TemplateDefinitionBuilder will not apply class and style bindings to structural
                // directives; instead, it will leave them as attributes.
                if structural {
                    continue;
                }
            }

            let replacements: Vec<ExtractedAttributeOp> = match attr.name.as_str() {
                "style" => parse_style(text)
                    .into_iter()
                    .map(|(name, value)| {
                        create_extracted_attribute_op(
                            attr.target,
                            BindingKind::StyleProperty,
                            None,
                            name,
                            Some(o::literal(value)),
                            vec![SecurityContext::STYLE],
                        )
                    })
                    .collect(),
                "class" => text
                    .split_whitespace()
                    .map(|class| {
                        create_extracted_attribute_op(
                            attr.target,
                            BindingKind::ClassName,
                            None,
                            class,
                            None,
                            vec![SecurityContext::NONE],
                        )
                    })
                    .collect(),
                _ => continue,
            };

            create.insert_all_before(
                id,
                replacements
                    .into_iter()
                    .map(CreateOp::ExtractedAttribute)
                    .collect(),
            )?;
            create.remove(id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineOptions;
    use crate::constant_pool::ConstantPool;
    use crate::template::pipeline::ir::ops::create_element_start_op;
    use crate::template::pipeline::ir::Namespace;
    use crate::template::pipeline::src::compilation::ComponentCompilationJob;
    use pretty_assertions::assert_eq;

    fn pairs(value: &str) -> Vec<(String, String)> {
        parse_style(value)
    }

    fn owned(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_style_pairs() {
        assert_eq!(
            pairs("color: red; height: auto"),
            owned(&[("color", "red"), ("height", "auto")])
        );
        assert_eq!(pairs("width:100px;"), owned(&[("width", "100px")]));
        assert!(parse_style("").is_empty());
    }

    #[test]
    fn test_parse_style_ignores_separators_in_parens_and_quotes() {
        assert_eq!(
            pairs("background: url('a;b:c'); transform: translate(1px;2px)"),
            owned(&[
                ("background", "url('a;b:c')"),
                ("transform", "translate(1px;2px)"),
            ])
        );
    }

    #[test]
    fn test_parse_style_hyphenates_but_keeps_custom_properties() {
        assert_eq!(
            pairs("backgroundColor: red; --camelCase: 1"),
            owned(&[("background-color", "red"), ("--camelCase", "1")])
        );
    }

    #[test]
    fn test_hyphenate() {
        assert_eq!(hyphenate("fontSize"), "font-size");
        assert_eq!(hyphenate("color"), "color");
    }

    #[test]
    fn test_class_and_style_attributes_are_split() {
        let mut job =
            ComponentCompilationJob::new("Cmp", ConstantPool::new(), &PipelineOptions::default());
        let element = job.base.allocate_xref_id();
        let root = job.root;
        let create = &mut job.views[&root].create;
        for (name, value) in [("class", "  a   b "), ("style", "color: red")] {
            create.push(CreateOp::ExtractedAttribute(create_extracted_attribute_op(
                element,
                BindingKind::Attribute,
                None,
                name,
                Some(o::literal(value)),
                vec![],
            )));
        }
        create.push(create_element_start_op("div", element, Namespace::HTML, None));

        parse_extracted_styles(&mut job).unwrap();

        let attrs: Vec<_> = job.views[&root]
            .create
            .iter()
            .filter_map(|op| match op {
                CreateOp::ExtractedAttribute(attr) => Some((attr.binding_kind, attr.name.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            attrs,
            vec![
                (BindingKind::ClassName, "a".to_string()),
                (BindingKind::ClassName, "b".to_string()),
                (BindingKind::StyleProperty, "color".to_string()),
            ]
        );
    }
}
