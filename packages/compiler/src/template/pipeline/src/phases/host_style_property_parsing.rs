//! Host Style Property Parsing
//!
//! Host bindings are compiled using a different parser entrypoint, and are parsed quite differently
//! as a result. Therefore, we need to do some extra parsing for host style properties, as compared
//! to non-host style properties.

use crate::error::Result;
use crate::template::pipeline::ir::{BindingKind, UpdateOp};
use crate::template::pipeline::src::compilation::HostBindingCompilationJob;
use crate::template::pipeline::src::phases::parse_extracted_styles::hyphenate;

const STYLE_DOT: &str = "style.";
const CLASS_DOT: &str = "class.";
const STYLE_BANG: &str = "style!";
const CLASS_BANG: &str = "class!";
const BANG_IMPORTANT: &str = "!important";

pub fn parse_host_style_properties(job: &mut HostBindingCompilationJob) -> Result<()> {
    for op in job.root.update.iter_mut() {
        let UpdateOp::Binding(binding) = op else {
            continue;
        };
        if binding.kind != BindingKind::Property {
            continue;
        }

        // Delete any `!important` suffixes from the binding name.
        if let Some(stripped) = binding.name.strip_suffix(BANG_IMPORTANT) {
            binding.name = stripped.to_string();
        }

        if let Some(rest) = binding.name.strip_prefix(STYLE_DOT) {
            let name = if is_css_custom_property(rest) {
                rest.to_string()
            } else {
                hyphenate(rest)
            };
            let (property, suffix) = parse_property(&name);
            binding.kind = BindingKind::StyleProperty;
            binding.name = property;
            if suffix.is_some() {
                binding.unit = suffix;
            }
        } else if binding.name.starts_with(STYLE_BANG) {
            binding.kind = BindingKind::StyleProperty;
            binding.name = "style".to_string();
        } else if let Some(rest) = binding
            .name
            .strip_prefix(CLASS_DOT)
            .or_else(|| binding.name.strip_prefix(CLASS_BANG))
        {
            let (property, _) = parse_property(rest);
            binding.kind = BindingKind::ClassName;
            binding.name = property;
        }
    }
    Ok(())
}

/// Checks whether property name is a custom CSS property.
/// See: https://www.w3.org/TR/css-variables-1
fn is_css_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Split `width.px` into the property and its unit suffix, dropping any `!important`.
fn parse_property(name: &str) -> (String, Option<String>) {
    let name = match name.find(BANG_IMPORTANT) {
        Some(index) => &name[..index],
        None => name,
    };
    match name.rfind('.') {
        Some(unit_index) if unit_index > 0 => (
            name[..unit_index].to_string(),
            Some(name[unit_index + 1..].to_string()),
        ),
        _ => (name.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property_splits_unit() {
        assert_eq!(parse_property("width.px"), ("width".to_string(), Some("px".to_string())));
        assert_eq!(parse_property("color!important"), ("color".to_string(), None));
        assert_eq!(parse_property("opacity"), ("opacity".to_string(), None));
    }
}
