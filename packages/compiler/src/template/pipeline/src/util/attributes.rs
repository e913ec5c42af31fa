//! Attribute Utilities

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::{PipelineError, Result};

const ARIA_PREFIX: &str = "aria-";

/// Returns whether `name` is an ARIA attribute name.
///
/// This is a heuristic based on whether name begins with and is longer than `aria-`.
pub fn is_aria_attribute(name: &str) -> bool {
    name.starts_with(ARIA_PREFIX) && name.len() > ARIA_PREFIX.len()
}

/// Security-sensitive attributes of an `<iframe>` that must only be applied as static attributes,
/// so they are all known when the `<iframe>` is created at runtime.
static IFRAME_SECURITY_SENSITIVE_ATTRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sandbox",
        "allow",
        "allowfullscreen",
        "referrerpolicy",
        "csp",
        "fetchpriority",
    ]
    .into_iter()
    .collect()
});

/// Whether `name` might be a security-sensitive `<iframe>` attribute.
pub fn is_iframe_security_sensitive_attr(name: &str) -> bool {
    // `setAttribute` is case-insensitive.
    IFRAME_SECURITY_SENSITIVE_ATTRS.contains(name.to_lowercase().as_str())
}

/// Split a `:namespace:name` attribute name into its namespace and local name.
pub fn split_ns_name(name: &str) -> Result<(Option<String>, String)> {
    let Some(rest) = name.strip_prefix(':') else {
        return Ok((None, name.to_string()));
    };
    match rest.split_once(':') {
        Some((namespace, local)) => Ok((Some(namespace.to_string()), local.to_string())),
        None => Err(PipelineError::unsupported(format!(
            "unsupported format \"{}\" expecting \":namespace:name\"",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_aria_attribute() {
        assert!(is_aria_attribute("aria-label"));
        assert!(!is_aria_attribute("aria-"));
        assert!(!is_aria_attribute("role"));
    }

    #[test]
    fn test_iframe_sensitive_attrs_ignore_case() {
        assert!(is_iframe_security_sensitive_attr("sandbox"));
        assert!(is_iframe_security_sensitive_attr("referrerPolicy"));
        assert!(!is_iframe_security_sensitive_attr("src"));
    }

    #[test]
    fn test_split_ns_name() {
        assert_eq!(split_ns_name("href"), Ok((None, "href".to_string())));
        assert_eq!(
            split_ns_name(":xlink:href"),
            Ok((Some("xlink".to_string()), "href".to_string()))
        );
        assert!(split_ns_name(":xlink").is_err());
    }
}
