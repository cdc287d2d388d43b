//! HTML validation contract.
//!
//! Editable metadata values may contain user-supplied HTML. Validation never
//! raises: a [`ValidationResult`] lists what was rejected and the caller
//! decides what to do. [`AllowListValidator`] is a tag/attribute allow list,
//! not a sanitizer.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*/?\s*([A-Za-z][A-Za-z0-9]*)((?:[^>]*?))/?\s*>").expect("tag pattern")
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*(?:=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("attribute pattern")
});

/// Outcome of validating one HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub invalid_tags: Vec<String>,
    pub invalid_attributes: Vec<String>,
    pub contains_script: bool,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }
}

pub trait HtmlValidator: Send + Sync {
    fn validate(&self, html: &str) -> ValidationResult;
}

/// Accepts only listed tags and attributes; scripts are rejected unless
/// explicitly allowed.
#[derive(Debug, Clone)]
pub struct AllowListValidator {
    allowed_tags: BTreeSet<String>,
    allowed_attributes: BTreeSet<String>,
    allow_javascript: bool,
}

const DEFAULT_TAGS: &[&str] = &[
    "p", "a", "div", "span", "br", "strong", "b", "em", "i", "u", "ul", "ol", "li", "h1", "h2",
    "h3", "h4", "blockquote", "pre", "code", "img", "hr",
];
const DEFAULT_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "class", "style", "target"];

impl Default for AllowListValidator {
    fn default() -> Self {
        Self::new(DEFAULT_TAGS, DEFAULT_ATTRIBUTES, false)
    }
}

impl AllowListValidator {
    pub fn new(tags: &[&str], attributes: &[&str], allow_javascript: bool) -> Self {
        Self {
            allowed_tags: tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            allowed_attributes: attributes.iter().map(|a| a.to_ascii_lowercase()).collect(),
            allow_javascript,
        }
    }
}

fn is_script_attribute(name: &str, value: &str) -> bool {
    name.starts_with("on") || value.trim_start().to_ascii_lowercase().starts_with("javascript:")
}

impl HtmlValidator for AllowListValidator {
    fn validate(&self, html: &str) -> ValidationResult {
        let mut invalid_tags = BTreeSet::new();
        let mut invalid_attributes = BTreeSet::new();
        let mut contains_script = false;

        for tag in TAG.captures_iter(html) {
            let name = tag[1].to_ascii_lowercase();
            if name == "script" {
                contains_script = true;
            }
            if !self.allowed_tags.contains(&name) {
                invalid_tags.insert(name);
            }

            let attributes = tag.get(2).map_or("", |m| m.as_str());
            for attr in ATTRIBUTE.captures_iter(attributes) {
                let attr_name = attr[1].to_ascii_lowercase();
                let value = attr
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .trim_matches(|c| c == '"' || c == '\'');
                if is_script_attribute(&attr_name, value) {
                    contains_script = true;
                }
                if !self.allowed_attributes.contains(&attr_name) {
                    invalid_attributes.insert(attr_name);
                }
            }
        }

        let script_ok = self.allow_javascript || !contains_script;
        ValidationResult {
            is_valid: invalid_tags.is_empty() && invalid_attributes.is_empty() && script_ok,
            invalid_tags: invalid_tags.into_iter().collect(),
            invalid_attributes: invalid_attributes.into_iter().collect(),
            contains_script,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_valid() {
        let result = AllowListValidator::default().validate("Sunset over the bay");
        assert_eq!(result, ValidationResult::valid());
    }

    #[test]
    fn allowed_markup_is_valid() {
        let result = AllowListValidator::default()
            .validate(r#"<p>By <a href="https://example.com" title="home">me</a><br/></p>"#);
        assert!(result.is_valid, "{result:?}");
    }

    #[test]
    fn script_tag_is_flagged() {
        let result = AllowListValidator::default().validate("<script>alert(1)</script>");
        assert!(!result.is_valid);
        assert!(result.contains_script);
        assert_eq!(result.invalid_tags, vec!["script"]);
    }

    #[test]
    fn event_handler_attribute_is_script() {
        let result = AllowListValidator::default().validate(r#"<img src="a.jpg" onerror="x()">"#);
        assert!(result.contains_script);
        assert_eq!(result.invalid_attributes, vec!["onerror"]);
    }

    #[test]
    fn javascript_url_is_script() {
        let result = AllowListValidator::default().validate(r#"<a href="javascript:go()">x</a>"#);
        assert!(result.contains_script);
        assert!(!result.is_valid);
        assert!(result.invalid_attributes.is_empty());
    }

    #[test]
    fn unknown_tags_are_listed_once() {
        let result =
            AllowListValidator::default().validate("<marquee>a</marquee><MARQUEE>b</MARQUEE>");
        assert_eq!(result.invalid_tags, vec!["marquee"]);
    }

    #[test]
    fn javascript_can_be_allowed() {
        let validator = AllowListValidator::new(&["a"], &["href", "onclick"], true);
        let result = validator.validate(r#"<a href="/" onclick="go()">x</a>"#);
        assert!(result.contains_script);
        assert!(result.is_valid);
    }
}
