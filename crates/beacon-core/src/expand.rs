//! Link expansion against a cached meta snapshot.
//!
//! An [`ExpansionPlan`] captures PREFIX, TARGET, COUNT and EXAMPLES from a
//! [`MetaFields`] store once, at the header-to-body transition. Every link
//! of the pass expands against that snapshot, so later meta mutation has no
//! effect on an iteration already under way.

use serde::{Deserialize, Serialize};

use crate::link::{ExpandedLink, Link};
use crate::meta::MetaFields;
use crate::uri::escape_label;

/// Immutable snapshot of the expansion-relevant meta fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionPlan {
    prefix: Option<String>,
    target: Option<String>,
    declared_count: Option<u64>,
    declared_examples: Vec<String>,
}

impl ExpansionPlan {
    /// Capture the current state of `meta`.
    pub fn from_meta(meta: &MetaFields) -> Self {
        Self {
            prefix: meta.get("PREFIX").map(String::from),
            target: meta.get("TARGET").map(String::from),
            declared_count: meta.get("COUNT").and_then(|count| count.parse().ok()),
            declared_examples: meta
                .get("EXAMPLES")
                .map(|ids| ids.split('|').map(String::from).collect())
                .unwrap_or_default(),
        }
    }

    /// Whether a TARGET template was declared.
    pub fn has_target_template(&self) -> bool {
        self.target.is_some()
    }

    /// Declared COUNT, if any.
    pub fn declared_count(&self) -> Option<u64> {
        self.declared_count
    }

    /// Declared EXAMPLES ids, possibly empty.
    pub fn declared_examples(&self) -> &[String] {
        &self.declared_examples
    }

    /// Identifier after PREFIX expansion: `PREFIX ⧺ id`, or `id` alone.
    pub fn full_id(&self, id: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{id}"),
            None => id.to_string(),
        }
    }

    /// Expand a raw link.
    ///
    /// A declared TARGET template has every `{ID}` replaced by the raw id
    /// and every `{LABEL}` by the escaped label, and takes precedence over
    /// an explicit per-line target. Without a template the explicit target
    /// (possibly empty) passes through.
    pub fn expand(&self, link: &Link) -> ExpandedLink {
        let full_target = match &self.target {
            Some(template) => template
                .replace("{ID}", &link.id)
                .replace("{LABEL}", &escape_label(&link.label)),
            None => link.target.clone(),
        };
        ExpandedLink {
            id: link.id.clone(),
            label: link.label.clone(),
            description: link.description.clone(),
            target: link.target.clone(),
            full_id: self.full_id(&link.id),
            full_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(pairs: &[(&str, &str)]) -> ExpansionPlan {
        let mut meta = MetaFields::new();
        meta.set_all(pairs.iter().copied()).unwrap();
        ExpansionPlan::from_meta(&meta)
    }

    #[test]
    fn test_prefix_expansion() {
        let plan = plan(&[("PREFIX", "http://example.org/")]);
        let link = Link::new("123", "", "", "");
        let expanded = plan.expand(&link);
        assert_eq!(expanded.full_id, "http://example.org/123");
        assert_eq!(expanded.full_target, "");
    }

    #[test]
    fn test_no_prefix_keeps_id() {
        let plan = ExpansionPlan::from_meta(&MetaFields::new());
        assert_eq!(plan.full_id("id:1"), "id:1");
    }

    #[test]
    fn test_template_substitution() {
        let plan = plan(&[("TARGET", "http://example.org/{ID}?l={LABEL}")]);
        let link = Link::new("42", "a label", "", "");
        let expanded = plan.expand(&link);
        assert_eq!(
            expanded.full_target,
            "http://example.org/42?l=a%20label"
        );
    }

    #[test]
    fn test_template_overrides_explicit_target() {
        let plan = plan(&[("TARGET", "f:{ID}")]);
        let link = Link::new("a:b", "", "", "x:y");
        let expanded = plan.expand(&link);
        assert_eq!(expanded.full_target, "f:a:b");
        assert_eq!(expanded.target, "x:y");
    }

    #[test]
    fn test_explicit_target_without_template() {
        let plan = ExpansionPlan::from_meta(&MetaFields::new());
        let link = Link::new("a:b", "", "", "x:y");
        assert_eq!(plan.expand(&link).full_target, "x:y");
    }

    #[test]
    fn test_label_keeps_uri_reserved_characters() {
        let plan = plan(&[("TARGET", "f:{LABEL}")]);
        let link = Link::new("a:b", "c:d", "", "");
        assert_eq!(plan.expand(&link).full_target, "f:c:d");
    }

    #[test]
    fn test_declared_count_and_examples() {
        let plan = plan(&[("COUNT", "12"), ("EXAMPLES", "a:b|c")]);
        assert_eq!(plan.declared_count(), Some(12));
        assert_eq!(plan.declared_examples(), ["a:b", "c"]);
    }
}
