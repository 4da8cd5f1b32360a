//! Link records and the body-line parser.
//!
//! A body line carries up to four `|`-separated fields. Parsing yields a
//! [`LineOutcome`]: a structured [`Link`], a silently-skipped blank, or a
//! malformed-line message for the reader to record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::uri::is_uri;

pub(crate) const TOO_MANY_PARTS: &str = "found too many parts (>4), divided by '|' characters";
pub(crate) const BAD_TARGET_URI: &str = "URI part has not valid URI form";

/// Raw link record as written on a body line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source identifier, mandatory
    pub id: String,
    /// Optional display label
    pub label: String,
    /// Optional description
    pub description: String,
    /// Optional explicit target URI
    pub target: String,
}

impl Link {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            target: target.into(),
        }
    }

    /// Canonical line form, see [`render`].
    pub fn render(&self) -> String {
        render(&self.id, &self.label, &self.description, &self.target)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A link expanded against the document's meta snapshot; the unit returned
/// to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedLink {
    /// Source identifier as written
    pub id: String,
    /// Display label as written
    pub label: String,
    /// Description as written
    pub description: String,
    /// Explicit per-line target, before template precedence
    pub target: String,
    /// Identifier after PREFIX expansion
    pub full_id: String,
    /// Target after template substitution or explicit override
    pub full_target: String,
}

impl ExpandedLink {
    /// The raw four-field record this expansion was derived from.
    pub fn as_link(&self) -> Link {
        Link::new(&self.id, &self.label, &self.description, &self.target)
    }
}

impl fmt::Display for ExpandedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            render(&self.id, &self.label, &self.description, &self.target)
        )
    }
}

/// Result of parsing one physical body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A well-formed link record
    Link(Link),
    /// Empty, whitespace-only, or empty-id line; skipped silently
    Blank,
    /// Malformed line with the reason; recorded and skipped
    Malformed(String),
}

/// Parse one raw body line.
///
/// The line is split on `|` into at most four trimmed parts; trailing empty
/// parts are dropped. When no TARGET template is declared
/// (`has_target_template` false), a final URI-shaped part is taken as the
/// per-line target even in second or third position; with a template
/// declared that heuristic is off and parts bind positionally, since the
/// template supplies every target. A four-part line's last field must be a
/// URI in either mode.
pub fn parse_line(raw: &str, has_target_template: bool) -> LineOutcome {
    let line = raw.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    let mut parts: Vec<&str> = line.split('|').map(str::trim).collect();
    while parts.len() > 1 && parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.len() > 4 {
        return LineOutcome::Malformed(TOO_MANY_PARTS.to_string());
    }
    if parts[0].is_empty() {
        return LineOutcome::Blank;
    }

    let id = parts[0];
    let mut rest: Vec<&str> = parts[1..].to_vec();
    let mut target = "";
    if rest.len() == 3 {
        match rest.pop() {
            Some(last) if is_uri(last) => target = last,
            _ => return LineOutcome::Malformed(BAD_TARGET_URI.to_string()),
        }
    } else if !has_target_template {
        if let Some(last) = rest.last().copied() {
            if is_uri(last) {
                target = last;
                rest.pop();
            }
        }
    }

    LineOutcome::Link(Link::new(
        id,
        rest.first().copied().unwrap_or(""),
        rest.get(1).copied().unwrap_or(""),
        target,
    ))
}

/// Render a link as its minimal canonical line.
///
/// Non-empty fields join with `|`; trailing empty fields are omitted, and an
/// empty description collapses when a target follows so that parsing the
/// result reproduces the same record. An empty id renders as `""`.
pub fn render(id: &str, label: &str, description: &str, target: &str) -> String {
    if id.trim().is_empty() {
        return String::new();
    }
    let mut parts = vec![id];
    if !target.is_empty() {
        if !label.is_empty() || !description.is_empty() {
            parts.push(label);
        }
        if !description.is_empty() {
            parts.push(description);
        }
        parts.push(target);
    } else {
        parts.push(label);
        parts.push(description);
        while parts.len() > 1 && parts.last().is_some_and(|part| part.is_empty()) {
            parts.pop();
        }
    }
    parts.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(raw: &str) -> Link {
        match parse_line(raw, false) {
            LineOutcome::Link(link) => link,
            other => panic!("expected link from {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_uri_becomes_target() {
        assert_eq!(link("qid|lab|u:ri"), Link::new("qid", "lab", "", "u:ri"));
        assert_eq!(link("id:1|t:1"), Link::new("id:1", "", "", "t:1"));
        assert_eq!(
            link("qid|lab|dsc|u:ri"),
            Link::new("qid", "lab", "dsc", "u:ri")
        );
    }

    #[test]
    fn test_positional_without_uri() {
        assert_eq!(link("qid"), Link::new("qid", "", "", ""));
        assert_eq!(link("qid|lab"), Link::new("qid", "lab", "", ""));
        assert_eq!(link("qid|lab|dsc"), Link::new("qid", "lab", "dsc", ""));
    }

    #[test]
    fn test_template_disables_target_heuristic() {
        match parse_line("a:b|c:d", true) {
            LineOutcome::Link(link) => {
                assert_eq!(link, Link::new("a:b", "c:d", "", ""));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_too_many_parts() {
        assert_eq!(
            parse_line("qid|lab|dsc|u:ri|foo", false),
            LineOutcome::Malformed(TOO_MANY_PARTS.to_string())
        );
    }

    #[test]
    fn test_fourth_part_must_be_uri() {
        assert_eq!(
            parse_line("qid|lab|dsc|abc", false),
            LineOutcome::Malformed(BAD_TARGET_URI.to_string())
        );
        assert_eq!(
            parse_line("qid|lab|dsc|abc", true),
            LineOutcome::Malformed(BAD_TARGET_URI.to_string())
        );
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(parse_line("", false), LineOutcome::Blank);
        assert_eq!(parse_line("   \t ", false), LineOutcome::Blank);
        assert_eq!(parse_line("|comment", false), LineOutcome::Blank);
        assert_eq!(parse_line(" | x | y", false), LineOutcome::Blank);
    }

    #[test]
    fn test_trailing_empty_parts_dropped() {
        assert_eq!(link("qid|lab|"), Link::new("qid", "lab", "", ""));
        assert_eq!(link("qid||"), Link::new("qid", "", "", ""));
    }

    #[test]
    fn test_fields_are_trimmed() {
        assert_eq!(
            link(" qid | lab | dsc "),
            Link::new("qid", "lab", "dsc", "")
        );
    }

    #[test]
    fn test_render_minimal_form() {
        assert_eq!(render("a", "", "", ""), "a");
        assert_eq!(render("a", "l", "", ""), "a|l");
        assert_eq!(render("a", "l", "d", ""), "a|l|d");
        assert_eq!(render("a", "", "d", ""), "a||d");
        assert_eq!(render("a", "", "", "t:x"), "a|t:x");
        assert_eq!(render("a", "l", "", "t:x"), "a|l|t:x");
        assert_eq!(render("a", "l", "d", "t:x"), "a|l|d|t:x");
        assert_eq!(render("", "l", "d", "t:x"), "");
    }

    #[test]
    fn test_render_parse_round_trip() {
        for line in [
            "qid",
            "qid|lab",
            "qid|lab|dsc",
            "qid|lab|u:ri",
            "qid|lab|dsc|u:ri",
            "id:1|t:1",
        ] {
            assert_eq!(link(line).render(), line, "round trip of {line:?}");
        }
    }
}
