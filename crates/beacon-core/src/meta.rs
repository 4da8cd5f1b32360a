//! Document-level meta fields.
//!
//! A [`MetaFields`] store holds the named values declared in a document
//! header: canonical uppercase names, case-insensitive lookup, last write
//! wins. Reserved names are validated and normalized through a fixed
//! dispatch table; everything else passes through with generic trimming.

use chrono::{Duration, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{BeaconError, BeaconResult};
use crate::uri::is_uri;

/// FORMAT value when none has been declared.
pub const DEFAULT_FORMAT: &str = "BEACON";

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("meta name regex"));

static FORMAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z0-9]*-)?BEACON$").expect("format regex"));

static REVISIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{1,2})(?::(\d{1,2}))?)?$")
        .expect("revisit regex")
});

type Validator = fn(&str) -> BeaconResult<String>;

/// Reserved meta names and their validators, canonical name first.
const RESERVED: &[(&str, Validator)] = &[
    ("FORMAT", validate_format),
    ("PREFIX", validate_prefix),
    ("FEED", validate_feed),
    ("TARGET", validate_target),
    ("REVISIT", validate_revisit),
    ("EXAMPLES", validate_examples),
    ("COUNT", validate_count),
];

fn reserved_validator(name: &str) -> Option<Validator> {
    RESERVED
        .iter()
        .find(|(reserved, _)| *reserved == name)
        .map(|(_, validate)| *validate)
}

/// Store of document-level meta fields.
///
/// Field order is the order of most recent assignment, which
/// [`serialize`](MetaFields::serialize) consumes in reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaFields {
    fields: Vec<(String, String)>,
}

impl MetaFields {
    /// Create a store holding only the default FORMAT.
    pub fn new() -> Self {
        Self {
            fields: vec![("FORMAT".to_string(), DEFAULT_FORMAT.to_string())],
        }
    }

    /// Look up a field value, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        let canonical = name.trim().to_ascii_uppercase();
        self.fields
            .iter()
            .find(|(field, _)| *field == canonical)
            .map(|(_, value)| value.as_str())
    }

    /// Snapshot of every currently-set field. Nothing is synthesized: COUNT
    /// appears only if it was explicitly declared.
    pub fn fields(&self) -> HashMap<String, String> {
        self.fields.iter().cloned().collect()
    }

    /// Set one field.
    ///
    /// The name is trimmed and must match the field-name token grammar;
    /// violations raise [`BeaconError::Argument`]. Reserved names are
    /// validated and normalized; an invalid value raises
    /// [`BeaconError::Validation`]. Unreserved values are trimmed and have
    /// embedded line breaks deleted. An empty normalized value deletes the
    /// field (FORMAT falls back to its default instead).
    pub fn set(&mut self, name: &str, value: &str) -> BeaconResult<()> {
        let name = name.trim();
        if !NAME_REGEX.is_match(name) {
            return Err(BeaconError::argument(name));
        }
        let canonical = name.to_ascii_uppercase();

        let trimmed = value.trim();
        let normalized = if trimmed.is_empty() {
            String::new()
        } else if let Some(validate) = reserved_validator(&canonical) {
            validate(trimmed)?
        } else {
            trimmed
                .chars()
                .filter(|&c| !matches!(c, '\n' | '\r'))
                .collect()
        };

        self.fields.retain(|(field, _)| *field != canonical);
        if normalized.is_empty() {
            if canonical == "FORMAT" {
                self.fields
                    .push(("FORMAT".to_string(), DEFAULT_FORMAT.to_string()));
            }
        } else {
            self.fields.push((canonical, normalized));
        }
        Ok(())
    }

    /// Set several fields, each pair processed independently and in order.
    /// The first failure is returned; pairs before it stay applied.
    pub fn set_all<'a, I>(&mut self, pairs: I) -> BeaconResult<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in pairs {
            self.set(name, value)?;
        }
        Ok(())
    }

    /// Canonical header text.
    ///
    /// `#FORMAT:` first, then every other set field in reverse
    /// most-recent-set order, then a synthesized `#COUNT:` line carrying
    /// `link_count`, the live link counter, never a stored COUNT value.
    pub fn serialize(&self, link_count: u64) -> String {
        let mut out = format!(
            "#FORMAT: {}\n",
            self.get("FORMAT").unwrap_or(DEFAULT_FORMAT)
        );
        for (name, value) in self.fields.iter().rev() {
            if name == "FORMAT" || name == "COUNT" {
                continue;
            }
            out.push_str(&format!("#{name}: {value}\n"));
        }
        out.push_str(&format!("#COUNT: {link_count}\n"));
        out
    }
}

impl Default for MetaFields {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_format(value: &str) -> BeaconResult<String> {
    if FORMAT_REGEX.is_match(value) {
        Ok(value.to_string())
    } else {
        Err(BeaconError::validation("FORMAT", "must end in BEACON"))
    }
}

fn validate_prefix(value: &str) -> BeaconResult<String> {
    if is_uri(value) {
        Ok(value.to_string())
    } else {
        Err(BeaconError::validation("PREFIX", "must be a URI prefix"))
    }
}

fn validate_feed(value: &str) -> BeaconResult<String> {
    if is_uri(value) {
        Ok(value.to_string())
    } else {
        Err(BeaconError::validation("FEED", "must be an absolute URI"))
    }
}

fn validate_target(value: &str) -> BeaconResult<String> {
    if !value.contains("{ID}") && !value.contains("{LABEL}") {
        return Err(BeaconError::validation(
            "TARGET",
            "must contain {ID} or {LABEL}",
        ));
    }
    let probe = value.replace("{ID}", "0").replace("{LABEL}", "0");
    if !is_uri(&probe) {
        return Err(BeaconError::validation(
            "TARGET",
            "does not expand to a valid URI",
        ));
    }
    Ok(value.to_string())
}

/// Normalize to `YYYY-MM-DDTHH:MM:SS`. Calendar overflow in any component
/// rolls forward to the next valid instant instead of being rejected.
fn validate_revisit(value: &str) -> BeaconResult<String> {
    let invalid = || BeaconError::validation("REVISIT", "cannot be parsed as a date/time");
    let caps = REVISIT_REGEX.captures(value).ok_or_else(invalid)?;
    let component = |index: usize| -> i64 {
        caps.get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (year, month, day) = (component(1), component(2), component(3));
    let (hour, minute, second) = (component(4), component(5), component(6));
    if month < 1 || day < 1 {
        return Err(invalid());
    }

    // Roll month overflow into following years, day overflow into following
    // months, time overflow into following days.
    let year = year + (month - 1) / 12;
    let month = (month - 1) % 12 + 1;
    let timestamp = NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
        .and_then(|date| date.checked_add_signed(Duration::days(day - 1)))
        .map(|date| date.and_time(NaiveTime::MIN))
        .and_then(|dt| {
            dt.checked_add_signed(Duration::seconds(hour * 3600 + minute * 60 + second))
        })
        .ok_or_else(invalid)?;
    Ok(timestamp.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn validate_examples(value: &str) -> BeaconResult<String> {
    let ids: Vec<&str> = value
        .split('|')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    Ok(ids.join("|"))
}

fn validate_count(value: &str) -> BeaconResult<String> {
    value
        .parse::<u64>()
        .map(|count| count.to_string())
        .map_err(|_| BeaconError::validation("COUNT", "must be a non-negative integer"))
}
