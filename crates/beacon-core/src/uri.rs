//! Syntactic URI checks shared by meta-field validation and link parsing.
//!
//! The format only ever needs a syntactic answer (does this string have the
//! shape of an absolute URI), so the check is a compiled RFC 3986
//! scheme-plus-body pattern, not a full resolver.

use regex::Regex;
use std::sync::LazyLock;

static URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z][a-zA-Z0-9+.-]*:[^\s"<>\\^`{}|]*$"#).expect("uri regex")
});

/// Whether `value` is syntactically an absolute URI (scheme, colon, body
/// free of whitespace and URI-illegal characters).
pub fn is_uri(value: &str) -> bool {
    URI_REGEX.is_match(value)
}

/// Characters beyond ASCII alphanumerics that may stand unescaped in a
/// substituted `{LABEL}`: the RFC 3986 sub-delims plus `:@/?-_.~`.
const LABEL_SAFE: &str = "!$&'()*+,;=:@/?-_.~";

/// Escape a label for substitution into a target template.
///
/// URI-reserved characters are kept intact so a label like `c:d` survives
/// substitution verbatim; everything else is percent-encoded.
pub fn escape_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut buf = [0u8; 4];
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() || LABEL_SAFE.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}
