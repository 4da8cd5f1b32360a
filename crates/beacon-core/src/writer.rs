//! Whole-document serialization.

use crate::link::Link;
use crate::meta::MetaFields;

/// Render a complete document: canonical header (COUNT synthesized from the
/// number of renderable links) followed by one canonical line per link.
/// Links with an empty id render to nothing and are skipped.
pub fn write_document(meta: &MetaFields, links: &[Link]) -> String {
    let rendered: Vec<String> = links
        .iter()
        .map(Link::render)
        .filter(|line| !line.is_empty())
        .collect();
    let mut out = meta.serialize(rendered.len() as u64);
    for line in &rendered {
        out.push_str(line);
        out.push('\n');
    }
    out
}
