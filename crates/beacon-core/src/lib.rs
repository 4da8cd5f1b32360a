//! BEACON link-dump engine
//!
//! A parsing, validation, and serialization engine for the line-oriented
//! BEACON link-dump format: a header of named meta fields followed by a
//! body of short per-line link records. This crate provides:
//! - Meta-field storage with per-field validation and normalization
//! - A per-line link parser with skip-and-continue error recovery
//! - Link expansion from declared PREFIX and TARGET meta fields
//! - A pull-based single-pass reader with deferred whole-document checks
//!
//! ```
//! use beacon_core::BeaconReader;
//!
//! let mut reader = BeaconReader::new("#PREFIX: http://example.org/\nabc|t:1\n");
//! let link = reader.next_link().unwrap();
//! assert_eq!(link.full_id, "http://example.org/abc");
//! assert_eq!(link.full_target, "t:1");
//! ```

pub mod error;
pub mod expand;
pub mod link;
pub mod meta;
pub mod reader;
pub mod source;
pub mod uri;
pub mod writer;

// Re-export main types for convenience
pub use error::{BeaconError, BeaconResult, RecordedError, RecordedErrorKind};
pub use expand::ExpansionPlan;
pub use link::{parse_line, render, ExpandedLink, Link, LineOutcome};
pub use meta::{MetaFields, DEFAULT_FORMAT};
pub use reader::{BeaconReader, ErrorHandler, LinkHandler};
pub use source::LineSource;
pub use writer::write_document;
