//! The pull-based reader state machine.
//!
//! A [`BeaconReader`] drives one pass over a bound [`LineSource`]:
//! Header → Body → Done. Header lines populate the meta store; the first
//! body-shaped line freezes an [`ExpansionPlan`] snapshot and every
//! subsequent link expands against it. Malformed lines are recorded and
//! skipped, never fatal; the deferred COUNT and EXAMPLES checks run exactly
//! once, when the source is exhausted.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{RecordedError, RecordedErrorKind};
use crate::expand::ExpansionPlan;
use crate::link::{parse_line, ExpandedLink, LineOutcome};
use crate::meta::MetaFields;
use crate::source::LineSource;
use crate::uri::is_uri;

/// Callback invoked for every link produced by [`BeaconReader::parse`].
pub type LinkHandler = Box<dyn FnMut(&ExpandedLink) -> anyhow::Result<()>>;

/// Callback invoked for every recorded error.
pub type ErrorHandler = Box<dyn FnMut(&RecordedError) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Body,
    Done,
}

/// Single-pass pull reader over a link-dump stream.
pub struct BeaconReader {
    source: LineSource,
    meta: MetaFields,
    plan: ExpansionPlan,
    phase: Phase,
    /// First body-shaped line, met while scanning the header
    pending: Option<String>,
    /// BOM stripping still owed to the first line
    at_start: bool,
    line: u64,
    link_count: u64,
    error_count: u64,
    last_error: Option<RecordedError>,
    last_link: Option<ExpandedLink>,
    /// Raw and expanded ids of produced links; only filled while an
    /// EXAMPLES declaration needs checking
    seen_ids: HashSet<String>,
    on_link: Option<LinkHandler>,
    on_error: Option<ErrorHandler>,
}

impl BeaconReader {
    /// Bind a source: a path, an in-memory buffer, or a pull closure.
    pub fn new(source: impl Into<LineSource>) -> Self {
        Self {
            source: source.into(),
            meta: MetaFields::new(),
            plan: ExpansionPlan::default(),
            phase: Phase::Header,
            pending: None,
            at_start: true,
            line: 0,
            link_count: 0,
            error_count: 0,
            last_error: None,
            last_link: None,
            seen_ids: HashSet::new(),
            on_link: None,
            on_error: None,
        }
    }

    /// Reader over a file, opened lazily on the first read.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(LineSource::from_path(path))
    }

    /// Reader over a caller-supplied pull closure.
    pub fn from_fn(pull: impl FnMut() -> anyhow::Result<Option<String>> + 'static) -> Self {
        Self::new(LineSource::from_fn(pull))
    }

    /// Register a callback for every link produced by [`parse`](Self::parse).
    /// A failing handler is recorded and the pass continues.
    pub fn with_link_handler(
        mut self,
        handler: impl FnMut(&ExpandedLink) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.on_link = Some(Box::new(handler));
        self
    }

    /// Register a callback for every recorded error.
    pub fn with_error_handler(
        mut self,
        handler: impl FnMut(&RecordedError) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Rebind to a fresh source, discarding the previous pass's cursor:
    /// meta store back to defaults, counters zeroed, phase back to Header.
    /// The error count and last error persist across passes.
    pub fn bind(&mut self, source: impl Into<LineSource>) {
        self.source = source.into();
        self.meta = MetaFields::new();
        self.plan = ExpansionPlan::default();
        self.phase = Phase::Header;
        self.pending = None;
        self.at_start = true;
        self.line = 0;
        self.link_count = 0;
        self.last_link = None;
        self.seen_ids.clear();
    }

    /// Pull the next link.
    ///
    /// Scans the header on first use. Blank and comment-shaped lines are
    /// skipped silently; malformed lines and non-URI ids are recorded and
    /// skipped. Returns `None` once the source is exhausted; the first
    /// exhaustion runs the deferred COUNT and EXAMPLES checks.
    pub fn next_link(&mut self) -> Option<ExpandedLink> {
        if self.phase == Phase::Header {
            self.scan_header();
        }
        if self.phase == Phase::Done {
            return None;
        }
        loop {
            let raw = match self.pending.take().or_else(|| self.pull_line()) {
                Some(line) => line,
                None => {
                    self.finish();
                    return None;
                }
            };
            if raw.trim_start().starts_with('#') {
                continue;
            }
            match parse_line(&raw, self.plan.has_target_template()) {
                LineOutcome::Blank => continue,
                LineOutcome::Malformed(message) => {
                    let err =
                        RecordedError::new(RecordedErrorKind::Parse, message, self.line, raw);
                    self.record(err);
                }
                LineOutcome::Link(link) => {
                    if !is_uri(&self.plan.full_id(&link.id)) {
                        let err = RecordedError::new(
                            RecordedErrorKind::Parse,
                            "link id must be URI",
                            self.line,
                            raw,
                        );
                        self.record(err);
                        continue;
                    }
                    let expanded = self.plan.expand(&link);
                    self.link_count += 1;
                    if !self.plan.declared_examples().is_empty() {
                        self.seen_ids.insert(expanded.full_id.clone());
                        self.seen_ids.insert(expanded.id.clone());
                    }
                    self.last_link = Some(expanded.clone());
                    return Some(expanded);
                }
            }
        }
    }

    /// Drain the stream, dispatching links to the registered handler.
    ///
    /// Returns `true` iff the error count did not increase during the call.
    pub fn parse(&mut self) -> bool {
        let before = self.error_count;
        while let Some(link) = self.next_link() {
            if let Some(handler) = self.on_link.as_mut() {
                if let Err(err) = handler(&link) {
                    let died = RecordedError::new(
                        RecordedErrorKind::Handler,
                        format!("link handler died: {err}"),
                        self.line,
                        "",
                    );
                    self.record(died);
                }
            }
        }
        self.error_count == before
    }

    /// Rebind to `source` and drain it; see [`parse`](Self::parse).
    pub fn parse_from(&mut self, source: impl Into<LineSource>) -> bool {
        self.bind(source);
        self.parse()
    }

    /// The current meta fields.
    pub fn meta(&self) -> &MetaFields {
        &self.meta
    }

    /// Declared COUNT if one was set, else the number of links produced so
    /// far.
    pub fn count(&self) -> u64 {
        self.meta
            .get("COUNT")
            .and_then(|count| count.parse().ok())
            .unwrap_or(self.link_count)
    }

    /// Physical lines read so far, blanks included.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Errors recorded so far, across every pass of this reader.
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// The most recently recorded error.
    pub fn last_error(&self) -> Option<&RecordedError> {
        self.last_error.as_ref()
    }

    /// The last successfully produced link.
    pub fn last_link(&self) -> Option<&ExpandedLink> {
        self.last_link.as_ref()
    }

    /// Canonical header text with the live link counter as COUNT.
    pub fn serialize(&self) -> String {
        self.meta.serialize(self.link_count)
    }

    /// Consume header lines until the first body-shaped line, which is
    /// buffered for the first [`next_link`](Self::next_link) call, then
    /// freeze the expansion snapshot.
    fn scan_header(&mut self) {
        loop {
            let Some(line) = self.pull_line() else {
                break;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix('#') {
                match rest.split_once(':') {
                    Some((name, value)) => {
                        if let Err(err) = self.meta.set(name, value) {
                            let recorded = RecordedError::new(
                                RecordedErrorKind::Validation,
                                err.to_string(),
                                self.line,
                                line.as_str(),
                            );
                            self.record(recorded);
                        }
                    }
                    None => {
                        let recorded = RecordedError::new(
                            RecordedErrorKind::Validation,
                            "malformed meta line, expected '#NAME: value'",
                            self.line,
                            line.as_str(),
                        );
                        self.record(recorded);
                    }
                }
            } else {
                self.pending = Some(line);
                break;
            }
        }
        self.plan = ExpansionPlan::from_meta(&self.meta);
        self.phase = Phase::Body;
    }

    /// Pull one physical line, counting it and stripping a leading BOM at
    /// stream start. Source faults are recorded here; a fatal fault
    /// exhausts the stream, a non-fatal one skips to the next pull.
    fn pull_line(&mut self) -> Option<String> {
        loop {
            match self.source.pull() {
                Ok(Some(mut line)) => {
                    self.line += 1;
                    if self.at_start {
                        self.at_start = false;
                        if let Some(stripped) = line.strip_prefix('\u{feff}') {
                            line = stripped.to_string();
                        }
                    }
                    return Some(line);
                }
                Ok(None) => return None,
                Err(fault) => {
                    let fatal = fault.fatal;
                    let recorded = RecordedError::new(
                        RecordedErrorKind::Source,
                        fault.message,
                        self.line,
                        "",
                    );
                    self.record(recorded);
                    if fatal {
                        return None;
                    }
                }
            }
        }
    }

    /// Deferred whole-document checks, run once at first exhaustion.
    fn finish(&mut self) {
        self.phase = Phase::Done;
        if let Some(declared) = self.plan.declared_count() {
            if declared != self.link_count {
                let err = RecordedError::new(
                    RecordedErrorKind::Consistency,
                    format!("expected {declared} links, but got {}", self.link_count),
                    self.line,
                    "",
                );
                self.record(err);
            }
        }
        for example in self.plan.declared_examples().to_vec() {
            let expanded = self.plan.full_id(&example);
            if self.seen_ids.contains(&expanded) || self.seen_ids.contains(&example) {
                continue;
            }
            let err = RecordedError::new(
                RecordedErrorKind::Consistency,
                format!("examples not found: {example}"),
                self.line,
                "",
            );
            self.record(err);
            break;
        }
    }

    /// Record a recovered error and notify the error handler. A failing
    /// error handler is recorded in turn, without re-entering it.
    fn record(&mut self, err: RecordedError) {
        self.error_count += 1;
        match err.kind {
            RecordedErrorKind::Consistency | RecordedErrorKind::Handler => {
                tracing::warn!(line = err.line, "{}", err.message);
            }
            _ => {
                tracing::debug!(line = err.line, "{}", err.message);
            }
        }
        self.last_error = Some(err.clone());
        if let Some(handler) = self.on_error.as_mut() {
            if let Err(handler_err) = handler(&err) {
                let died = RecordedError::new(
                    RecordedErrorKind::Handler,
                    format!("error handler died: {handler_err}"),
                    self.line,
                    "",
                );
                self.error_count += 1;
                tracing::warn!(line = died.line, "{}", died.message);
                self.last_error = Some(died);
            }
        }
    }
}

impl Iterator for BeaconReader {
    type Item = ExpandedLink;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_link()
    }
}
