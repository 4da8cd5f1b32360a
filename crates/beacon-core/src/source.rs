//! Line sources: the injected "produce next line or end" capability.
//!
//! A [`LineSource`] wraps a file path, an in-memory buffer, or a
//! caller-supplied pull closure behind one contract, so the reader never
//! special-cases where its lines come from. Files open lazily on the first
//! pull; any fault is returned as a value for the reader to record, never
//! propagated.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Closure form of a line source: `Ok(Some(line))`, `Ok(None)` for end of
/// input, or `Err` for a fault the reader records and recovers from.
pub type PullFn = Box<dyn FnMut() -> anyhow::Result<Option<String>>>;

/// A bound input yielding successive raw lines.
pub struct LineSource {
    inner: Inner,
}

enum Inner {
    File { path: PathBuf, state: FileState },
    Buffer(std::vec::IntoIter<String>),
    Callable(PullFn),
}

enum FileState {
    Unopened,
    Open(Lines<BufReader<File>>),
    Done,
}

/// A failed pull. Fatal faults exhaust the source (a file that cannot be
/// opened or read); non-fatal faults leave it pullable (a closure that
/// failed once).
pub(crate) struct SourceFault {
    pub message: String,
    pub fatal: bool,
}

impl LineSource {
    /// Source backed by a file, opened on first pull.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Inner::File {
                path: path.into(),
                state: FileState::Unopened,
            },
        }
    }

    /// Source backed by an in-memory text buffer.
    pub fn from_buffer(text: impl AsRef<str>) -> Self {
        let lines: Vec<String> = text.as_ref().lines().map(String::from).collect();
        Self {
            inner: Inner::Buffer(lines.into_iter()),
        }
    }

    /// Source backed by a zero-argument pull closure.
    pub fn from_fn(pull: impl FnMut() -> anyhow::Result<Option<String>> + 'static) -> Self {
        Self {
            inner: Inner::Callable(Box::new(pull)),
        }
    }

    /// Produce the next raw line, `None` at end of input.
    pub(crate) fn pull(&mut self) -> Result<Option<String>, SourceFault> {
        match &mut self.inner {
            Inner::Buffer(lines) => Ok(lines.next()),
            Inner::Callable(pull) => pull().map_err(|err| SourceFault {
                message: format!("Failed to read line source: {err}"),
                fatal: false,
            }),
            Inner::File { path, state } => loop {
                match state {
                    FileState::Unopened => match File::open(path.as_path()) {
                        Ok(file) => {
                            *state = FileState::Open(BufReader::new(file).lines());
                        }
                        Err(_) => {
                            *state = FileState::Done;
                            return Err(SourceFault {
                                message: format!("Failed to open {}", path.display()),
                                fatal: true,
                            });
                        }
                    },
                    FileState::Open(lines) => match lines.next() {
                        Some(Ok(line)) => return Ok(Some(line)),
                        Some(Err(err)) => {
                            let message = format!("Failed to read {}: {err}", path.display());
                            *state = FileState::Done;
                            return Err(SourceFault {
                                message,
                                fatal: true,
                            });
                        }
                        None => {
                            *state = FileState::Done;
                            return Ok(None);
                        }
                    },
                    FileState::Done => return Ok(None),
                }
            },
        }
    }
}

impl From<&str> for LineSource {
    fn from(text: &str) -> Self {
        Self::from_buffer(text)
    }
}

impl From<String> for LineSource {
    fn from(text: String) -> Self {
        Self::from_buffer(text)
    }
}

impl From<&Path> for LineSource {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

impl From<PathBuf> for LineSource {
    fn from(path: PathBuf) -> Self {
        Self::from_path(path)
    }
}
