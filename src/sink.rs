//! Append-only log sinks.
//!
//! Every job owns one text file. A run renders all of its lines first and
//! appends them with a single write on a file opened in append mode, so
//! concurrent runs (in this process or another) interleave at line
//! granularity at worst and never inside a line.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single timestamped line destined for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub body: String,
}

impl LogLine {
    /// Create a line. Line breaks in the body are flattened to spaces.
    pub fn new(timestamp: impl Into<String>, body: impl AsRef<str>) -> Self {
        let body = body
            .as_ref()
            .split(['\r', '\n'])
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            timestamp: timestamp.into(),
            body,
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.timestamp, self.body)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open log sink {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write log sink {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An append-only text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `lines`, each newline-terminated. The file is created if
    /// missing and never truncated.
    pub fn append(&self, lines: &[LogLine]) -> Result<(), SinkError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for line in lines {
            buffer.push_str(&line.to_string());
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| SinkError::Open {
                path: self.path.clone(),
                source,
            })?;

        file.write_all(buffer.as_bytes())
            .map_err(|source| SinkError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
