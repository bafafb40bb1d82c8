//! Result reporting
//!
//! The harness hands labeled key/value rows to a [`ReportSink`] and stays
//! agnostic to the output format. Two sinks are provided: an aligned-text
//! reporter for bench-style output and a recording sink for assertions in
//! tests.

use std::fmt;

use serde::Serialize;

/// One reported value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportValue {
    /// Signed integer (problem dimensions, strides)
    Int(i64),
    /// Byte count (workspace sizes)
    Size(usize),
    /// Floating measurement (times, error scalars)
    F64(f64),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Int(v) => write!(f, "{v}"),
            ReportValue::Size(v) => write!(f, "{v}"),
            ReportValue::F64(v) => write!(f, "{v:.6}"),
        }
    }
}

/// Terminal notices for runs that never reach the measurement phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BenchNote {
    /// The kernel rejected the requested size, as demanded
    InvalidSize,
    /// Degenerate size quick-returned success
    QuickReturn,
    /// Pure memory-size query; payload is the required workspace in bytes
    MemQuery(usize),
}

impl fmt::Display for BenchNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchNote::InvalidSize => write!(f, "invalid size arguments"),
            BenchNote::QuickReturn => write!(f, "quick return"),
            BenchNote::MemQuery(bytes) => write!(f, "requires {bytes} bytes of device workspace"),
        }
    }
}

/// Destination for harness results
pub trait ReportSink {
    /// Record a terminal notice
    fn note(&mut self, note: BenchNote);

    /// Start a labeled section ("Arguments:", "Results:")
    fn header(&mut self, title: &str);

    /// Emit one row of labeled values
    fn output(&mut self, pairs: &[(&str, ReportValue)]);
}

// ============================================================================
// Text reporter
// ============================================================================

/// Aligned-text sink, buffering rows as two lines: names then values
#[derive(Debug, Default)]
pub struct TextReporter {
    buf: String,
}

impl TextReporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered output so far
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl fmt::Display for TextReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl ReportSink for TextReporter {
    fn note(&mut self, note: BenchNote) {
        self.buf.push_str(&format!("{note}\n"));
    }

    fn header(&mut self, title: &str) {
        self.buf.push_str(title);
        self.buf.push('\n');
    }

    fn output(&mut self, pairs: &[(&str, ReportValue)]) {
        let mut names = String::new();
        let mut values = String::new();
        for (name, value) in pairs {
            let value = value.to_string();
            let width = name.len().max(value.len()) + 2;
            names.push_str(&format!("{name:>width$}"));
            values.push_str(&format!("{value:>width$}"));
        }
        self.buf.push_str(&names);
        self.buf.push('\n');
        self.buf.push_str(&values);
        self.buf.push('\n');
    }
}

// ============================================================================
// Recording reporter
// ============================================================================

/// Sink that records everything it receives, for test assertions
#[derive(Debug, Default)]
pub struct RecordingReporter {
    /// Notices in arrival order
    pub notes: Vec<BenchNote>,
    /// Section headers in arrival order
    pub headers: Vec<String>,
    /// Rows in arrival order
    pub rows: Vec<Vec<(String, ReportValue)>>,
}

impl RecordingReporter {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the last reported value for `name`, searching newest rows first
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ReportValue> {
        self.rows
            .iter()
            .rev()
            .flat_map(|row| row.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl ReportSink for RecordingReporter {
    fn note(&mut self, note: BenchNote) {
        self.notes.push(note);
    }

    fn header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn output(&mut self, pairs: &[(&str, ReportValue)]) {
        self.rows.push(
            pairs
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
