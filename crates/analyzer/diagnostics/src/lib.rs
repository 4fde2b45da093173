//! # Diagnostics for the VLS analyzer
//!
//! The semantic core emits structured [`Report`]s through the
//! [`DiagnosticSink`] trait; the language-server shell decides where they go.
//! [`CollectedDiagnostics`] is the in-memory sink used by tests and batch
//! analysis, and [`reporting`] renders reports for terminals.

pub mod reporting;

use std::fmt;

use vls_analyzer_syntax::Range;

/// How serious a report is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notice => write!(f, "notice"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A structured diagnostic emitted by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    pub range: Range,
    pub file_path: String,
}

impl Report {
    pub fn error(message: impl Into<String>, range: Range, file_path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            range,
            file_path: file_path.into(),
        }
    }

    pub fn warning(message: impl Into<String>, range: Range, file_path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range,
            file_path: file_path.into(),
        }
    }

    pub fn notice(message: impl Into<String>, range: Range, file_path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Notice,
            message: message.into(),
            range,
            file_path: file_path.into(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}:{})",
            self.severity, self.message, self.file_path, self.range
        )
    }
}

/// Where the analyzer hands its reports.
pub trait DiagnosticSink {
    fn report(&mut self, report: Report);
}

/// A sink that keeps everything, for tests and batch runs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectedDiagnostics {
    reports: Vec<Report>,
}

impl CollectedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Report] {
        &self.reports
    }

    pub fn errors(&self) -> impl Iterator<Item = &Report> {
        self.reports
            .iter()
            .filter(|r| r.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Report> {
        self.reports
            .iter()
            .filter(|r| r.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    /// Sort by file, then position, then severity (most severe first).
    pub fn sort(&mut self) {
        self.reports.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then(a.range.start_byte.cmp(&b.range.start_byte))
                .then(b.severity.cmp(&a.severity))
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Report> {
        self.reports.iter()
    }
}

impl DiagnosticSink for CollectedDiagnostics {
    fn report(&mut self, report: Report) {
        self.reports.push(report);
    }
}

impl IntoIterator for CollectedDiagnostics {
    type Item = Report;
    type IntoIter = std::vec::IntoIter<Report>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vls_analyzer_syntax::SourceText;

    fn range_of(src: &str, start: usize, end: usize) -> Range {
        SourceText::new(src).range_between(start, end)
    }

    #[test]
    fn collects_and_filters() {
        let src = "fn main() {}\n";
        let mut sink = CollectedDiagnostics::new();
        sink.report(Report::error("unresolved symbol `foo`", range_of(src, 3, 7), "main.vv"));
        sink.report(Report::warning("unused import", range_of(src, 0, 2), "main.vv"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.errors().count(), 1);
        assert_eq!(sink.warnings().count(), 1);
        assert!(sink.has_errors());
    }

    #[test]
    fn sort_orders_by_position() {
        let src = "a := 1\nb := 2\n";
        let mut sink = CollectedDiagnostics::new();
        sink.report(Report::warning("later", range_of(src, 7, 8), "main.vv"));
        sink.report(Report::error("earlier", range_of(src, 0, 1), "main.vv"));
        sink.sort();
        assert_eq!(sink.all()[0].message, "earlier");
    }

    #[test]
    fn display_carries_location() {
        let src = "x := y\n";
        let report = Report::error("unresolved symbol `y`", range_of(src, 5, 6), "main.vv");
        let text = report.to_string();
        assert!(text.contains("error"));
        assert!(text.contains("main.vv"));
        assert!(text.contains("0:5"));
    }
}
