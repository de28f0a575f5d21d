//! Diagnostics sink for recoverable import conditions.
//!
//! Everything pushed here is also emitted as a `tracing` event at the matching
//! level, so a subscriber and the caller see the same stream.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// 1-based input line, when the condition is tied to a row.
    pub row: Option<usize>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{} (row {}): {}", self.severity, row, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Ordered list of diagnostics collected during one import.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>, row: Option<usize>) {
        let message = message.into();
        match (severity, row) {
            (Severity::Error, Some(row)) => tracing::error!(row, "{}", message),
            (Severity::Error, None) => tracing::error!("{}", message),
            (Severity::Warning, Some(row)) => tracing::warn!(row, "{}", message),
            (Severity::Warning, None) => tracing::warn!("{}", message),
            (Severity::Info, Some(row)) => tracing::info!(row, "{}", message),
            (Severity::Info, None) => tracing::info!("{}", message),
        }
        self.entries.push(Diagnostic {
            severity,
            message,
            row,
        });
    }

    pub fn error(&mut self, message: impl Into<String>, row: Option<usize>) {
        self.push(Severity::Error, message, row);
    }

    pub fn warn(&mut self, message: impl Into<String>, row: Option<usize>) {
        self.push(Severity::Warning, message, row);
    }

    pub fn info(&mut self, message: impl Into<String>, row: Option<usize>) {
        self.push(Severity::Info, message, row);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    /// True if any entry is at or above `severity`.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.entries.iter().any(|d| d.severity >= severity)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_keep_order_and_counts() {
        let mut diags = Diagnostics::new();
        diags.warn("first", Some(3));
        diags.error("second", None);
        diags.info("third", Some(10));

        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(diags.count(Severity::Warning), 1);
        assert_eq!(diags.count(Severity::Error), 1);
        assert!(diags.has_at_least(Severity::Warning));
    }

    #[test]
    fn test_has_at_least_respects_ordering() {
        let mut diags = Diagnostics::new();
        diags.info("note", None);
        assert!(!diags.has_at_least(Severity::Warning));
        assert!(diags.has_at_least(Severity::Info));
    }

    #[test]
    fn test_diagnostic_display_includes_row() {
        let d = Diagnostic {
            severity: Severity::Warning,
            message: "row length mismatch".to_string(),
            row: Some(7),
        };
        assert_eq!(d.to_string(), "warning (row 7): row length mismatch");
    }
}
