//! Diagnostics collection for pipeline execution.
//!
//! This module provides types for collecting and reporting diagnostic messages
//! while a script is being decompiled. The pipeline is deliberately lenient:
//! a strategy that throws, a jump that cannot be resolved, or a liveness run
//! that hits its iteration cap must all degrade to placeholder or best-effort
//! results rather than aborting the request. The conditions themselves are
//! still worth reporting, and this container is where they land.
//!
//! # Architecture
//!
//! The diagnostics container is shared across the pipeline with [`std::sync::Arc`]:
//! - **Extraction cascade**: reports per-strategy soft failures and total extraction failure
//! - **Dataflow analyzer**: reports non-convergence when the iteration cap is reached
//! - **Reconstructor**: reports unresolvable jump targets
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for lock-free append
//! operations, so diagnostics can be collected without synchronization overhead
//! even when a pipeline instance is shared.
//!
//! # Usage Examples
//!
//! ```rust
//! use scriptscope::diagnostics::{Diagnostics, DiagnosticCategory};
//! use std::sync::Arc;
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//!
//! diagnostics.warning(
//!     DiagnosticCategory::Extraction,
//!     "pattern strategy produced no instructions",
//! );
//!
//! if diagnostics.has_warnings() {
//!     for entry in diagnostics.iter() {
//!         println!("[{}] {}: {}", entry.severity, entry.category, entry.message);
//!     }
//! }
//! ```

use std::fmt;

/// Severity level of a diagnostic entry.
///
/// Determines how the diagnostic should be treated and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for noting which strategy was skipped or which produced the result.
    Info,

    /// Warning about a degraded result.
    ///
    /// The pipeline continued, but some data may be approximate: a strategy
    /// failed softly, a jump target could not be resolved, or liveness did
    /// not fully converge.
    Warning,

    /// Error indicating a stage could produce no result at all.
    ///
    /// The pipeline still does not abort; the caller receives an empty or
    /// placeholder result alongside this entry.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating which pipeline stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Issues inside the extraction cascade.
    ///
    /// Examples: a strategy threw, all strategies exhausted.
    Extraction,

    /// Issues while synthesizing instructions from text.
    ///
    /// Examples: nesting depth limit reached, unusable numeric literal.
    Synthesis,

    /// Issues while building the control flow graph.
    ///
    /// Examples: jump target outside the instruction sequence.
    ControlFlow,

    /// Issues during data flow analysis.
    ///
    /// Examples: iteration cap reached before the fixed point.
    DataFlow,

    /// Issues during source reconstruction.
    ///
    /// Examples: jump emitted without a resolvable label.
    Reconstruction,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Extraction => write!(f, "Extraction"),
            DiagnosticCategory::Synthesis => write!(f, "Synthesis"),
            DiagnosticCategory::ControlFlow => write!(f, "ControlFlow"),
            DiagnosticCategory::DataFlow => write!(f, "DataFlow"),
            DiagnosticCategory::Reconstruction => write!(f, "Reconstruction"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the pipeline stage that reported this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the condition.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Pipeline stage that reported it
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)
    }
}

/// Thread-safe, append-only container for diagnostic entries.
///
/// Entries are retained for the lifetime of the container and iterated in
/// insertion order. All mutation is append-only, so shared references are
/// sufficient everywhere the container is used.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates a new, empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Records an informational entry.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.entries
            .push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Records a warning entry.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.entries.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Records an error entry.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.entries.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Returns the total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if no entries have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Returns `true` if any entry has [`DiagnosticSeverity::Warning`] severity.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Returns `true` if any entry has [`DiagnosticSeverity::Error`] severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns the number of warning entries.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Returns the number of error entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Iterates over all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Iterates over entries from a single category.
    pub fn by_category(
        &self,
        category: DiagnosticCategory,
    ) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.iter().filter(move |d| d.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_container() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        assert_eq!(diagnostics.len(), 0);
        assert!(!diagnostics.has_warnings());
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_severity_counts() {
        let diagnostics = Diagnostics::new();
        diagnostics.info(DiagnosticCategory::Extraction, "picked tokenize strategy");
        diagnostics.warning(DiagnosticCategory::DataFlow, "iteration cap reached");
        diagnostics.warning(DiagnosticCategory::ControlFlow, "dangling jump target");
        diagnostics.error(DiagnosticCategory::Extraction, "no instructions available");

        assert_eq!(diagnostics.len(), 4);
        assert_eq!(diagnostics.warning_count(), 2);
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.has_warnings());
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_category_filter() {
        let diagnostics = Diagnostics::new();
        diagnostics.warning(DiagnosticCategory::Extraction, "a");
        diagnostics.warning(DiagnosticCategory::DataFlow, "b");
        diagnostics.warning(DiagnosticCategory::Extraction, "c");

        let extraction: Vec<_> = diagnostics
            .by_category(DiagnosticCategory::Extraction)
            .collect();
        assert_eq!(extraction.len(), 2);
        assert_eq!(extraction[0].message, "a");
        assert_eq!(extraction[1].message, "c");
    }

    #[test]
    fn test_display_format() {
        let diagnostic = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::DataFlow,
            "iteration cap reached",
        );
        assert_eq!(
            diagnostic.to_string(),
            "[WARN] DataFlow: iteration cap reached"
        );
    }
}
