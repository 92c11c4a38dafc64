//! Advisory diagnostics collected during model checks.
//!
//! Validation proper is binary: a [`NetworkModel`](crate::NetworkModel)
//! either constructs or it does not. The checks in this module are the
//! softer kind: values that are legal but suspicious (an unrated line, an
//! extreme R/X ratio, a setpoint far from nominal). They never block a
//! solve; callers decide whether to surface them.

use serde::Serialize;

/// Severity of an advisory finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but workable.
    Warning,
    /// Will very likely produce a poor or failed solve.
    Error,
}

/// A single finding, tagged with a category for grouping.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Grouping key, e.g. "physical", "rating".
    pub category: String,
    pub message: String,
    /// Element the finding refers to, e.g. "bus 4", "branch 2".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}:{}] {}", tag, self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        Ok(())
    }
}

/// Accumulator for findings from one check pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: impl Into<String>) {
        self.push(Severity::Warning, category, message, None);
    }

    pub fn add_warning_for(
        &mut self,
        category: &str,
        message: impl Into<String>,
        entity: impl Into<String>,
    ) {
        self.push(Severity::Warning, category, message, Some(entity.into()));
    }

    pub fn add_error(&mut self, category: &str, message: impl Into<String>) {
        self.push(Severity::Error, category, message, None);
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &str,
        message: impl Into<String>,
        entity: Option<String>,
    ) {
        self.issues.push(DiagnosticIssue {
            severity,
            category: category.to_string(),
            message: message.into(),
            entity,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_and_classifies() {
        let mut diag = Diagnostics::new();
        diag.add_warning("rating", "branch has no MVA rating");
        diag.add_error("physical", "R/X ratio above 10");

        assert_eq!(diag.warning_count(), 1);
        assert!(diag.has_errors());
        assert_eq!(diag.iter().count(), 2);
    }

    #[test]
    fn display_includes_entity() {
        let mut diag = Diagnostics::new();
        diag.add_warning_for("rating", "no MVA rating", "branch 7");
        let text = diag.iter().next().unwrap().to_string();
        assert!(text.contains("branch 7"));
        assert!(text.starts_with("[warning:rating]"));
    }
}
