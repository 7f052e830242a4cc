//! Validation reports.
//!
//! A `ValidationResult` is built once from an accumulated list of issues and
//! never mutated afterwards. Only ERROR-class issues make a result invalid.

use std::fmt;

/// Severity class of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single problem found while validating or converting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    /// Where the problem was found, e.g. "seq1:100..250"
    pub location: Option<String>,
}

impl ValidationIssue {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} [{}]: {}", self.severity, location, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Immutable validation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    valid: bool,
    format: Option<String>,
    sequence_count: usize,
    feature_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new(
        format: Option<String>,
        sequence_count: usize,
        feature_count: usize,
        issues: Vec<ValidationIssue>,
    ) -> Self {
        let valid = !issues.iter().any(ValidationIssue::is_error);
        Self {
            valid,
            format,
            sequence_count,
            feature_count,
            issues,
        }
    }

    /// Returns a new report with extra issues appended after the existing ones.
    pub fn with_issues(self, extra: impl IntoIterator<Item = ValidationIssue>) -> Self {
        let mut issues = self.issues;
        issues.extend(extra);
        Self::new(self.format, self.sequence_count, self.feature_count, issues)
    }

    /// Returns a new report labelled with the given format.
    pub fn with_format(self, format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
            ..self
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        let status = if self.valid { "Valid" } else { "Invalid" };
        let format = self
            .format
            .as_deref()
            .map(|f| format!(" {}", f))
            .unwrap_or_default();
        format!(
            "{}{} input: {} sequence(s), {} feature(s), {} error(s), {} warning(s)",
            status,
            format,
            self.sequence_count,
            self.feature_count,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
