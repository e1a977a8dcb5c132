//! Graph validation errors.
//!
//! Violation codes are organized by category:
//! - `V0xx` - Identifier errors
//! - `V1xx` - Uniqueness errors
//! - `V2xx` - Referential integrity errors
//! - `V3xx` - Structural errors
//!
//! Construction collects every violation before failing, so a single
//! [`ValidationError`] reports all problems in the input at once.

use std::fmt;

use thiserror::Error;

/// Stable codes identifying each kind of graph violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationCode {
    // =========================================================================
    // Identifier Errors (V0xx)
    // =========================================================================
    /// Empty identifier.
    V001,

    /// Malformed identifier.
    ///
    /// Identifiers must start with an ASCII letter followed by ASCII letters,
    /// digits, `_` or `-`.
    V002,

    // =========================================================================
    // Uniqueness Errors (V1xx)
    // =========================================================================
    /// Two nodes share an id.
    V100,

    /// Two relationships share an id.
    V101,

    // =========================================================================
    // Referential Integrity Errors (V2xx)
    // =========================================================================
    /// A node names a parent that does not exist.
    V200,

    /// A relationship source does not exist.
    V201,

    /// A relationship target does not exist.
    V202,

    /// A relationship asks to avoid a node that does not exist.
    V203,

    // =========================================================================
    // Structural Errors (V3xx)
    // =========================================================================
    /// The parent chain of one or more nodes loops back on itself.
    V300,
}

impl ViolationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCode::V001 => "V001",
            ViolationCode::V002 => "V002",
            ViolationCode::V100 => "V100",
            ViolationCode::V101 => "V101",
            ViolationCode::V200 => "V200",
            ViolationCode::V201 => "V201",
            ViolationCode::V202 => "V202",
            ViolationCode::V203 => "V203",
            ViolationCode::V300 => "V300",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ViolationCode::V001 => "empty identifier",
            ViolationCode::V002 => "malformed identifier",
            ViolationCode::V100 => "duplicate node id",
            ViolationCode::V101 => "duplicate relationship id",
            ViolationCode::V200 => "dangling parent reference",
            ViolationCode::V201 => "dangling relationship source",
            ViolationCode::V202 => "dangling relationship target",
            ViolationCode::V203 => "dangling avoid reference",
            ViolationCode::V300 => "parent cycle",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single problem found while building a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    code: ViolationCode,
    message: String,
    subjects: Vec<String>,
}

impl Violation {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            subjects: Vec::new(),
        }
    }

    /// Attaches the raw identifiers this violation is about.
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects.extend(subjects.into_iter().map(Into::into));
        self
    }

    pub fn code(&self) -> ViolationCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw identifiers involved, in the order they were reported.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Every violation found by one construction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("graph validation failed with {} violation(s): {}", .violations.len(), summary(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if any violation carries `code`.
    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Accumulates violations during graph construction.
///
/// # Example
///
/// ```
/// # use c4_layout_core::error::{Violation, ViolationCode, ViolationCollector};
/// let mut collector = ViolationCollector::new();
/// collector.emit(Violation::new(ViolationCode::V100, "duplicate node id `api`"));
/// collector.emit(Violation::new(ViolationCode::V200, "unknown parent `core`"));
///
/// let err = collector.finish().unwrap_err();
/// assert_eq!(err.violations().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ViolationCollector {
    violations: Vec<Violation>,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Finish collection.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] holding every emitted violation when at
    /// least one was emitted.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}
