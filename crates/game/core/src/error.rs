//! Common error infrastructure for saga-core.
//!
//! This module provides shared types and traits used across all error types in saga-core.
//! Domain-specific errors (e.g., `ValidationError`, `PrerequisiteError`) are defined in
//! their respective modules alongside the operations they guard.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each failure family has its own error type with specific variants
//! - **Rich Context**: Errors carry key/value details so callers can render feedback
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **Data, not presentation**: Messages are plain strings; layout is the caller's job

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: Expected outcomes the player can fix with a different choice
/// - **Validation**: Malformed or out-of-budget input that signals a usage bug
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: The underlying store rejected a write; nothing was committed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the same request may succeed after other choices change.
    ///
    /// Examples: missing prerequisite feat, BAB too low for a prestige class
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown class id, skill ranks over budget
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - persistence failed, state was left untouched.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug or a broken store.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all saga-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// This is useful for error categorization, metrics, and testing.
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Flattened error shape handed to callers outside the core.
///
/// Mirrors the `{kind, message, details}` object UI layers expect, so they can
/// branch on `kind` and render `details` without matching on Rust enums.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub details: Vec<(String, String)>,
}

impl ErrorReport {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attaches a key/value detail (builder pattern).
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a detail value by key.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
