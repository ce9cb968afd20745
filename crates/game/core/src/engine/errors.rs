//! Error types for the progression pipeline.

use crate::error::{ErrorReport, ErrorSeverity, GameError};
use crate::state::{ActorId, ItemId, Step, TransactionFailure};

/// Identifies which stage of the step pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

/// Associates a transition phase with the underlying error.
#[derive(Clone, Debug)]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.phase.as_str(), self.error)
    }
}

impl<E: std::fmt::Display + std::fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ValidationKind {
    UnknownId,
    BudgetExceeded,
    MalformedPayload,
    /// A step was confirmed before the step it depends on.
    StepOrder,
    /// The progression has already been finalized.
    Finalized,
    /// The action is not available in the current mode or state.
    NotAllowed,
}

/// Rejected input. The action was not applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
    pub details: Vec<(String, String)>,
}

impl ValidationError {
    pub fn new(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    pub fn unknown(what: &str, id: &str) -> Self {
        Self::new(ValidationKind::UnknownId, format!("unknown {what} '{id}'"))
            .with_detail(what, id)
    }

    pub fn budget(what: &str, spent: impl ToString, budget: impl ToString) -> Self {
        let spent = spent.to_string();
        let budget = budget.to_string();
        Self::new(
            ValidationKind::BudgetExceeded,
            format!("{what} spend {spent} exceeds budget {budget}"),
        )
        .with_detail("spent", spent)
        .with_detail("budget", budget)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ValidationKind::MalformedPayload, message)
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(ValidationKind::NotAllowed, message)
    }

    pub fn step_order(step: Step, requires: Step) -> Self {
        Self::new(
            ValidationKind::StepOrder,
            format!("{step} requires {requires} to be confirmed first"),
        )
        .with_detail("step", step)
        .with_detail("requires", requires)
    }
}

/// Unmet requirements for one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrerequisiteFailure {
    pub subject: String,
    pub missing: Vec<String>,
}

/// One or more candidates did not meet their prerequisites.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("prerequisites not met: {}", summary(.failures))]
pub struct PrerequisiteError {
    pub failures: Vec<PrerequisiteFailure>,
}

fn summary(failures: &[PrerequisiteFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.subject, failure.missing.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The single error surfaced by `do_action` and `finalize`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    #[error(transparent)]
    Transaction(#[from] TransactionFailure),
}

impl ProgressionError {
    /// Flattens the error into the external `{kind, message, details}` shape.
    pub fn report(&self) -> ErrorReport {
        match self {
            ProgressionError::Validation(error) => {
                let mut report = ErrorReport::new("validation", error.message.clone())
                    .with_detail("reason", error.kind);
                report.details.extend(error.details.iter().cloned());
                report
            }
            ProgressionError::Prerequisite(error) => {
                let mut report = ErrorReport::new("prerequisite", error.to_string());
                for failure in &error.failures {
                    report = report.with_detail(failure.subject.clone(), failure.missing.join("; "));
                }
                report
            }
            ProgressionError::Transaction(error) => {
                ErrorReport::new("transaction", error.to_string())
                    .with_detail("actor", error.actor)
                    .with_detail("writes", error.writes)
            }
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            ProgressionError::Validation(error) => Some(error.kind),
            _ => None,
        }
    }
}

impl GameError for ValidationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self.kind {
            ValidationKind::UnknownId => "VALIDATION_UNKNOWN_ID",
            ValidationKind::BudgetExceeded => "VALIDATION_BUDGET_EXCEEDED",
            ValidationKind::MalformedPayload => "VALIDATION_MALFORMED_PAYLOAD",
            ValidationKind::StepOrder => "VALIDATION_STEP_ORDER",
            ValidationKind::Finalized => "VALIDATION_FINALIZED",
            ValidationKind::NotAllowed => "VALIDATION_NOT_ALLOWED",
        }
    }
}

impl GameError for PrerequisiteError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        "PREREQUISITE_NOT_MET"
    }
}

impl GameError for ProgressionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ProgressionError::Validation(error) => error.severity(),
            ProgressionError::Prerequisite(error) => error.severity(),
            ProgressionError::Transaction(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProgressionError::Validation(error) => error.error_code(),
            ProgressionError::Prerequisite(error) => error.error_code(),
            ProgressionError::Transaction(error) => error.error_code(),
        }
    }
}

/// Error surfaced by [`ActorUpdates`](super::ActorUpdates).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("{actor} owns no {item}")]
    UnknownItem { actor: ActorId, item: ItemId },

    #[error(transparent)]
    Transaction(#[from] TransactionFailure),
}

impl UpdateError {
    pub fn report(&self) -> ErrorReport {
        match self {
            UpdateError::UnknownItem { actor, item } => {
                ErrorReport::new("validation", self.to_string())
                    .with_detail("reason", ValidationKind::UnknownId)
                    .with_detail("actor", actor)
                    .with_detail("item", item)
            }
            UpdateError::Transaction(error) => {
                ErrorReport::new("transaction", error.to_string())
                    .with_detail("actor", error.actor)
                    .with_detail("writes", error.writes)
            }
        }
    }
}

impl GameError for UpdateError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            UpdateError::UnknownItem { .. } => ErrorSeverity::Validation,
            UpdateError::Transaction(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            UpdateError::UnknownItem { .. } => "UPDATE_UNKNOWN_ITEM",
            UpdateError::Transaction(error) => error.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StoreError;

    #[test]
    fn validation_report_carries_reason_and_details() {
        let error: ProgressionError = ValidationError::budget("skill", 21, 20).into();
        let report = error.report();
        assert_eq!(report.kind, "validation");
        assert_eq!(report.detail("reason"), Some("budget_exceeded"));
        assert_eq!(report.detail("spent"), Some("21"));
        assert_eq!(error.severity(), ErrorSeverity::Validation);
        assert_eq!(error.error_code(), "VALIDATION_BUDGET_EXCEEDED");
    }

    #[test]
    fn prerequisite_report_lists_subjects() {
        let error = ProgressionError::from(PrerequisiteError {
            failures: vec![PrerequisiteFailure {
                subject: "Elite Trooper".into(),
                missing: vec!["BAB +7 (current: +4)".into()],
            }],
        });
        let report = error.report();
        assert_eq!(report.kind, "prerequisite");
        assert_eq!(report.detail("Elite Trooper"), Some("BAB +7 (current: +4)"));
        assert!(error.severity().is_recoverable());
    }

    #[test]
    fn transaction_failures_are_fatal() {
        let error = ProgressionError::from(TransactionFailure {
            actor: ActorId(3),
            writes: 2,
            source: StoreError::new("disk full"),
        });
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
        assert_eq!(error.report().detail("writes"), Some("2"));
    }

    #[test]
    fn unknown_item_updates_report_as_validation() {
        let error = UpdateError::UnknownItem {
            actor: ActorId(3),
            item: ItemId(9),
        };
        let report = error.report();
        assert_eq!(report.kind, "validation");
        assert_eq!(report.detail("item"), Some("item#9"));
        assert_eq!(error.severity(), ErrorSeverity::Validation);
    }
}
