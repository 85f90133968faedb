use std::fmt;

use crate::model::{BeneficiaryStatus, WheelchairStatus};
use crate::store::StoreError;
use crate::validate::ValidationErrors;

/// Machine-readable error codes carried in failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ValidationFailed,
    BeneficiaryNotFound,
    WheelchairNotFound,
    WheelchairUnavailable,
    InvalidStateTransition,
    RecordInUse,
    CorruptStore,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ValidationFailed => "E1101",
            Self::BeneficiaryNotFound => "E2001",
            Self::WheelchairNotFound => "E2002",
            Self::WheelchairUnavailable => "E2101",
            Self::InvalidStateTransition => "E2102",
            Self::RecordInUse => "E2103",
            Self::CorruptStore => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ValidationFailed => "Input failed validation",
            Self::BeneficiaryNotFound => "Beneficiary not found",
            Self::WheelchairNotFound => "Wheelchair not found",
            Self::WheelchairUnavailable => "Wheelchair not available",
            Self::InvalidStateTransition => "Invalid state transition",
            Self::RecordInUse => "Record is still linked",
            Self::CorruptStore => "Corrupt collection in store",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .wheelcare/config.toml and retry."),
            Self::ValidationFailed => Some("Correct every listed field and resubmit."),
            Self::BeneficiaryNotFound | Self::WheelchairNotFound => None,
            Self::WheelchairUnavailable => {
                Some("Pick a wheelchair whose status is AVAILABLE.")
            }
            Self::InvalidStateTransition => {
                Some("Follow the lifecycle: pending -> approved -> delivered -> follow_up.")
            }
            Self::RecordInUse => {
                Some("Records linked by an assignment cannot be deleted.")
            }
            Self::CorruptStore => {
                Some("Restore the collection from a backup or remove the damaged key.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other wheelcare process releases its lock.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The two kinds of record the registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Wheelchair,
    Beneficiary,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wheelchair => "wheelchair",
            Self::Beneficiary => "beneficiary",
        })
    }
}

/// Lifecycle operations that move a beneficiary between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Assign,
    Deliver,
    FollowUp,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assign => "assign",
            Self::Deliver => "deliver",
            Self::FollowUp => "follow up",
        })
    }
}

/// Errors raised by the domain services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("wheelchair '{id}' is not available (status {status})")]
    WheelchairUnavailable { id: String, status: WheelchairStatus },

    #[error("cannot {transition} beneficiary '{id}' from status {status}")]
    InvalidTransition {
        id: String,
        transition: Transition,
        status: BeneficiaryStatus,
    },

    #[error("{kind} '{id}' is linked to '{linked_id}' and cannot be deleted")]
    InUse {
        kind: EntityKind,
        id: String,
        linked_id: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::NotFound {
                kind: EntityKind::Beneficiary,
                ..
            } => ErrorCode::BeneficiaryNotFound,
            Self::NotFound {
                kind: EntityKind::Wheelchair,
                ..
            } => ErrorCode::WheelchairNotFound,
            Self::WheelchairUnavailable { .. } => ErrorCode::WheelchairUnavailable,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::InUse { .. } => ErrorCode::RecordInUse,
            Self::Store(err) => err.code(),
        }
    }

    /// Whether the failure is an internal one the caller cannot fix by
    /// changing its input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
