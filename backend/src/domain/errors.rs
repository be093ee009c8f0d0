//! Engine error taxonomy.
//!
//! Business failures are explicit variants with stable machine-readable
//! codes; storage and serialization faults are absorbed into `Internal` and
//! surfaced generically by the REST layer.

use chrono::NaiveDate;
use thiserror::Error;

use super::models::{ClientCategory, ClosingStatus, ReferenceMonth};

#[derive(Debug, Error)]
pub enum EngineError {
    /// No active commission rule covers the category on the date. Fatal to a
    /// closing run: the whole computation is abandoned, nothing is persisted.
    #[error("no active commission rule for category {category:?} on {date}")]
    RuleNotFound {
        category: ClientCategory,
        date: NaiveDate,
    },

    #[error("closing for {0} is already completed")]
    ClosingAlreadyCompleted(ReferenceMonth),

    #[error("closing for {month} cannot be reopened from status {status:?}")]
    ClosingNotReopenable {
        month: ReferenceMonth,
        status: ClosingStatus,
    },

    #[error("no closing found for {0}")]
    ClosingNotFound(ReferenceMonth),

    #[error("invalid justification: {0}")]
    InvalidJustification(String),

    #[error("malformed reference month '{0}', expected YYYY-MM")]
    MalformedReferenceMonth(String),

    #[error("commission rule window overlaps an existing active rule for {category:?}")]
    OverlappingRule { category: ClientCategory },

    #[error("invalid commission rule: {0}")]
    InvalidCommissionRule(String),

    #[error("invalid bonus policy: {0}")]
    InvalidBonusPolicy(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable error code consumed by API clients.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::RuleNotFound { .. } => "RULE_NOT_FOUND",
            EngineError::ClosingAlreadyCompleted(_) => "CLOSING_ALREADY_COMPLETED",
            EngineError::ClosingNotReopenable { .. } => "CLOSING_NOT_REOPENABLE",
            EngineError::ClosingNotFound(_) => "CLOSING_NOT_FOUND",
            EngineError::InvalidJustification(_) => "INVALID_JUSTIFICATION",
            EngineError::MalformedReferenceMonth(_) => "MALFORMED_REFERENCE_MONTH",
            EngineError::OverlappingRule { .. } => "OVERLAPPING_RULE",
            EngineError::InvalidCommissionRule(_) => "INVALID_COMMISSION_RULE",
            EngineError::InvalidBonusPolicy(_) => "INVALID_BONUS_POLICY",
            EngineError::Internal(_) => "INTERNAL",
        }
    }
}

/// Parse a `YYYY-MM` string, mapping the failure into the engine taxonomy.
pub fn parse_reference_month(s: &str) -> Result<ReferenceMonth, EngineError> {
    s.parse()
        .map_err(|_| EngineError::MalformedReferenceMonth(s.to_string()))
}
