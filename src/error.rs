//! Error taxonomy for the recommendation pipeline.

use thiserror::Error;

use crate::catalog::{Category, Tier};

/// Errors surfaced by the recommendation engine.
///
/// `InvalidIntake` is fatal and raised before any computation starts.
/// `EmptyCatalogTier` is raised by the SKU selector and is non-fatal for the
/// pipeline: the affected component is omitted from the candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The intake profile failed validation.
    #[error("invalid intake: {field}: {message}")]
    InvalidIntake {
        /// Offending intake field (e.g. `"bill_amount"`).
        field: String,
        /// Human-readable constraint description.
        message: String,
    },
    /// No sellable catalog item exists for the requested slot.
    #[error("catalog has no sellable {category} for tier {tier}")]
    EmptyCatalogTier {
        /// Component category that could not be filled.
        category: Category,
        /// Quality tier that was searched.
        tier: Tier,
    },
}

impl EngineError {
    pub(crate) fn invalid_intake(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIntake {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors the pipeline may absorb by omitting a component.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyCatalogTier { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_intake_message_names_field() {
        let err = EngineError::invalid_intake("bill_amount", "must be > 0");
        assert_eq!(err.to_string(), "invalid intake: bill_amount: must be > 0");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn empty_tier_is_recoverable() {
        let err = EngineError::EmptyCatalogTier {
            category: Category::Battery,
            tier: Tier::Premium,
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("battery"));
    }
}
