use soroban_sdk::String;

use crate::config::{MAX_REASON_LENGTH, OUTCOME_NO, OUTCOME_YES};
use crate::errors::Error;

// ===== INPUT VALIDATION =====

/// Stateless checks on caller-supplied values.
///
/// State checks (market status, windows, membership) live with the module
/// that owns the state; this only looks at the raw inputs.
pub struct InputValidator;

impl InputValidator {
    /// Binary markets only: 0 = NO, 1 = YES.
    pub fn validate_outcome(outcome: u32) -> Result<(), Error> {
        if outcome != OUTCOME_NO && outcome != OUTCOME_YES {
            return Err(Error::InvalidOutcome);
        }
        Ok(())
    }

    /// Evidence is optional free text, bounded by the configured length.
    pub fn validate_evidence(evidence: &String, max_length: u32) -> Result<(), Error> {
        if evidence.len() > max_length {
            return Err(Error::InvalidEvidence);
        }
        Ok(())
    }

    pub fn validate_dispute_reason(reason: &String) -> Result<(), Error> {
        if reason.len() == 0 {
            return Err(Error::EmptyDisputeReason);
        }
        if reason.len() > MAX_REASON_LENGTH {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }

    pub fn validate_question(question: &String) -> Result<(), Error> {
        if question.len() == 0 {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }
}
