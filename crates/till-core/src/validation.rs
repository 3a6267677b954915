//! # Validation Module
//!
//! Input validation for drawer operations.
//!
//! Validation runs before any business logic and before any row is
//! written; the database CHECK constraints are the last line of defense
//! behind these functions.

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a withdrawal amount.
///
/// ## Rules
/// - Must be strictly positive: a zero or negative withdrawal is either
///   a no-op or a disguised deposit, and neither belongs in this ledger.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::validation::validate_withdrawal_amount;
///
/// assert!(validate_withdrawal_amount(Money::from_cents(500)).is_ok());
/// assert!(validate_withdrawal_amount(Money::zero()).is_err());
/// assert!(validate_withdrawal_amount(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_withdrawal_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount_cents".to_string(),
        });
    }

    Ok(())
}

/// Validates an operator identifier.
///
/// ## Rules
/// - Must not be empty or whitespace.
pub fn validate_operator_id(operator_id: &str) -> ValidationResult<()> {
    if operator_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "operator_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_amount_must_be_positive() {
        assert!(validate_withdrawal_amount(Money::from_cents(1)).is_ok());
        assert!(validate_withdrawal_amount(Money::zero()).is_err());
        assert!(validate_withdrawal_amount(Money::from_cents(-500)).is_err());
    }

    #[test]
    fn test_operator_id_must_be_present() {
        assert!(validate_operator_id("op-1").is_ok());
        assert!(validate_operator_id("").is_err());
        assert!(validate_operator_id("   ").is_err());
    }
}
