//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Drawer policy and lifecycle errors             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Server errors (in app)                                                │
//! │  └── ApiError         - What clients see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP response          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (operator names, not just IDs)
//! 3. Errors are enum variants, never String
//! 4. None of these are retried: retrying a financial write could
//!    double-apply it. Callers correct their input or wait.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Drawer policy and lifecycle errors.
///
/// Three recoverable categories surface to the caller: something was not
/// found, the single global drawer is held by someone else, or the input
/// was invalid. Nothing in this subsystem is process-fatal.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requesting operator is unknown to the user directory.
    #[error("Operator not found: {0}")]
    OperatorNotFound(String),

    /// The operator has no open shift, so there is nothing to close or
    /// annotate.
    #[error("No open shift for operator {operator}")]
    NoOpenSession { operator: String },

    /// The single global drawer is already under another operator's
    /// open shift. Names the holder so the caller can escalate.
    #[error("Drawer is already held by {owner}")]
    DrawerHeld { owner: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs or any row is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
