//! Unified error types for `billkeeper`.
//!
//! Every fallible operation in the crate returns [`Result`]. Core modules
//! propagate these errors with `?`; the session layer is the last boundary,
//! converting them into user-facing outcome messages that never escape
//! further.

use thiserror::Error;

/// Crate-wide error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// An account-scoped operation was attempted without a signed-in account.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The customer a mutation targets does not exist (or is deleted).
    #[error("Customer not found: {id}")]
    CustomerNotFound {
        /// The customer id that failed to resolve
        id: String,
    },

    /// A payment, due payment, bill, or account record is missing.
    #[error("{entity} not found: {id}")]
    RecordNotFound {
        /// Kind of record that was looked up (e.g. `"payment"`)
        entity: &'static str,
        /// The identifier that failed to resolve
        id: String,
    },

    /// An area with the same name (compared case-insensitively) already
    /// exists within the account.
    #[error("Area '{name}' already exists")]
    AreaAlreadyExists {
        /// The conflicting area name as submitted
        name: String,
    },

    /// The submitted area name is empty or otherwise unusable.
    #[error("Invalid area name: '{name}'")]
    InvalidAreaName {
        /// The rejected name as submitted
        name: String,
    },

    /// A monetary amount is out of range (negative where disallowed,
    /// zero where a non-zero amount is required, or not finite).
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A payment allocation targeted a bill that is already settled.
    #[error("Bill {id} is already paid")]
    BillAlreadySettled {
        /// Id of the already-settled bill
        id: i64,
    },

    /// A payment's allocation list named the same bill more than once.
    #[error("Bill {id} is allocated more than once")]
    DuplicateAllocation {
        /// Id of the bill that appeared twice
        id: i64,
    },

    /// A payment allocation is larger than the bill it settles.
    #[error("Allocation {allocated:.2} exceeds bill amount {bill_amount:.2}")]
    AllocationExceedsBill {
        /// The allocated amount
        allocated: f64,
        /// The bill's full amount
        bill_amount: f64,
    },

    /// Configuration or input-validation failure with a human-readable cause.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what was wrong
        message: String,
    },

    /// The underlying store rejected or failed an operation. Batched writes
    /// are transactional, so a failed mutation leaves no partial state.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sea_orm::DbErr),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
