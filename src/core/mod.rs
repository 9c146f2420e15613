/// Access-gate state machine derived from subscription status and trial time
pub mod access;

/// Account provisioning and subscription status transitions
pub mod account;

/// Area management with per-account unique names
pub mod area;

/// Bill generation: monthly schedules and idempotent creation
pub mod billing;

/// Customer operations and the atomic opening-due adjustment
pub mod customer;

/// Due-ledger collections against opening dues
pub mod due_ledger;

/// Payment recording, bill settlement, and undo
pub mod payment;

/// Monthly collection summaries
pub mod report;
