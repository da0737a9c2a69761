//! Unified error types for the ticketing core.
//!
//! Every domain rule violation gets its own variant so the serving layer can
//! translate it into a user-facing message. All variants are recoverable at
//! the calling boundary; none is fatal to the process.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config files etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Illegal purchase state transition; the purchase is left unchanged
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// The ticket type's purchase limit has been reached
    #[error("Ticket type '{ticket_type}' is sold out (limit {limit})")]
    CapacityExceeded { ticket_type: String, limit: u32 },

    /// Voucher failed a validity rule other than the specific ones below
    #[error("Voucher '{code}' is not valid: {message}")]
    VoucherInvalid { code: String, message: String },

    /// No voucher exists for the given code
    #[error("Voucher '{code}' not found")]
    VoucherNotFound { code: String },

    /// The voucher's validity deadline has passed
    #[error("Voucher '{code}' has expired")]
    VoucherExpired { code: String },

    /// The voucher has already been consumed
    #[error("Voucher '{code}' has already been used")]
    VoucherAlreadyUsed { code: String },

    /// A concurrent allocation won the race for this invoice number.
    /// Retryable: the caller re-reads the sequence and tries once more.
    #[error("Invoice number {number} was allocated concurrently")]
    DuplicateInvoiceNumber { number: i32 },

    /// Invoice numbers are only assigned from `invoice_created` onwards
    #[error("Purchase in state '{state}' cannot receive an invoice number")]
    InvoiceNotReady { state: String },

    /// The ticket details do not match the ticket type's variant
    #[error("Ticket details are for kind '{got}', ticket type generates '{expected}'")]
    TicketKindMismatch { expected: String, got: String },

    /// No purchase with the given id
    #[error("Purchase {id} not found")]
    PurchaseNotFound { id: i64 },

    /// No ticket with the given id
    #[error("Ticket {id} not found")]
    TicketNotFound { id: i64 },

    /// No ticket type with the given id
    #[error("Ticket type {id} not found")]
    TicketTypeNotFound { id: i64 },

    /// The outbound job queue is gone (receiver dropped)
    #[error("Job queue closed: {message}")]
    JobQueue { message: String },
}

impl Error {
    /// Whether the caller may retry the failed operation once.
    ///
    /// Only concurrency conflicts on invoice-number allocation qualify;
    /// every other error is deterministic.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateInvoiceNumber { .. })
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
