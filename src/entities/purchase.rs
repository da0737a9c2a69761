//! Purchase entity - the invoicing aggregate.
//!
//! A purchase bundles the tickets bought in one checkout together with the
//! buyer's billing address and walks through the invoicing state machine:
//! `incomplete -> new -> invoice_created -> payment_received`, with
//! `canceled` reachable from any non-terminal state. The invoice number is
//! nullable until export and unique once assigned.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a purchase.
///
/// Transitions are monotonic except for the `canceled` escape hatch;
/// `payment_received` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(25))")]
pub enum PurchaseState {
    /// Checkout started but not submitted; holds no ticket quota
    #[sea_orm(string_value = "incomplete")]
    Incomplete,
    /// Checkout submitted, waiting for invoicing
    #[sea_orm(string_value = "new")]
    New,
    /// Invoice issued, waiting for payment
    #[sea_orm(string_value = "invoice_created")]
    InvoiceCreated,
    /// Payment confirmed; terminal
    #[sea_orm(string_value = "payment_received")]
    PaymentReceived,
    /// Aborted; terminal
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl PurchaseState {
    /// Terminal states have no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::PaymentReceived | Self::Canceled)
    }

    /// Whether `self -> target` is a legal edge of the state machine.
    ///
    /// Same-state "transitions" are not edges; callers treat them as
    /// idempotent no-ops before consulting this predicate.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Incomplete, Self::New)
            | (Self::Incomplete | Self::New, Self::InvoiceCreated)
            | (Self::InvoiceCreated, Self::PaymentReceived) => true,
            (from, Self::Canceled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Incomplete => "incomplete",
            Self::New => "new",
            Self::InvoiceCreated => "invoice_created",
            Self::PaymentReceived => "payment_received",
            Self::Canceled => "canceled",
        };
        write!(f, "{name}")
    }
}

/// How the buyer settles the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentMethod {
    /// Bank transfer against the rendered invoice
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// Credit card
    #[sea_orm(string_value = "creditcard")]
    CreditCard,
    /// Direct debit
    #[sea_orm(string_value = "elv")]
    Elv,
}

/// Purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier for the purchase
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Account of the buyer, if the checkout was authenticated
    pub user_id: Option<String>,
    /// Company name on the invoice, optional
    pub company_name: String,
    /// Buyer first name
    pub first_name: String,
    /// Buyer last name
    pub last_name: String,
    /// Buyer e-mail, receives invoice and notifications
    pub email: String,
    /// Street and house number
    pub street: String,
    /// Zip code
    pub zip_code: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// VAT id, optional
    pub vat_id: String,
    /// When the checkout was started
    pub date_added: DateTimeUtc,
    /// Current state in the invoicing state machine
    pub state: PurchaseState,
    /// Free-form buyer comments
    pub comments: String,
    /// Selected payment method
    pub payment_method: PaymentMethod,
    /// Payment provider transaction id, when paid by card/debit
    pub payment_transaction: String,
    /// Sum of attached non-canceled ticket fees, tax inclusive; recomputed
    /// whenever tickets change
    pub payment_total: Option<f64>,
    /// Set once the invoice has been rendered and sent out
    pub exported: bool,
    /// Sequential invoice number, assigned exactly once at export time
    #[sea_orm(unique)]
    pub invoice_number: Option<i32>,
    /// Filename of the rendered invoice document
    pub invoice_filename: Option<String>,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One purchase owns many tickets
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
