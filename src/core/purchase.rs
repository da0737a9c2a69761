//! Purchase aggregate business logic.
//!
//! A purchase owns the tickets bought in one checkout. This module handles
//! creation, total computation over the attached non-canceled tickets and
//! the invoicing state machine. Entering `payment_received` enqueues the
//! payment notification exactly once per actual transition; idempotent
//! same-state transitions do not re-send.

use crate::{
    entities::{
        Purchase, PurchaseState, Ticket, purchase, ticket, ticket_type,
    },
    errors::{Error, Result},
    jobs::{JobQueue, OutboundJob},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Buyer details for a new purchase.
///
/// The billing address lives on the purchase, not the user account, because
/// a buyer may want different invoices for different purchases.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    /// Buyer account id, when the checkout was authenticated
    pub user_id: Option<String>,
    /// Company name on the invoice, may be empty
    pub company_name: String,
    /// Buyer first name
    pub first_name: String,
    /// Buyer last name
    pub last_name: String,
    /// Buyer e-mail
    pub email: String,
    /// Street and house number
    pub street: String,
    /// Zip code
    pub zip_code: String,
    /// City
    pub city: String,
    /// Country
    pub country: String,
    /// VAT id, may be empty
    pub vat_id: String,
    /// Free-form comments
    pub comments: String,
    /// Selected payment method
    pub payment_method: crate::entities::PaymentMethod,
}

/// Creates a purchase in the `incomplete` state.
pub async fn create_purchase(
    db: &DatabaseConnection,
    new: NewPurchase,
) -> Result<purchase::Model> {
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(Error::Config {
            message: "Buyer first and last name are required".to_string(),
        });
    }
    if !new.email.contains('@') {
        return Err(Error::Config {
            message: format!("'{}' is not a valid e-mail address", new.email),
        });
    }

    let model = purchase::ActiveModel {
        user_id: Set(new.user_id),
        company_name: Set(new.company_name),
        first_name: Set(new.first_name.trim().to_string()),
        last_name: Set(new.last_name.trim().to_string()),
        email: Set(new.email),
        street: Set(new.street),
        zip_code: Set(new.zip_code),
        city: Set(new.city),
        country: Set(new.country),
        vat_id: Set(new.vat_id),
        date_added: Set(Utc::now()),
        state: Set(PurchaseState::Incomplete),
        comments: Set(new.comments),
        payment_method: Set(new.payment_method),
        payment_transaction: Set(String::new()),
        payment_total: Set(None),
        exported: Set(false),
        invoice_number: Set(None),
        invoice_filename: Set(None),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Finds a purchase by its unique ID.
pub async fn get_purchase_by_id(
    db: &DatabaseConnection,
    purchase_id: i64,
) -> Result<Option<purchase::Model>> {
    Purchase::find_by_id(purchase_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sums the fees of the given (ticket, ticket type) pairs, skipping
/// canceled tickets. Pure and order independent.
#[must_use]
pub fn payment_total_of(tickets: &[(ticket::Model, ticket_type::Model)]) -> f64 {
    tickets
        .iter()
        .filter(|(t, _)| !t.canceled)
        .map(|(_, tt)| tt.fee)
        .sum()
}

/// Computes the payment total for a purchase from the database: fetches the
/// attached tickets with their types and delegates the filter-and-sum to
/// [`payment_total_of`].
pub async fn calculate_payment_total(db: &DatabaseConnection, purchase_id: i64) -> Result<f64> {
    let tickets = Ticket::find()
        .filter(ticket::Column::PurchaseId.eq(purchase_id))
        .find_also_related(crate::entities::TicketType)
        .all(db)
        .await?;

    let pairs = tickets
        .into_iter()
        .map(|(t, tt)| {
            let tt = tt.ok_or(Error::TicketTypeNotFound {
                id: t.ticket_type_id,
            })?;
            Ok((t, tt))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(payment_total_of(&pairs))
}

/// Recomputes and stores the payment total of a purchase.
///
/// Callers invoke this after attaching or canceling tickets; cancellation
/// itself deliberately does not touch the total.
pub async fn update_payment_total(
    db: &DatabaseConnection,
    purchase_id: i64,
) -> Result<purchase::Model> {
    let purchase = get_purchase_by_id(db, purchase_id)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    let total = calculate_payment_total(db, purchase_id).await?;

    let mut active: purchase::ActiveModel = purchase.into();
    active.payment_total = Set(Some(total));
    active.update(db).await.map_err(Into::into)
}

/// Moves a purchase to a new state.
///
/// Same-state transitions are no-ops (idempotent retries do not error and
/// do not re-trigger side effects). Illegal targets fail with
/// `InvalidStateTransition` and leave the row unchanged. A successful
/// transition into `payment_received` enqueues the payment notification
/// after the update is committed.
///
/// The write is a guarded single-statement update on the state we read: of
/// two concurrent writers only one flips the row and enqueues, the loser
/// re-reads and lands on the no-op or the error path.
pub async fn transition(
    db: &DatabaseConnection,
    jobs: &JobQueue,
    purchase_id: i64,
    new_state: PurchaseState,
) -> Result<purchase::Model> {
    let purchase = get_purchase_by_id(db, purchase_id)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    if purchase.state == new_state {
        debug!(
            "Purchase {} already in state '{}', nothing to do.",
            purchase_id, new_state
        );
        return Ok(purchase);
    }

    if !purchase.state.can_transition_to(new_state) {
        return Err(Error::InvalidStateTransition {
            from: purchase.state.to_string(),
            to: new_state.to_string(),
        });
    }

    let result = Purchase::update_many()
        .col_expr(purchase::Column::State, Expr::value(new_state))
        .filter(purchase::Column::Id.eq(purchase_id))
        .filter(purchase::Column::State.eq(purchase.state))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Lost the race: another writer changed the state after our read
        let current = get_purchase_by_id(db, purchase_id)
            .await?
            .ok_or(Error::PurchaseNotFound { id: purchase_id })?;
        if current.state == new_state {
            debug!(
                "Purchase {} already in state '{}', nothing to do.",
                purchase_id, new_state
            );
            return Ok(current);
        }
        return Err(Error::InvalidStateTransition {
            from: current.state.to_string(),
            to: new_state.to_string(),
        });
    }

    info!("Purchase {} transitioned to '{}'.", purchase_id, new_state);

    if new_state == PurchaseState::PaymentReceived {
        jobs.enqueue(OutboundJob::SendPaymentNotification {
            purchase_id,
            recipients: vec![email_receiver(&purchase)],
        })?;
    }

    Ok(purchase::Model {
        state: new_state,
        ..purchase
    })
}

/// RFC 5322-style receiver string for the buyer: `First Last <email>`.
#[must_use]
pub fn email_receiver(purchase: &purchase::Model) -> String {
    format!(
        "{} {} <{}>",
        purchase.first_name, purchase.last_name, purchase.email
    )
}
