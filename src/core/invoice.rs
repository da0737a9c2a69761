//! Invoice numbering and export business logic.
//!
//! Invoice numbers form a single, strictly increasing sequence per
//! conference; they are assigned at export time, exactly once per purchase,
//! and never reused, not even for canceled purchases. The number column is
//! unique, so of two concurrent allocators one commits and the other gets a
//! retryable `DuplicateInvoiceNumber` instead of a duplicate.

use crate::{
    config::conference::ConferenceConfig,
    entities::{
        Purchase, PurchaseState, Ticket, purchase, ticket, ticket_type,
    },
    errors::{Error, Result},
    jobs::{JobQueue, OutboundJob},
};
use sea_orm::{
    Condition, DbErr, PaginatorTrait, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
    prelude::*,
};
use tracing::{info, warn};

/// Returns the next invoice number: `max + 1` over all purchases, or 1 for
/// the first invoice of the conference.
async fn next_invoice_number<C>(conn: &C) -> Result<i32>
where
    C: ConnectionTrait,
{
    let max: Option<Option<i32>> = Purchase::find()
        .select_only()
        .column_as(purchase::Column::InvoiceNumber.max(), "max_invoice_number")
        .into_tuple()
        .one(conn)
        .await?;

    Ok(max.flatten().map_or(1, |m| m + 1))
}

/// Allocates the invoice number for a purchase.
///
/// Legal once the purchase has reached `invoice_created`
/// (`InvoiceNotReady` before that). Idempotent: a purchase that already has
/// a number keeps it and the existing number is returned, so the
/// assigned-exactly-once invariant holds across retries. A concurrent
/// allocation of the same number trips the unique constraint and surfaces
/// as `DuplicateInvoiceNumber`, which the caller may retry.
pub async fn allocate_invoice_number(db: &DatabaseConnection, purchase_id: i64) -> Result<i32> {
    let txn = db.begin().await?;

    let purchase = Purchase::find_by_id(purchase_id)
        .one(&txn)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    if let Some(existing) = purchase.invoice_number {
        return Ok(existing);
    }

    if !matches!(
        purchase.state,
        PurchaseState::InvoiceCreated | PurchaseState::PaymentReceived
    ) {
        return Err(Error::InvoiceNotReady {
            state: purchase.state.to_string(),
        });
    }

    let number = next_invoice_number(&txn).await?;

    let mut active: purchase::ActiveModel = purchase.into();
    active.invoice_number = Set(Some(number));
    if let Err(e) = active.update(&txn).await {
        return Err(map_allocation_conflict(e, number));
    }
    txn.commit().await?;

    info!("Allocated invoice number {} to purchase {}.", number, purchase_id);
    Ok(number)
}

/// Maps the error from a lost allocation race to the retryable
/// `DuplicateInvoiceNumber`; anything else passes through as a database
/// error.
fn map_allocation_conflict(e: DbErr, number: i32) -> Error {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        Error::DuplicateInvoiceNumber { number }
    } else {
        e.into()
    }
}

/// Allocates an invoice number, retrying once on a concurrency conflict.
///
/// A second conflict in a row is surfaced to the caller as the transient
/// failure it is.
pub async fn allocate_invoice_number_with_retry(
    db: &DatabaseConnection,
    purchase_id: i64,
) -> Result<i32> {
    with_one_retry(purchase_id, || allocate_invoice_number(db, purchase_id)).await
}

/// Runs `attempt`, repeating it exactly once when the first run fails with
/// a retryable error. Non-retryable errors and a second conflict are
/// returned as-is.
async fn with_one_retry<F, Fut>(purchase_id: i64, mut attempt: F) -> Result<i32>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<i32>>,
{
    match attempt().await {
        Err(e) if e.is_retryable() => {
            warn!(
                "Invoice number conflict for purchase {}, retrying once: {}",
                purchase_id, e
            );
            attempt().await
        }
        other => other,
    }
}

/// Formats an invoice number for display, e.g. `INVOICE-0001`.
#[must_use]
pub fn full_invoice_number(number: i32, conference: &ConferenceConfig) -> String {
    format!(
        "{}-{:0width$}",
        conference.invoice_number_prefix,
        number,
        width = conference.invoice_number_digits
    )
}

/// Whether an invoice mail should go out for this purchase.
///
/// False only for the sponsor-ticket case: a zero-total purchase paid "by
/// invoice" whose tickets all belong to `prevent_invoice` types.
pub async fn should_send_invoice(
    db: &DatabaseConnection,
    purchase: &purchase::Model,
) -> Result<bool> {
    if purchase.payment_total != Some(0.0)
        || purchase.payment_method != crate::entities::PaymentMethod::Invoice
    {
        return Ok(true);
    }

    let invoiceable = Ticket::find()
        .filter(ticket::Column::PurchaseId.eq(purchase.id))
        .inner_join(crate::entities::TicketType)
        .filter(ticket_type::Column::PreventInvoice.eq(false))
        .count(db)
        .await?;

    Ok(invoiceable > 0)
}

/// Purchases waiting for export: invoiced (or already paid) but not yet
/// rendered and sent. Ordered by id for stable batching.
pub async fn exportable_purchases(db: &DatabaseConnection) -> Result<Vec<purchase::Model>> {
    Purchase::find()
        .filter(purchase::Column::Exported.eq(false))
        .filter(
            Condition::any()
                .add(purchase::Column::State.eq(PurchaseState::InvoiceCreated))
                .add(purchase::Column::State.eq(PurchaseState::PaymentReceived)),
        )
        .order_by_asc(purchase::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a purchase as exported, recording the rendered invoice filename.
///
/// Called only after the external rendering step succeeded; allocation and
/// enqueueing alone never set the flag.
pub async fn mark_exported(
    db: &DatabaseConnection,
    purchase_id: i64,
    invoice_filename: Option<String>,
) -> Result<purchase::Model> {
    let purchase = Purchase::find_by_id(purchase_id)
        .one(db)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    let mut active: purchase::ActiveModel = purchase.into();
    active.exported = Set(true);
    active.invoice_filename = Set(invoice_filename);
    active.update(db).await.map_err(Into::into)
}

/// One export pass: allocates invoice numbers for the backlog and enqueues
/// the render-and-mail jobs. Returns the number of purchases queued.
///
/// Purchases that should not receive an invoice mail (sponsor tickets) get
/// their number but no job. The `exported` flag is left to the worker that
/// actually rendered the document.
pub async fn run_export_pass(db: &DatabaseConnection, jobs: &JobQueue) -> Result<usize> {
    let backlog = exportable_purchases(db).await?;
    let mut queued = 0;

    for purchase in backlog {
        allocate_invoice_number_with_retry(db, purchase.id).await?;

        if should_send_invoice(db, &purchase).await? {
            jobs.enqueue(OutboundJob::RenderAndEmailInvoice {
                purchase_id: purchase.id,
            })?;
            queued += 1;
        }
    }

    Ok(queued)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::purchase::update_payment_total;
    use crate::core::ticket::attach_ticket;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_allocation_requires_invoice_created() -> Result<()> {
        let db = setup_test_db().await?;
        let purchase = create_test_purchase(&db).await?;

        let result = allocate_invoice_number(&db, purchase.id).await;
        assert!(matches!(result.unwrap_err(), Error::InvoiceNotReady { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_allocation_sequential_and_idempotent() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        let second = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;

        assert_eq!(allocate_invoice_number(&db, first.id).await?, 1);
        assert_eq!(allocate_invoice_number(&db, second.id).await?, 2);

        // Re-allocation observes, never reassigns
        assert_eq!(allocate_invoice_number(&db, first.id).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_canceled_purchases_do_not_free_numbers() -> Result<()> {
        let db = setup_test_db().await?;
        let (jobs, _receiver) = crate::jobs::JobQueue::new();

        let doomed = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        assert_eq!(allocate_invoice_number(&db, doomed.id).await?, 1);
        crate::core::purchase::transition(&db, &jobs, doomed.id, PurchaseState::Canceled)
            .await?;

        let next = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        assert_eq!(allocate_invoice_number(&db, next.id).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_first_invoice_number_formats_as_0001() -> Result<()> {
        let db = setup_test_db().await?;
        let conference = test_conference();

        let purchase = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        let number = allocate_invoice_number(&db, purchase.id).await?;

        assert_eq!(number, 1);
        assert_eq!(full_invoice_number(number, &conference), "INVOICE-0001");

        Ok(())
    }

    #[test]
    fn test_full_invoice_number_respects_config() {
        let mut conference = test_conference();
        conference.invoice_number_prefix = "RE".to_string();
        conference.invoice_number_digits = 6;

        assert_eq!(full_invoice_number(42, &conference), "RE-000042");
    }

    #[tokio::test]
    async fn test_should_send_invoice_sponsor_case() -> Result<()> {
        let db = setup_test_db().await?;
        let conference = test_conference();

        let mut params = test_new_ticket_type("Sponsor Ticket", 0.0);
        params.prevent_invoice = true;
        let sponsor_type =
            crate::core::catalog::create_ticket_type(&db, &conference, params).await?;

        let purchase = create_test_purchase(&db).await?;
        attach_ticket(&db, purchase.id, sponsor_type.id, None, venue_details()).await?;
        let purchase = update_payment_total(&db, purchase.id).await?;

        assert!(!should_send_invoice(&db, &purchase).await?);

        // A regular paid ticket in the same purchase flips it back
        let regular = create_test_ticket_type(&db, "Conference Ticket", 100.0).await?;
        attach_ticket(&db, purchase.id, regular.id, None, venue_details()).await?;
        let purchase = update_payment_total(&db, purchase.id).await?;

        assert!(should_send_invoice(&db, &purchase).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_export_pass_allocates_and_enqueues() -> Result<()> {
        let db = setup_test_db().await?;
        let (jobs, mut receiver) = crate::jobs::JobQueue::new();

        let invoiced = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        let paid = create_test_purchase_in_state(&db, PurchaseState::PaymentReceived).await?;
        // Still open, must be skipped
        create_test_purchase(&db).await?;

        let queued = run_export_pass(&db, &jobs).await?;
        assert_eq!(queued, 2);

        let first = crate::core::purchase::get_purchase_by_id(&db, invoiced.id)
            .await?
            .unwrap();
        let second = crate::core::purchase::get_purchase_by_id(&db, paid.id)
            .await?
            .unwrap();
        assert_eq!(first.invoice_number, Some(1));
        assert_eq!(second.invoice_number, Some(2));
        // Export flag waits for the rendering worker
        assert!(!first.exported);

        assert!(matches!(
            receiver.try_recv().unwrap(),
            OutboundJob::RenderAndEmailInvoice { .. }
        ));
        assert!(matches!(
            receiver.try_recv().unwrap(),
            OutboundJob::RenderAndEmailInvoice { .. }
        ));
        assert!(receiver.try_recv().is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_exported_records_filename() -> Result<()> {
        let db = setup_test_db().await?;

        let purchase = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        allocate_invoice_number(&db, purchase.id).await?;

        let exported =
            mark_exported(&db, purchase.id, Some("invoice_0001.pdf".to_string())).await?;
        assert!(exported.exported);
        assert_eq!(exported.invoice_filename.as_deref(), Some("invoice_0001.pdf"));

        assert!(exportable_purchases(&db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate_invoice_number() -> Result<()> {
        let db = setup_test_db().await?;

        // Two writers racing for number 1: the loser's update trips the
        // unique constraint on the column
        let winner = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;
        let loser = create_test_purchase_in_state(&db, PurchaseState::InvoiceCreated).await?;

        let mut active: purchase::ActiveModel = winner.into();
        active.invoice_number = Set(Some(1));
        active.update(&db).await?;

        let mut active: purchase::ActiveModel = loser.into();
        active.invoice_number = Set(Some(1));
        let db_err = active.update(&db).await.unwrap_err();

        let mapped = map_allocation_conflict(db_err, 1);
        assert!(mapped.is_retryable());
        assert!(matches!(mapped, Error::DuplicateInvoiceNumber { number: 1 }));

        // Unrelated database errors pass through unchanged
        let other = map_allocation_conflict(DbErr::Custom("disk on fire".to_string()), 1);
        assert!(!other.is_retryable());
        assert!(matches!(other, Error::Database(_)));

        Ok(())
    }

    #[tokio::test]
    async fn test_retry_recovers_from_a_single_conflict() -> Result<()> {
        let mut calls = 0;
        let number = with_one_retry(1, || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt == 1 {
                    Err(Error::DuplicateInvoiceNumber { number: 7 })
                } else {
                    Ok(7)
                }
            }
        })
        .await?;

        assert_eq!(number, 7);
        assert_eq!(calls, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_retry_surfaces_second_conflict() {
        let mut calls = 0;
        let result = with_one_retry(1, || {
            calls += 1;
            async { Err(Error::DuplicateInvoiceNumber { number: 7 }) }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateInvoiceNumber { number: 7 }
        ));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_deterministic_failures() {
        let mut calls = 0;
        let result = with_one_retry(99, || {
            calls += 1;
            async { Err(Error::PurchaseNotFound { id: 99 }) }
        })
        .await;

        assert!(matches!(result.unwrap_err(), Error::PurchaseNotFound { id: 99 }));
        assert_eq!(calls, 1);
    }
}
