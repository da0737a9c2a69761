//! Ticket lifecycle business logic.
//!
//! Handles attaching tickets to purchases (with capacity and voucher
//! checks), cancellation, ownership resolution and the edit-permission
//! predicate. Attaching consumes a voucher and inserts the ticket row in
//! one database transaction: both happen or neither, so a voucher can never
//! be burned without a matching ticket.

use crate::{
    config::conference::ConferenceConfig,
    entities::{
        Purchase, PurchaseState, Ticket, TicketKind, purchase, ticket, ticket_type, voucher,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, PaginatorTrait, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Variant-specific payload supplied when attaching a ticket.
#[derive(Debug, Clone)]
pub enum TicketDetails {
    /// Conference admission ticket naming an attendee
    Venue {
        /// Attendee first name
        first_name: String,
        /// Attendee last name
        last_name: String,
        /// Attendee organisation, may be empty
        organisation: String,
        /// Desired T-shirt size
        shirt_size: Option<String>,
    },
    /// Supporter ticket, carries no attendee data
    Support,
    /// SIM card handed out at the venue
    SimCard {
        /// Card holder first name
        first_name: String,
        /// Card holder last name
        last_name: String,
        /// Card holder contact e-mail
        email: String,
        /// IMSI, filled in once the card is handed out
        sim_id: Option<String>,
    },
}

impl TicketDetails {
    /// The variant tag this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> TicketKind {
        match self {
            Self::Venue { .. } => TicketKind::Venue,
            Self::Support => TicketKind::Support,
            Self::SimCard { .. } => TicketKind::SimCard,
        }
    }
}

/// Attaches a new ticket of the given type to a purchase.
///
/// Checks, in order: the payload matches the type's variant
/// (`TicketKindMismatch`), the type still has quota (`CapacityExceeded`,
/// counting tickets on non-`incomplete` purchases), and the voucher rules
/// (required voucher type present and matching, voucher neither expired nor
/// used). Voucher consumption and the ticket insert share one transaction.
///
/// The caller recomputes the purchase total afterwards; attaching does not
/// do it implicitly.
pub async fn attach_ticket(
    db: &DatabaseConnection,
    purchase_id: i64,
    ticket_type_id: i64,
    voucher_code: Option<&str>,
    details: TicketDetails,
) -> Result<ticket::Model> {
    let txn = db.begin().await?;

    let purchase = Purchase::find_by_id(purchase_id)
        .one(&txn)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    let ticket_type = crate::entities::TicketType::find_by_id(ticket_type_id)
        .one(&txn)
        .await?
        .ok_or(Error::TicketTypeNotFound { id: ticket_type_id })?;

    if details.kind() != ticket_type.kind {
        return Err(Error::TicketKindMismatch {
            expected: ticket_type.kind.to_string(),
            got: details.kind().to_string(),
        });
    }

    if ticket_type.max_purchases > 0 {
        let sold = crate::core::catalog::purchases_count(&txn, ticket_type.id).await?;
        #[allow(clippy::cast_sign_loss)]
        let limit = ticket_type.max_purchases as u32;
        if sold >= u64::from(limit) {
            return Err(Error::CapacityExceeded {
                ticket_type: ticket_type.name,
                limit,
            });
        }
    }

    let voucher_id = resolve_voucher(&txn, &ticket_type, voucher_code).await?;

    let now = Utc::now();
    let mut model = ticket::ActiveModel {
        purchase_id: Set(purchase.id),
        ticket_type_id: Set(ticket_type.id),
        user_id: Set(None),
        kind: Set(details.kind()),
        canceled: Set(false),
        date_added: Set(now),
        voucher_id: Set(voucher_id),
        first_name: Set(None),
        last_name: Set(None),
        organisation: Set(None),
        shirt_size: Set(None),
        email: Set(None),
        sim_id: Set(None),
        ..Default::default()
    };

    match details {
        TicketDetails::Venue {
            first_name,
            last_name,
            organisation,
            shirt_size,
        } => {
            model.first_name = Set(Some(first_name));
            model.last_name = Set(Some(last_name));
            model.organisation = Set(Some(organisation));
            model.shirt_size = Set(shirt_size);
        }
        TicketDetails::Support => {}
        TicketDetails::SimCard {
            first_name,
            last_name,
            email,
            sim_id,
        } => {
            model.first_name = Set(Some(first_name));
            model.last_name = Set(Some(last_name));
            model.email = Set(Some(email));
            model.sim_id = Set(sim_id);
        }
    }

    let result = model.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Attached ticket {} (type '{}') to purchase {}.",
        result.id, ticket_type_id, purchase_id
    );
    Ok(result)
}

/// Validates and consumes the voucher for an attach, inside the attach
/// transaction. Returns the consumed voucher id, if any.
async fn resolve_voucher<C>(
    conn: &C,
    ticket_type: &ticket_type::Model,
    voucher_code: Option<&str>,
) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let Some(code) = voucher_code else {
        if let Some(required) = ticket_type.voucher_type_id {
            return Err(Error::VoucherInvalid {
                code: String::new(),
                message: format!(
                    "ticket type '{}' requires a voucher of type {}",
                    ticket_type.name, required
                ),
            });
        }
        return Ok(None);
    };

    let voucher = crate::entities::Voucher::find()
        .filter(voucher::Column::Code.eq(code))
        .one(conn)
        .await?
        .ok_or_else(|| Error::VoucherNotFound {
            code: code.to_string(),
        })?;

    if let Some(required) = ticket_type.voucher_type_id {
        if voucher.voucher_type_id != Some(required) {
            return Err(Error::VoucherInvalid {
                code: voucher.code,
                message: format!(
                    "voucher type does not match the one required by '{}'",
                    ticket_type.name
                ),
            });
        }
    }

    crate::core::voucher::validate(&voucher, Utc::now())?;
    crate::core::voucher::consume(conn, &voucher).await?;
    Ok(Some(voucher.id))
}

/// Cancels a ticket.
///
/// Idempotent: canceling an already-canceled ticket is a no-op. The row is
/// kept for audit and the purchase state/total are untouched; the caller
/// recomputes the total.
pub async fn cancel_ticket(db: &DatabaseConnection, ticket_id: i64) -> Result<ticket::Model> {
    let ticket = Ticket::find_by_id(ticket_id)
        .one(db)
        .await?
        .ok_or(Error::TicketNotFound { id: ticket_id })?;

    if ticket.canceled {
        debug!("Ticket {} already canceled, nothing to do.", ticket_id);
        return Ok(ticket);
    }

    let mut active: ticket::ActiveModel = ticket.into();
    active.canceled = Set(true);
    let updated = active.update(db).await?;

    info!("Ticket {} canceled.", ticket_id);
    Ok(updated)
}

/// The user a ticket effectively belongs to: the assigned user if present,
/// else the purchase's buyer.
#[must_use]
pub fn effective_owner<'a>(
    ticket: &'a ticket::Model,
    purchase: &'a purchase::Model,
) -> Option<&'a str> {
    ticket.user_id.as_deref().or(purchase.user_id.as_deref())
}

/// Whether `user` may edit the ticket at `at_time`.
///
/// True only if the type permits editing (explicit flag, else the
/// conference-wide default), neither the type-level nor the
/// conference-level edit deadline has passed, and the user is the assigned
/// ticket user or the buyer when no user is assigned. Returns false on any
/// unmet condition; never errors.
#[must_use]
pub fn can_be_edited_by(
    ticket: &ticket::Model,
    ticket_type: &ticket_type::Model,
    purchase: &purchase::Model,
    conference: &ConferenceConfig,
    user: &str,
    at_time: DateTimeUtc,
) -> bool {
    if ticket_type.allow_editing == Some(false) {
        return false;
    }
    if ticket_type.allow_editing.is_none() && !conference.tickets_editable {
        return false;
    }

    let is_owner = match ticket.user_id.as_deref() {
        Some(assigned) => assigned == user,
        None => purchase.user_id.as_deref() == Some(user),
    };
    if !is_owner {
        return false;
    }

    if let Some(deadline) = ticket_type.editable_until {
        if deadline < at_time {
            return false;
        }
    }
    if let Some(deadline) = conference.tickets_editable_until {
        if deadline < at_time {
            return false;
        }
    }
    true
}

/// Assigns a ticket to a different end user than the purchaser, or clears
/// the assignment with None.
pub async fn assign_ticket(
    db: &DatabaseConnection,
    ticket_id: i64,
    user_id: Option<String>,
) -> Result<ticket::Model> {
    let ticket = Ticket::find_by_id(ticket_id)
        .one(db)
        .await?
        .ok_or(Error::TicketNotFound { id: ticket_id })?;

    let mut active: ticket::ActiveModel = ticket.into();
    active.user_id = Set(user_id);
    active.update(db).await.map_err(Into::into)
}

/// All non-canceled tickets of paid purchases that belong to a user:
/// purchased by them and unassigned, or assigned to them.
pub async fn active_user_tickets(
    db: &DatabaseConnection,
    user: &str,
) -> Result<Vec<ticket::Model>> {
    Ticket::find()
        .filter(ticket::Column::Canceled.eq(false))
        .inner_join(Purchase)
        .filter(purchase::Column::State.eq(PurchaseState::PaymentReceived))
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(purchase::Column::UserId.eq(user))
                        .add(ticket::Column::UserId.is_null()),
                )
                .add(ticket::Column::UserId.eq(user)),
        )
        .all(db)
        .await
        .map_err(Into::into)
}
