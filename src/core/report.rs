//! Read-only reporting over finalized purchases.
//!
//! Provides the invoice line items with their per-variant titles, the
//! subtotal/tax/total breakdown for a purchase and the badge rows for paid
//! venue tickets. Everything here reads the aggregate as-is; nothing in
//! this module mutates state.

use crate::{
    config::conference::ConferenceConfig,
    core::catalog,
    entities::{
        PurchaseState, Ticket, TicketKind, purchase, ticket, ticket_type,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, prelude::*};

/// One line of an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    /// Human-readable item title, variant dependent
    pub title: String,
    /// Fee in EUR, tax inclusive
    pub fee: f64,
}

/// Invoice breakdown for a single purchase.
#[derive(Debug, Clone)]
pub struct PurchaseReport {
    /// The purchase being reported on
    pub purchase: purchase::Model,
    /// One line per non-canceled ticket
    pub lines: Vec<InvoiceLine>,
    /// Net amount (total minus included tax)
    pub subtotal: f64,
    /// Included tax
    pub tax: f64,
    /// Tax-inclusive total
    pub total: f64,
}

/// One badge to print for a paid venue ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeData {
    /// Attendee first name
    pub first_name: String,
    /// Attendee last name
    pub last_name: String,
    /// Attendee organisation, may be empty
    pub organisation: String,
    /// Desired T-shirt size
    pub shirt_size: Option<String>,
    /// Name of the ticket type the badge belongs to
    pub ticket_type_name: String,
}

/// The title a ticket appears under on the invoice.
///
/// Venue tickets name the attendee, SIM tickets the card holder, support
/// tickets just quote the type.
#[must_use]
pub fn invoice_item_title(ticket: &ticket::Model, ticket_type: &ticket_type::Model) -> String {
    let first = ticket.first_name.as_deref().unwrap_or_default();
    let last = ticket.last_name.as_deref().unwrap_or_default();
    match ticket.kind {
        TicketKind::Venue => {
            format!("\u{201c}{}\u{201d} Ticket for: {first} {last}", ticket_type.name)
        }
        TicketKind::Support => format!("\u{201c}{}\u{201d}", ticket_type.name),
        TicketKind::SimCard => format!("SIM Card for: {first} {last}"),
    }
}

/// Builds the invoice breakdown for a purchase.
///
/// Lines cover the non-canceled tickets; the tax portion is computed from
/// the configured rate over the tax-inclusive total.
pub async fn purchase_report(
    db: &DatabaseConnection,
    purchase_id: i64,
    conference: &ConferenceConfig,
) -> Result<PurchaseReport> {
    let purchase = crate::core::purchase::get_purchase_by_id(db, purchase_id)
        .await?
        .ok_or(Error::PurchaseNotFound { id: purchase_id })?;

    let tickets = Ticket::find()
        .filter(ticket::Column::PurchaseId.eq(purchase_id))
        .filter(ticket::Column::Canceled.eq(false))
        .find_also_related(crate::entities::TicketType)
        .all(db)
        .await?;

    let mut lines = Vec::with_capacity(tickets.len());
    let mut total = 0.0;
    for (t, tt) in &tickets {
        let tt = tt.as_ref().ok_or(Error::TicketTypeNotFound {
            id: t.ticket_type_id,
        })?;
        lines.push(InvoiceLine {
            title: invoice_item_title(t, tt),
            fee: tt.fee,
        });
        total += tt.fee;
    }

    let tax = catalog::tax(total, conference.tax_rate);

    Ok(PurchaseReport {
        purchase,
        lines,
        subtotal: total - tax,
        tax,
        total,
    })
}

/// Badge rows for all non-canceled venue tickets of paid purchases.
pub async fn badge_data(db: &DatabaseConnection) -> Result<Vec<BadgeData>> {
    let tickets = Ticket::find()
        .filter(ticket::Column::Kind.eq(TicketKind::Venue))
        .filter(ticket::Column::Canceled.eq(false))
        .inner_join(crate::entities::Purchase)
        .filter(purchase::Column::State.eq(PurchaseState::PaymentReceived))
        .order_by_asc(ticket::Column::Id)
        .find_also_related(crate::entities::TicketType)
        .all(db)
        .await?;

    let mut badges = Vec::with_capacity(tickets.len());
    for (t, tt) in tickets {
        let tt = tt.ok_or(Error::TicketTypeNotFound {
            id: t.ticket_type_id,
        })?;
        badges.push(BadgeData {
            first_name: t.first_name.unwrap_or_default(),
            last_name: t.last_name.unwrap_or_default(),
            organisation: t.organisation.unwrap_or_default(),
            shirt_size: t.shirt_size,
            ticket_type_name: tt.name,
        });
    }
    Ok(badges)
}
