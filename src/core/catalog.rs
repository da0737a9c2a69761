//! Ticket type catalog business logic.
//!
//! Provides functions for creating ticket types (with sequential product
//! number allocation), querying what is currently on sale, counting quota
//! consumption and seeding the catalog from config.toml. All functions are
//! async and return Result types for error handling.

use crate::{
    config::{AppConfig, conference::ConferenceConfig},
    entities::{
        Ticket, TicketType, VoucherType, purchase, ticket, ticket_type, voucher_type,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Parameters for creating a ticket type.
///
/// Collected in a struct because a ticket type carries a lot of independent
/// knobs; the product number is deliberately absent, it is allocated at
/// creation and never supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewTicketType {
    /// Display name
    pub name: String,
    /// Fee in EUR, tax inclusive
    pub fee: f64,
    /// Purchase limit; 0 means no limit
    pub max_purchases: i32,
    /// Whether the type is on sale
    pub is_active: bool,
    /// Sale window start
    pub date_valid_from: DateTimeUtc,
    /// Sale window end
    pub date_valid_to: DateTimeUtc,
    /// Required voucher type, if any
    pub voucher_type_id: Option<i64>,
    /// Explicit edit permission; None defers to the conference default
    pub allow_editing: Option<bool>,
    /// Type-level edit deadline
    pub editable_until: Option<DateTimeUtc>,
    /// Suppress invoice mail for purchases made up entirely of this type
    pub prevent_invoice: bool,
    /// Ticket variant generated from this type
    pub kind: crate::entities::TicketKind,
}

/// Creates a new ticket type, allocating the next sequential product number.
///
/// The allocation (max + 1, or the configured start for the first type) and
/// the insert run in one transaction so two concurrent creations cannot end
/// up with the same number; the unique constraint on `product_number` backs
/// this up at the schema level.
pub async fn create_ticket_type(
    db: &DatabaseConnection,
    conference: &ConferenceConfig,
    new: NewTicketType,
) -> Result<ticket_type::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Ticket type name cannot be empty".to_string(),
        });
    }

    if !new.fee.is_finite() || new.fee < 0.0 {
        return Err(Error::Config {
            message: format!("Ticket type fee must be a non-negative amount, got {}", new.fee),
        });
    }

    if new.max_purchases < 0 {
        return Err(Error::Config {
            message: "max_purchases cannot be negative".to_string(),
        });
    }

    let txn = db.begin().await?;

    let product_number = next_product_number(&txn, conference.product_number_start).await?;

    let model = ticket_type::ActiveModel {
        product_number: Set(product_number),
        name: Set(new.name.trim().to_string()),
        fee: Set(new.fee),
        max_purchases: Set(new.max_purchases),
        is_active: Set(new.is_active),
        date_valid_from: Set(new.date_valid_from),
        date_valid_to: Set(new.date_valid_to),
        voucher_type_id: Set(new.voucher_type_id),
        allow_editing: Set(new.allow_editing),
        editable_until: Set(new.editable_until),
        prevent_invoice: Set(new.prevent_invoice),
        kind: Set(new.kind),
        ..Default::default()
    };

    let result = model.insert(&txn).await?;
    txn.commit().await?;
    Ok(result)
}

/// Returns the product number the next ticket type will receive.
///
/// `max + 1` over existing types, or the configured start value for an
/// empty catalog.
async fn next_product_number<C>(conn: &C, start: i32) -> Result<i32>
where
    C: ConnectionTrait,
{
    let max: Option<Option<i32>> = TicketType::find()
        .select_only()
        .column_as(ticket_type::Column::ProductNumber.max(), "max_product_number")
        .into_tuple()
        .one(conn)
        .await?;

    Ok(max.flatten().map_or(start, |m| m + 1))
}

/// Retrieves the ticket types currently on sale: active, and `now` inside
/// the sale window. Ordered by product number.
pub async fn available_ticket_types(db: &DatabaseConnection) -> Result<Vec<ticket_type::Model>> {
    let now = Utc::now();
    TicketType::find()
        .filter(ticket_type::Column::IsActive.eq(true))
        .filter(ticket_type::Column::DateValidFrom.lte(now))
        .filter(ticket_type::Column::DateValidTo.gte(now))
        .order_by_asc(ticket_type::Column::ProductNumber)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a ticket type by its unique ID.
pub async fn get_ticket_type_by_id(
    db: &DatabaseConnection,
    ticket_type_id: i64,
) -> Result<Option<ticket_type::Model>> {
    TicketType::find_by_id(ticket_type_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Counts tickets of a type that consume quota.
///
/// Tickets on `incomplete` purchases are excluded: a cart in progress does
/// not hold a slot.
pub async fn purchases_count<C>(conn: &C, ticket_type_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    Ticket::find()
        .filter(ticket::Column::TicketTypeId.eq(ticket_type_id))
        .inner_join(crate::entities::Purchase)
        .filter(purchase::Column::State.ne(crate::entities::PurchaseState::Incomplete))
        .count(conn)
        .await
        .map_err(Into::into)
}

/// Returns the number of still purchasable tickets of a type, or None if
/// the type has no limit. Never negative.
pub async fn available_tickets(
    db: &DatabaseConnection,
    ticket_type: &ticket_type::Model,
) -> Result<Option<u64>> {
    if ticket_type.max_purchases < 1 {
        return Ok(None);
    }

    let sold = purchases_count(db, ticket_type.id).await?;
    #[allow(clippy::cast_sign_loss)]
    let limit = ticket_type.max_purchases as u64;
    Ok(Some(limit.saturating_sub(sold)))
}

/// Tax portion included in a tax-inclusive fee.
#[must_use]
pub fn tax(fee: f64, tax_rate: f64) -> f64 {
    fee - fee / (1.0 + tax_rate)
}

/// Net fee after removing the included tax.
#[must_use]
pub fn fee_without_tax(fee: f64, tax_rate: f64) -> f64 {
    fee / (1.0 + tax_rate)
}

/// Seeds the catalog from the `[[ticket_types]]` entries in config.toml.
///
/// Idempotent: entries whose name already exists are skipped, so the seed
/// pass can run on every startup. Referenced voucher types are created on
/// demand by name. Returns the number of ticket types created.
pub async fn seed_ticket_types(db: &DatabaseConnection, config: &AppConfig) -> Result<usize> {
    let mut created = 0;

    for seed in &config.ticket_types {
        let existing = TicketType::find()
            .filter(ticket_type::Column::Name.eq(seed.name.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let voucher_type_id = match &seed.voucher_type {
            Some(name) => Some(get_or_create_voucher_type(db, name).await?.id),
            None => None,
        };

        create_ticket_type(
            db,
            &config.conference,
            NewTicketType {
                name: seed.name.clone(),
                fee: seed.fee,
                max_purchases: seed.max_purchases,
                is_active: seed.is_active,
                date_valid_from: seed.date_valid_from,
                date_valid_to: seed.date_valid_to,
                voucher_type_id,
                allow_editing: seed.allow_editing,
                editable_until: seed.editable_until,
                prevent_invoice: seed.prevent_invoice,
                kind: seed.kind,
            },
        )
        .await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {} ticket type(s) from configuration.", created);
    }
    Ok(created)
}

/// Finds a voucher type by name, creating it if it does not exist yet.
pub async fn get_or_create_voucher_type(
    db: &DatabaseConnection,
    name: &str,
) -> Result<voucher_type::Model> {
    let existing = VoucherType::find()
        .filter(voucher_type::Column::Name.eq(name))
        .one(db)
        .await?;

    if let Some(found) = existing {
        return Ok(found);
    }

    let model = voucher_type::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}
