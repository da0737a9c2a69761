//! Ticket type entity - a purchasable product definition.
//!
//! Ticket types carry the fee (tax inclusive), the sale window, an optional
//! purchase limit and the editability rules for tickets created from them.
//! The product number is assigned once, at first persistence, and never
//! changes; types referenced by tickets are deactivated, never deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ticket::TicketKind;

/// Ticket type database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_types")]
pub struct Model {
    /// Unique identifier for the ticket type
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sequential product number, assigned at creation and immutable
    #[sea_orm(unique)]
    pub product_number: i32,
    /// Human-readable name (e.g., "Conference Ticket", "Supporter")
    pub name: String,
    /// Fee in EUR, inclusive of tax
    pub fee: f64,
    /// Maximum number of purchasable tickets of this type; 0 means no limit
    pub max_purchases: i32,
    /// Inactive types are hidden from the purchase flow
    pub is_active: bool,
    /// Sale window start
    pub date_valid_from: DateTimeUtc,
    /// Sale window end
    pub date_valid_to: DateTimeUtc,
    /// Voucher type a buyer must redeem to purchase this type, if any
    pub voucher_type_id: Option<i64>,
    /// Explicit edit permission; None falls back to the conference default
    pub allow_editing: Option<bool>,
    /// Type-level deadline after which tickets can no longer be edited
    pub editable_until: Option<DateTimeUtc>,
    /// Purchases containing only tickets of such types get no invoice mail
    /// (useful for sponsor tickets)
    pub prevent_invoice: bool,
    /// Which ticket variant this type generates
    pub kind: TicketKind,
}

/// Defines relationships between TicketType and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One ticket type has many tickets
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
    /// The voucher type required to purchase this ticket type
    #[sea_orm(
        belongs_to = "super::voucher_type::Entity",
        from = "Column::VoucherTypeId",
        to = "super::voucher_type::Column::Id"
    )]
    VoucherType,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::voucher_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
