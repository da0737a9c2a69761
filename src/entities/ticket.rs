//! Ticket entity - a single purchased entitlement.
//!
//! The original system modeled venue, support and SIM-card tickets as
//! separate subclasses. Here they share one table: a `kind` tag selects the
//! variant and the variant-specific payload lives in nullable columns.
//! Canceled tickets keep their row for audit; cancellation is a flag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which concrete ticket variant a row (or a ticket type) represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    /// Conference admission ticket, names an attendee
    #[sea_orm(string_value = "venue")]
    Venue,
    /// Supporter ticket, no attendee data
    #[sea_orm(string_value = "support")]
    Support,
    /// SIM card handed out at the venue
    #[sea_orm(string_value = "sim_card")]
    SimCard,
}

impl std::fmt::Display for TicketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Venue => "venue",
            Self::Support => "support",
            Self::SimCard => "sim_card",
        };
        write!(f, "{name}")
    }
}

/// Ticket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier for the ticket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Purchase this ticket belongs to
    pub purchase_id: i64,
    /// Ticket type the ticket was created from
    pub ticket_type_id: i64,
    /// User the ticket is assigned to; None means it belongs to the buyer
    pub user_id: Option<String>,
    /// Variant tag selecting which payload columns are meaningful
    pub kind: TicketKind,
    /// Canceled tickets stay in the table but are excluded from totals
    pub canceled: bool,
    /// When the ticket was attached to its purchase
    pub date_added: DateTimeUtc,
    /// Attendee first name (venue, SIM card)
    pub first_name: Option<String>,
    /// Attendee last name (venue, SIM card)
    pub last_name: Option<String>,
    /// Attendee organisation (venue)
    pub organisation: Option<String>,
    /// Desired T-shirt size (venue)
    pub shirt_size: Option<String>,
    /// Voucher consumed when this ticket was attached (venue)
    pub voucher_id: Option<i64>,
    /// Contact e-mail of the SIM card holder (SIM card)
    pub email: Option<String>,
    /// IMSI of the SIM card associated with this ticket (SIM card)
    pub sim_id: Option<String>,
}

/// Defines relationships between Ticket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Every ticket belongs to exactly one purchase
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id"
    )]
    Purchase,
    /// Every ticket is of exactly one ticket type
    #[sea_orm(
        belongs_to = "super::ticket_type::Entity",
        from = "Column::TicketTypeId",
        to = "super::ticket_type::Column::Id"
    )]
    TicketType,
    /// A venue ticket may have consumed a voucher
    #[sea_orm(
        belongs_to = "super::voucher::Entity",
        from = "Column::VoucherId",
        to = "super::voucher::Column::Id"
    )]
    Voucher,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl Related<super::ticket_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketType.def()
    }
}

impl Related<super::voucher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Voucher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
