//! Voucher type entity - a named voucher category.
//!
//! Ticket types may require a voucher of a specific type; redeeming a
//! voucher of the wrong type is rejected.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voucher_types")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Speaker", "Sponsor")
    pub name: String,
}

/// Defines relationships between VoucherType and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One voucher type has many vouchers
    #[sea_orm(has_many = "super::voucher::Entity")]
    Vouchers,
    /// Ticket types restricted to this voucher type
    #[sea_orm(has_many = "super::ticket_type::Entity")]
    TicketTypes,
}

impl Related<super::voucher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vouchers.def()
    }
}

impl Related<super::ticket_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
