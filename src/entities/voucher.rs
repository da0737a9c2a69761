//! Voucher entity - a single-use discount/eligibility code.
//!
//! A voucher is consumed at ticket-attach time; the `is_used` flag flips
//! exactly once and is never reset. Codes are auto-generated when left
//! blank at creation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Redemption code, 12 characters, generated when left blank
    #[sea_orm(unique)]
    pub code: String,
    /// Free-form organizer remarks
    pub remarks: String,
    /// The voucher is valid until this instant
    pub date_valid: DateTimeUtc,
    /// Flipped irreversibly on redemption
    pub is_used: bool,
    /// Voucher category, matched against `ticket_type.voucher_type_id`
    pub voucher_type_id: Option<i64>,
}

/// Defines relationships between Voucher and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The voucher's category
    #[sea_orm(
        belongs_to = "super::voucher_type::Entity",
        from = "Column::VoucherTypeId",
        to = "super::voucher_type::Column::Id"
    )]
    VoucherType,
    /// The ticket that consumed this voucher, if any
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::voucher_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VoucherType.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
