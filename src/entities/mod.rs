//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod purchase;
pub mod ticket;
pub mod ticket_type;
pub mod voucher;
pub mod voucher_type;

// Re-export specific types to avoid conflicts
pub use purchase::{
    Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel, PaymentMethod,
    PurchaseState,
};
pub use ticket::{Column as TicketColumn, Entity as Ticket, Model as TicketModel, TicketKind};
pub use ticket_type::{Column as TicketTypeColumn, Entity as TicketType, Model as TicketTypeModel};
pub use voucher::{Column as VoucherColumn, Entity as Voucher, Model as VoucherModel};
pub use voucher_type::{
    Column as VoucherTypeColumn, Entity as VoucherType, Model as VoucherTypeModel,
};
