//! Core business logic - framework-agnostic purchase, ticket, voucher and
//! invoicing operations. Nothing in here knows about HTTP, templates or
//! mail transport; outbound effects go through [`crate::jobs`].

pub mod catalog;
pub mod invoice;
pub mod purchase;
pub mod report;
pub mod ticket;
pub mod voucher;
