//! Shared test utilities for the ticketing core.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

use crate::{
    config::{AppConfig, conference::ConferenceConfig, ticket_types::TicketTypeConfig},
    core::{
        catalog::{self, NewTicketType},
        purchase::NewPurchase,
        ticket::TicketDetails,
        voucher,
    },
    entities::{self, PaymentMethod, PurchaseState, TicketKind},
    errors::Result,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Conference configuration with all defaults (19% tax, `INVOICE` prefix,
/// product numbers from 1000, ticket editing closed).
#[must_use]
pub fn test_conference() -> ConferenceConfig {
    ConferenceConfig::default()
}

/// Ticket type parameters with sensible defaults: venue kind, active, on
/// sale from yesterday for 30 days, no limit, no voucher requirement.
#[must_use]
pub fn test_new_ticket_type(name: &str, fee: f64) -> NewTicketType {
    let now = Utc::now();
    NewTicketType {
        name: name.to_string(),
        fee,
        max_purchases: 0,
        is_active: true,
        date_valid_from: now - Duration::days(1),
        date_valid_to: now + Duration::days(30),
        voucher_type_id: None,
        allow_editing: None,
        editable_until: None,
        prevent_invoice: false,
        kind: TicketKind::Venue,
    }
}

/// Creates a test ticket type with sensible defaults.
pub async fn create_test_ticket_type(
    db: &DatabaseConnection,
    name: &str,
    fee: f64,
) -> Result<entities::ticket_type::Model> {
    catalog::create_ticket_type(db, &test_conference(), test_new_ticket_type(name, fee)).await
}

/// Creates a test ticket type of a specific variant.
pub async fn create_custom_ticket_type(
    db: &DatabaseConnection,
    name: &str,
    fee: f64,
    kind: TicketKind,
) -> Result<entities::ticket_type::Model> {
    let mut new = test_new_ticket_type(name, fee);
    new.kind = kind;
    catalog::create_ticket_type(db, &test_conference(), new).await
}

/// Buyer details with sensible defaults (Jane Doe, paying by invoice,
/// authenticated as user "buyer").
#[must_use]
pub fn test_new_purchase() -> NewPurchase {
    NewPurchase {
        user_id: Some("buyer".to_string()),
        company_name: String::new(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        street: "Musterstr. 1".to_string(),
        zip_code: "10115".to_string(),
        city: "Berlin".to_string(),
        country: "Germany".to_string(),
        vat_id: String::new(),
        comments: String::new(),
        payment_method: PaymentMethod::Invoice,
    }
}

/// Creates a test purchase in the `new` state, ready for ticket attachment
/// and invoicing.
pub async fn create_test_purchase(
    db: &DatabaseConnection,
) -> Result<entities::purchase::Model> {
    create_test_purchase_in_state(db, PurchaseState::New).await
}

/// Creates a test purchase directly in the given state.
///
/// Bypasses the transition rules on purpose; tests that need a purchase in
/// a terminal state should not have to walk the whole state machine (and
/// must not trigger its side effects).
pub async fn create_test_purchase_in_state(
    db: &DatabaseConnection,
    state: PurchaseState,
) -> Result<entities::purchase::Model> {
    let purchase = crate::core::purchase::create_purchase(db, test_new_purchase()).await?;
    if state == PurchaseState::Incomplete {
        return Ok(purchase);
    }

    let mut active: entities::purchase::ActiveModel = purchase.into();
    active.state = Set(state);
    active.update(db).await.map_err(Into::into)
}

/// Creates a test voucher valid until `days_from_now` days from now (use a
/// negative value for an already-expired voucher). The code is generated.
pub async fn create_test_voucher(
    db: &DatabaseConnection,
    days_from_now: i64,
) -> Result<entities::voucher::Model> {
    voucher::create_voucher(
        db,
        None,
        String::new(),
        Utc::now() + Duration::days(days_from_now),
        None,
    )
    .await
}

/// Venue ticket payload with sensible defaults (attendee Erika Mustermann).
#[must_use]
pub fn venue_details() -> TicketDetails {
    TicketDetails::Venue {
        first_name: "Erika".to_string(),
        last_name: "Mustermann".to_string(),
        organisation: "Example Corp".to_string(),
        shirt_size: Some("M".to_string()),
    }
}

/// Inserts a ticket row directly, bypassing the attach checks.
/// Use this to set up counting/quota scenarios without walking the rules.
pub async fn direct_insert_ticket(
    db: &DatabaseConnection,
    purchase_id: i64,
    ticket_type_id: i64,
    kind: TicketKind,
) -> Result<entities::ticket::Model> {
    let model = entities::ticket::ActiveModel {
        purchase_id: Set(purchase_id),
        ticket_type_id: Set(ticket_type_id),
        user_id: Set(None),
        kind: Set(kind),
        canceled: Set(false),
        date_added: Set(Utc::now()),
        first_name: Set(None),
        last_name: Set(None),
        organisation: Set(None),
        shirt_size: Set(None),
        voucher_id: Set(None),
        email: Set(None),
        sim_id: Set(None),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// An in-memory purchase model for pure-function tests (no database row).
#[must_use]
pub fn test_purchase_model() -> entities::purchase::Model {
    entities::purchase::Model {
        id: 1,
        user_id: Some("buyer".to_string()),
        company_name: String::new(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane@example.com".to_string(),
        street: "Musterstr. 1".to_string(),
        zip_code: "10115".to_string(),
        city: "Berlin".to_string(),
        country: "Germany".to_string(),
        vat_id: String::new(),
        date_added: Utc::now(),
        state: PurchaseState::New,
        comments: String::new(),
        payment_method: PaymentMethod::Invoice,
        payment_transaction: String::new(),
        payment_total: None,
        exported: false,
        invoice_number: None,
        invoice_filename: None,
    }
}

/// An in-memory venue ticket model belonging to the given purchase.
#[must_use]
pub fn test_ticket_model(purchase: &entities::purchase::Model) -> entities::ticket::Model {
    entities::ticket::Model {
        id: 1,
        purchase_id: purchase.id,
        ticket_type_id: 1,
        user_id: None,
        kind: TicketKind::Venue,
        canceled: false,
        date_added: Utc::now(),
        first_name: None,
        last_name: None,
        organisation: None,
        shirt_size: None,
        voucher_id: None,
        email: None,
        sim_id: None,
    }
}

/// An in-memory venue ticket type model with the given fee.
#[must_use]
pub fn test_ticket_type_model(fee: f64) -> entities::ticket_type::Model {
    let now = Utc::now();
    entities::ticket_type::Model {
        id: 1,
        product_number: 1000,
        name: "Conference Ticket".to_string(),
        fee,
        max_purchases: 0,
        is_active: true,
        date_valid_from: now - Duration::days(1),
        date_valid_to: now + Duration::days(30),
        voucher_type_id: None,
        allow_editing: None,
        editable_until: None,
        prevent_invoice: false,
        kind: TicketKind::Venue,
    }
}

/// An in-memory (ticket, ticket type) pair for total-computation tests.
#[must_use]
pub fn test_ticket_pair(
    id: i64,
    fee: f64,
    canceled: bool,
) -> (entities::ticket::Model, entities::ticket_type::Model) {
    let purchase = test_purchase_model();
    let mut ticket = test_ticket_model(&purchase);
    ticket.id = id;
    ticket.ticket_type_id = id;
    ticket.canceled = canceled;

    let mut ticket_type = test_ticket_type_model(fee);
    ticket_type.id = id;

    (ticket, ticket_type)
}

/// Application config carrying two ticket type seeds (a venue and a
/// support type), for seeding tests.
#[must_use]
pub fn test_app_config_with_seeds() -> AppConfig {
    let now = Utc::now();
    AppConfig {
        conference: ConferenceConfig::default(),
        ticket_types: vec![
            TicketTypeConfig {
                name: "Conference Ticket".to_string(),
                fee: 100.0,
                max_purchases: 0,
                is_active: true,
                date_valid_from: now - Duration::days(1),
                date_valid_to: now + Duration::days(30),
                voucher_type: None,
                allow_editing: None,
                editable_until: None,
                prevent_invoice: false,
                kind: TicketKind::Venue,
            },
            TicketTypeConfig {
                name: "Supporter".to_string(),
                fee: 250.0,
                max_purchases: 0,
                is_active: true,
                date_valid_from: now - Duration::days(1),
                date_valid_to: now + Duration::days(30),
                voucher_type: None,
                allow_editing: Some(false),
                editable_until: None,
                prevent_invoice: true,
                kind: TicketKind::Support,
            },
        ],
    }
}
