//! Database configuration module for the ticketing core.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL.

use crate::entities::{Purchase, Ticket, TicketType, Voucher, VoucherType};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/ticketdesk.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Tables are created in dependency order: voucher types before vouchers and
/// ticket types, purchases before tickets. Unique constraints (voucher code,
/// product number, invoice number) come straight from the entity definitions;
/// the invoice number uniqueness is what turns a concurrent double allocation
/// into a constraint violation instead of a duplicate number.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(VoucherType),
        schema.create_table_from_entity(Voucher),
        schema.create_table_from_entity(TicketType),
        schema.create_table_from_entity(Purchase),
        schema.create_table_from_entity(Ticket),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        purchase::Model as PurchaseModel, ticket::Model as TicketModel,
        ticket_type::Model as TicketTypeModel, voucher::Model as VoucherModel,
        voucher_type::Model as VoucherTypeModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<TicketTypeModel> = TicketType::find().limit(1).all(&db).await?;
        let _: Vec<VoucherModel> = Voucher::find().limit(1).all(&db).await?;
        let _: Vec<VoucherTypeModel> = VoucherType::find().limit(1).all(&db).await?;
        let _: Vec<PurchaseModel> = Purchase::find().limit(1).all(&db).await?;
        let _: Vec<TicketModel> = Ticket::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_default_database_url() {
        // Only checks the fallback shape; DATABASE_URL may be set in CI
        let url = get_database_url();
        assert!(url.starts_with("sqlite:"));
    }
}
