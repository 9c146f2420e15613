//! Database configuration module for `billkeeper`.
//!
//! Handles `SQLite` connection and table creation using `SeaORM`. The schema
//! is generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database always matches the
//! Rust struct definitions without hand-written SQL.

use crate::entities::{Account, Area, Bill, Customer, DuePayment, Payment};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default local `SQLite` path.
pub fn get_database_url() -> Result<String> {
    Ok(std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/billkeeper.sqlite".to_string()))
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL`
/// environment variable, falling back to a default local file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables using `SeaORM`'s schema generation from the entity
/// definitions: accounts, areas, customers, bills, payments, and due
/// payments. Existing tables are left alone, so this is safe to run on
/// every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(Account),
        schema.create_table_from_entity(Area),
        schema.create_table_from_entity(Customer),
        schema.create_table_from_entity(Payment),
        schema.create_table_from_entity(Bill),
        schema.create_table_from_entity(DuePayment),
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
        AccountModel, AreaModel, BillModel, CustomerModel, DuePaymentModel, PaymentModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        // In-memory database keeps the test isolated from any local file
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Each table exists and is queryable
        let _: Vec<AccountModel> = Account::find().limit(1).all(&db).await?;
        let _: Vec<AreaModel> = Area::find().limit(1).all(&db).await?;
        let _: Vec<CustomerModel> = Customer::find().limit(1).all(&db).await?;
        let _: Vec<BillModel> = Bill::find().limit(1).all(&db).await?;
        let _: Vec<PaymentModel> = Payment::find().limit(1).all(&db).await?;
        let _: Vec<DuePaymentModel> = DuePayment::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        Ok(())
    }

    #[test]
    fn test_get_database_url_default() -> Result<()> {
        // Without DATABASE_URL set this falls back to the bundled path; with
        // it set, any non-empty URL is acceptable
        let url = get_database_url()?;
        assert!(!url.is_empty());

        Ok(())
    }
}
