//! Shared test utilities for `billkeeper`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{account, billing, customer},
    entities,
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set};

/// The account every default fixture is scoped to.
pub const TEST_ACCOUNT: &str = "test-account";

/// Builds a `NaiveDate` from literals; panics only on impossible dates.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Initializes tracing with a test writer so `cargo test` captures output.
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Provisions the default test account with a 30-day trial starting now.
pub async fn create_test_account(db: &DatabaseConnection) -> Result<entities::account::Model> {
    account::ensure_account(db, TEST_ACCOUNT, Utc::now(), 30).await
}

/// Creates a test customer with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Customer name
///
/// # Defaults
/// * account: [`TEST_ACCOUNT`]
/// * `monthly_bill`: 500.0
/// * `start_date`: 2024-01-01
/// * `opening_due`: 0.0
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    create_custom_customer(db, TEST_ACCOUNT, name, 500.0, date(2024, 1, 1), 0.0).await
}

/// Creates a test customer with custom parameters.
/// Use this when a test needs a specific account, schedule, or balance.
pub async fn create_custom_customer(
    db: &DatabaseConnection,
    account_id: &str,
    name: &str,
    monthly_bill: f64,
    start_date: NaiveDate,
    opening_due: f64,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        account_id,
        customer::NewCustomer {
            profile: customer::CustomerProfile {
                name: name.to_string(),
                phone: None,
                address: None,
                area_id: None,
                monthly_bill,
            },
            start_date,
            opening_due,
        },
    )
    .await
}

/// Creates an unpaid test bill under [`TEST_ACCOUNT`], bypassing the
/// generator so tests can shape bill sets directly.
pub async fn create_test_bill(
    db: &DatabaseConnection,
    customer_id: i64,
    year: i32,
    month: u32,
    amount: f64,
) -> Result<entities::bill::Model> {
    create_custom_bill(db, TEST_ACCOUNT, customer_id, year, month, amount).await
}

/// Creates an unpaid test bill with an explicit account scope.
pub async fn create_custom_bill(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
    year: i32,
    month: u32,
    amount: f64,
) -> Result<entities::bill::Model> {
    use sea_orm::ActiveModelTrait;

    let bill = entities::bill::ActiveModel {
        account_id: Set(account_id.to_string()),
        customer_id: Set(customer_id),
        year: Set(year),
        month: Set(i32::try_from(month).unwrap()),
        amount: Set(amount),
        status: Set(billing::BillStatus::Unpaid.as_str().to_string()),
        due_date: Set(billing::last_day_of_month(year, month).unwrap()),
        paid_date: Set(None),
        payment_id: Set(None),
        paid_amount: Set(None),
        ..Default::default()
    };
    bill.insert(db).await.map_err(Into::into)
}

/// Sets up a complete test environment with a customer.
/// Returns (db, customer) for common test scenarios.
pub async fn setup_with_customer() -> Result<(DatabaseConnection, entities::customer::Model)> {
    let db = setup_test_db().await?;
    let customer = create_test_customer(&db, "Test Customer").await?;
    Ok((db, customer))
}
