//! Customer business logic - Handles all customer-related operations.
//!
//! Provides functions for creating, retrieving, updating, and managing
//! customers, plus the single entry point for mutating the opening-due
//! balance (`adjust_opening_due_atomic`). All functions are async and return
//! Result types for error handling. Every read and mutation is scoped to the
//! owning account.

use crate::{
    entities::{Customer, customer},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Connection status of a customer, stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Service is running; monthly bills are generated
    Active,
    /// Service ended; no bills are generated
    Inactive,
    /// Service temporarily suspended; no bills are generated
    Paused,
}

impl ConnectionStatus {
    /// The stored string form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Paused => "paused",
        }
    }

    /// Parses a stored status string. Unknown strings yield `None` so stale
    /// data degrades to "not active" rather than panicking.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable profile fields of a customer.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    /// Customer name
    pub name: String,
    /// Optional contact phone number
    pub phone: Option<String>,
    /// Optional street address
    pub address: Option<String>,
    /// Optional area id the customer belongs to
    pub area_id: Option<i64>,
    /// Recurring monthly bill amount
    pub monthly_bill: f64,
}

/// Everything needed to create a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    /// Profile fields (name, contacts, area, monthly bill)
    pub profile: CustomerProfile,
    /// Date the service starts; bill generation begins with this month
    pub start_date: NaiveDate,
    /// Initial legacy balance carried into the tracker (may be negative)
    pub opening_due: f64,
}

fn validate_profile(profile: &CustomerProfile) -> Result<()> {
    if profile.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Customer name cannot be empty".to_string(),
        });
    }
    if !profile.monthly_bill.is_finite() || profile.monthly_bill < 0.0 {
        return Err(Error::InvalidAmount {
            amount: profile.monthly_bill,
        });
    }
    Ok(())
}

/// Retrieves all active (non-deleted) customers of an account, ordered
/// alphabetically by name.
pub async fn get_all_customers(
    db: &DatabaseConnection,
    account_id: &str,
) -> Result<Vec<customer::Model>> {
    Customer::find()
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::IsDeleted.eq(false))
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a customer by id within the account scope, returning `None` if the
/// customer does not exist, belongs to another account, or is deleted.
pub async fn get_customer_by_id(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<Option<customer::Model>> {
    Customer::find_by_id(customer_id)
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a customer the way mutations need it: missing, foreign, and deleted
/// rows all surface as [`Error::CustomerNotFound`]. Works inside a
/// transaction or on a plain connection.
pub async fn require_customer<C>(
    db: &C,
    account_id: &str,
    customer_id: i64,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    let found = Customer::find_by_id(customer_id)
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::IsDeleted.eq(false))
        .one(db)
        .await?;

    found.ok_or_else(|| Error::CustomerNotFound {
        id: customer_id.to_string(),
    })
}

/// Creates a new customer with `connection_status = active`, performing input
/// validation.
///
/// The name must be non-empty after trimming and the monthly bill must be a
/// finite, non-negative amount. The opening due may be negative (a carried
/// credit) but must be finite.
pub async fn create_customer(
    db: &DatabaseConnection,
    account_id: &str,
    new: NewCustomer,
) -> Result<customer::Model> {
    validate_profile(&new.profile)?;
    if !new.opening_due.is_finite() {
        return Err(Error::InvalidAmount {
            amount: new.opening_due,
        });
    }

    let customer = customer::ActiveModel {
        account_id: Set(account_id.to_string()),
        name: Set(new.profile.name.trim().to_string()),
        phone: Set(new.profile.phone),
        address: Set(new.profile.address),
        area_id: Set(new.profile.area_id),
        monthly_bill: Set(new.profile.monthly_bill),
        connection_status: Set(ConnectionStatus::Active.as_str().to_string()),
        start_date: Set(new.start_date),
        opening_due: Set(new.opening_due),
        reactivation_date: Set(None),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = customer.insert(db).await?;
    Ok(result)
}

/// Replaces the editable profile fields of a customer.
///
/// Start date, opening due, and connection status are not touched here;
/// the ledger operations and `set_connection_status` own those.
pub async fn update_customer_profile(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
    profile: CustomerProfile,
) -> Result<customer::Model> {
    validate_profile(&profile)?;

    let existing = require_customer(db, account_id, customer_id).await?;

    let mut active: customer::ActiveModel = existing.into();
    active.name = Set(profile.name.trim().to_string());
    active.phone = Set(profile.phone);
    active.address = Set(profile.address);
    active.area_id = Set(profile.area_id);
    active.monthly_bill = Set(profile.monthly_bill);
    active.update(db).await.map_err(Into::into)
}

/// Changes a customer's connection status.
///
/// Moving from a non-active status back to `active` stamps
/// `reactivation_date` with the given date; all other transitions leave the
/// stamp as it was.
pub async fn set_connection_status(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
    status: ConnectionStatus,
    on: NaiveDate,
) -> Result<customer::Model> {
    let existing = require_customer(db, account_id, customer_id).await?;
    let was_active = ConnectionStatus::parse(&existing.connection_status)
        == Some(ConnectionStatus::Active);

    let mut active: customer::ActiveModel = existing.into();
    active.connection_status = Set(status.as_str().to_string());
    if status == ConnectionStatus::Active && !was_active {
        active.reactivation_date = Set(Some(on));
    }
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a customer. Bills, payments, and due payments are preserved;
/// the customer simply disappears from listings and lookups.
pub async fn delete_customer(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<()> {
    let existing = require_customer(db, account_id, customer_id).await?;

    let mut active: customer::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}

/// Adjusts a customer's opening-due balance by atomically adding a delta.
///
/// This is the only place `opening_due` is mutated. Instead of reading the
/// current balance, modifying it, and writing it back (which can lose updates
/// between concurrent mutations), this issues a single SQL UPDATE:
/// `UPDATE customers SET opening_due = opening_due + delta WHERE id = ?`
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `customer_id` - ID of the customer to adjust
/// * `delta` - Amount to add to the balance (negative to subtract)
///
/// # Returns
/// The updated customer model
pub async fn adjust_opening_due_atomic<C>(
    db: &C,
    customer_id: i64,
    delta: f64,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    // First verify the customer exists
    let _customer = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            id: customer_id.to_string(),
        })?;

    // Perform atomic update: opening_due = opening_due + delta
    Customer::update_many()
        .col_expr(
            customer::Column::OpeningDue,
            Expr::col(customer::Column::OpeningDue).add(delta),
        )
        .filter(customer::Column::Id.eq(customer_id))
        .exec(db)
        .await?;

    // Return the updated customer
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            id: customer_id.to_string(),
        })
}
