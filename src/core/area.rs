//! Area business logic
//!
//! Areas are the named zones customers are grouped under (a street, a block,
//! a neighborhood). Names are unique per account, compared
//! case-insensitively, and deleting an area detaches its customers rather
//! than touching them in any other way.

use crate::{
    entities::{Area, Customer, area, customer},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Creates a new area with a unique name within the account.
///
/// The name is trimmed; an empty result is rejected with
/// [`Error::InvalidAreaName`]. Uniqueness is case-insensitive, so "North" and
/// "north" collide with [`Error::AreaAlreadyExists`]. The check and the
/// insert run in one transaction.
pub async fn create_area(
    db: &DatabaseConnection,
    account_id: &str,
    name: &str,
) -> Result<area::Model> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidAreaName {
            name: name.to_string(),
        });
    }

    let txn = db.begin().await?;

    let existing = Area::find()
        .filter(area::Column::AccountId.eq(account_id))
        .all(&txn)
        .await?;
    let needle = trimmed.to_lowercase();
    if existing.iter().any(|a| a.name.to_lowercase() == needle) {
        return Err(Error::AreaAlreadyExists {
            name: trimmed.to_string(),
        });
    }

    let model = area::ActiveModel {
        account_id: Set(account_id.to_string()),
        name: Set(trimmed.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let inserted = model.insert(&txn).await?;

    txn.commit().await?;

    Ok(inserted)
}

/// Retrieves all areas of an account, ordered alphabetically by name.
pub async fn get_all_areas(db: &DatabaseConnection, account_id: &str) -> Result<Vec<area::Model>> {
    Area::find()
        .filter(area::Column::AccountId.eq(account_id))
        .order_by_asc(area::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes an area and detaches every customer assigned to it.
///
/// Customers keep all their data; only their `area_id` is cleared, in the
/// same transaction that removes the area row.
pub async fn delete_area(db: &DatabaseConnection, account_id: &str, area_id: i64) -> Result<()> {
    use sea_orm::sea_query::Expr;

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    let existing = Area::find_by_id(area_id)
        .filter(area::Column::AccountId.eq(account_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "area",
            id: area_id.to_string(),
        })?;

    // Detach referencing customers before the row disappears
    Customer::update_many()
        .col_expr(customer::Column::AreaId, Expr::value(None::<i64>))
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::AreaId.eq(area_id))
        .exec(&txn)
        .await?;

    existing.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}
