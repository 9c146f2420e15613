//! Due-ledger business logic
//!
//! Tracks collections against a customer's opening due, the legacy balance
//! carried in from before the tracker. The invariant is linear bookkeeping:
//! every mutation adjusts `opening_due` by exactly the signed delta it
//! introduces, through the same atomic column update the payment reconciler
//! uses, so adding, editing, and deleting a due payment always leaves the
//! balance where the arithmetic says it should be.

use crate::{
    core::customer,
    entities::{DuePayment, due_payment},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Records a collection against the customer's opening due.
///
/// Inserts the due-payment row and decrements `opening_due` by `amount` in
/// one transaction. The balance may go negative; that is an overpayment the
/// customer holds as credit.
pub async fn add_due_payment(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
    amount: f64,
    date: NaiveDate,
    note: Option<String>,
) -> Result<due_payment::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    customer::require_customer(&txn, account_id, customer_id).await?;

    let model = due_payment::ActiveModel {
        account_id: Set(account_id.to_string()),
        customer_id: Set(customer_id),
        amount: Set(amount),
        date: Set(date),
        note: Set(note),
        recorded_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let inserted = model.insert(&txn).await?;

    // Collected money comes off the outstanding balance
    customer::adjust_opening_due_atomic(&txn, customer_id, -amount).await?;

    txn.commit().await?;

    Ok(inserted)
}

/// Corrects a recorded due payment.
///
/// The row's amount, date, and note are replaced (a `None` note clears the
/// stored one), and `opening_due` moves by the difference between the new
/// and old amounts. Raising the collected amount lowers the balance further;
/// lowering it gives the difference back.
pub async fn update_due_payment(
    db: &DatabaseConnection,
    account_id: &str,
    due_payment_id: i64,
    new_amount: f64,
    new_date: NaiveDate,
    new_note: Option<String>,
) -> Result<due_payment::Model> {
    if !new_amount.is_finite() || new_amount <= 0.0 {
        return Err(Error::InvalidAmount { amount: new_amount });
    }

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    let existing = DuePayment::find_by_id(due_payment_id)
        .filter(due_payment::Column::AccountId.eq(account_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "due payment",
            id: due_payment_id.to_string(),
        })?;

    customer::require_customer(&txn, account_id, existing.customer_id).await?;

    let customer_id = existing.customer_id;
    let delta = new_amount - existing.amount;

    let mut active: due_payment::ActiveModel = existing.into();
    active.amount = Set(new_amount);
    active.date = Set(new_date);
    active.note = Set(new_note);
    let updated = active.update(&txn).await?;

    if delta != 0.0 {
        customer::adjust_opening_due_atomic(&txn, customer_id, -delta).await?;
    }

    txn.commit().await?;

    Ok(updated)
}

/// Removes a due payment, giving its full amount back to `opening_due`.
pub async fn delete_due_payment(
    db: &DatabaseConnection,
    account_id: &str,
    due_payment_id: i64,
) -> Result<()> {
    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    let existing = DuePayment::find_by_id(due_payment_id)
        .filter(due_payment::Column::AccountId.eq(account_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "due payment",
            id: due_payment_id.to_string(),
        })?;

    let customer_id = existing.customer_id;
    let amount_to_restore = existing.amount;

    existing.delete(&txn).await?;

    // Full reversal of the collection
    customer::adjust_opening_due_atomic(&txn, customer_id, amount_to_restore).await?;

    txn.commit().await?;
    Ok(())
}

/// Retrieves all due payments of a customer, newest collection first.
pub async fn get_due_payments_for_customer(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<Vec<due_payment::Model>> {
    DuePayment::find()
        .filter(due_payment::Column::AccountId.eq(account_id))
        .filter(due_payment::Column::CustomerId.eq(customer_id))
        .order_by_desc(due_payment::Column::Date)
        .order_by_desc(due_payment::Column::RecordedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
