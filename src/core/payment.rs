//! Payment reconciliation business logic
//!
//! Records customer payments and applies them to bills, and undoes mistaken
//! payments. A payment carries an allocation list saying how much of it
//! settles which bill; allocating less than a bill's amount marks the bill
//! paid anyway and pushes the difference (the shortfall) onto the customer's
//! opening due. Each operation validates everything up front and then runs as
//! one transaction, so a rejected payment leaves no partial state behind.

use crate::{
    core::{billing::BillStatus, customer},
    entities::{Bill, Payment, bill, payment},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;

/// How much of a payment settles which bill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillAllocation {
    /// The bill being settled
    pub bill_id: i64,
    /// Portion of the payment applied to it, at most the bill's amount
    pub amount: f64,
}

/// What happens to the opening-due delta a payment introduced when that
/// payment is undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortfallPolicy {
    /// Leave `opening_due` untouched. The bills revert to unpaid but the
    /// shortfall the payment pushed onto the customer stays; this is the
    /// historical ledger behavior and the default.
    #[default]
    Keep,
    /// Subtract the payment's recorded shortfall back out of `opening_due`,
    /// making undo a full reversal.
    Reverse,
}

/// Outcome of recording one payment.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    /// The inserted payment row
    pub payment: payment::Model,
    /// Number of bills this payment marked paid
    pub bills_settled: usize,
    /// Total under-collection pushed onto the customer's opening due
    pub shortfall: f64,
}

/// Outcome of undoing one payment.
#[derive(Debug, Clone)]
pub struct UndoReport {
    /// Id of the deleted payment
    pub payment_id: i64,
    /// Number of bills reverted to unpaid
    pub bills_reverted: usize,
    /// Amount subtracted back from `opening_due` (always 0 under
    /// [`ShortfallPolicy::Keep`])
    pub shortfall_restored: f64,
}

/// Records a payment and settles the allocated bills.
///
/// Every check happens before any write: the customer must exist, every
/// allocated bill must exist, belong to the customer, appear at most once in
/// the allocation list, and still be unpaid, and no allocation may exceed
/// its bill's amount. Bills allocated less than
/// their full amount are still marked paid; the sum of those differences is
/// the payment's shortfall, which is added to the customer's `opening_due`
/// with an atomic column update and recorded on the payment row so a later
/// undo can reverse it exactly.
///
/// An empty allocation list is valid and records the collection without
/// touching any bill.
///
/// # Arguments
/// * `account_id` - Owning account scope
/// * `customer_id` - The paying customer
/// * `amount` - Total collected amount (must be finite and positive)
/// * `date` - Collection date, stamped onto settled bills as `paid_date`
/// * `allocations` - Which bills this payment settles, and with how much
/// * `note` - Optional free-form note
pub async fn record_payment(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
    amount: f64,
    date: NaiveDate,
    allocations: Vec<BillAllocation>,
    note: Option<String>,
) -> Result<PaymentReceipt> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    let mut allocated_bills = HashSet::with_capacity(allocations.len());
    for allocation in &allocations {
        if !allocation.amount.is_finite() || allocation.amount < 0.0 {
            return Err(Error::InvalidAmount {
                amount: allocation.amount,
            });
        }
        // Each bill at most once, or its shortfall would count per copy
        if !allocated_bills.insert(allocation.bill_id) {
            return Err(Error::DuplicateAllocation {
                id: allocation.bill_id,
            });
        }
    }

    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    customer::require_customer(&txn, account_id, customer_id).await?;

    // Load and check every targeted bill before writing anything
    let mut targets = Vec::with_capacity(allocations.len());
    let mut shortfall = 0.0;
    for allocation in allocations {
        let target = Bill::find_by_id(allocation.bill_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::RecordNotFound {
                entity: "bill",
                id: allocation.bill_id.to_string(),
            })?;

        // A bill outside the account or customer scope is reported as missing
        if target.account_id != account_id || target.customer_id != customer_id {
            return Err(Error::RecordNotFound {
                entity: "bill",
                id: allocation.bill_id.to_string(),
            });
        }
        if target.status != BillStatus::Unpaid.as_str() {
            return Err(Error::BillAlreadySettled { id: target.id });
        }
        if allocation.amount > target.amount {
            return Err(Error::AllocationExceedsBill {
                allocated: allocation.amount,
                bill_amount: target.amount,
            });
        }

        shortfall += target.amount - allocation.amount;
        targets.push((target, allocation.amount));
    }

    let payment_model = payment::ActiveModel {
        account_id: Set(account_id.to_string()),
        customer_id: Set(customer_id),
        amount: Set(amount),
        date: Set(date),
        note: Set(note),
        shortfall: Set(shortfall),
        recorded_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let inserted = payment_model.insert(&txn).await?;

    let bills_settled = targets.len();
    for (target, allocated) in targets {
        let mut active: bill::ActiveModel = target.into();
        active.status = Set(BillStatus::Paid.as_str().to_string());
        active.paid_date = Set(Some(date));
        active.payment_id = Set(Some(inserted.id));
        active.paid_amount = Set(Some(allocated));
        active.update(&txn).await?;
    }

    // Under-collection accumulates on the customer's opening due
    if shortfall > 0.0 {
        customer::adjust_opening_due_atomic(&txn, customer_id, shortfall).await?;
    }

    // Commit the transaction
    txn.commit().await?;

    Ok(PaymentReceipt {
        payment: inserted,
        bills_settled,
        shortfall,
    })
}

/// Undoes a payment: reverts every bill it settled to unpaid and deletes the
/// payment row.
///
/// The reverted bills get explicit NULLs written into `paid_date`,
/// `payment_id`, and `paid_amount`, so undo followed by re-recording the same
/// allocations reproduces identical bill states. Whether the opening-due
/// delta the payment introduced is also reversed depends on `policy`; see
/// [`ShortfallPolicy`].
pub async fn undo_payment(
    db: &DatabaseConnection,
    account_id: &str,
    payment_id: i64,
    policy: ShortfallPolicy,
) -> Result<UndoReport> {
    // Use a transaction to ensure atomicity
    let txn = db.begin().await?;

    let target = Payment::find_by_id(payment_id)
        .filter(payment::Column::AccountId.eq(account_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "payment",
            id: payment_id.to_string(),
        })?;

    let settled_bills = Bill::find()
        .filter(bill::Column::PaymentId.eq(target.id))
        .all(&txn)
        .await?;

    let bills_reverted = settled_bills.len();
    for settled in settled_bills {
        let mut active: bill::ActiveModel = settled.into();
        active.status = Set(BillStatus::Unpaid.as_str().to_string());
        active.paid_date = Set(None);
        active.payment_id = Set(None);
        active.paid_amount = Set(None);
        active.update(&txn).await?;
    }

    let customer_id = target.customer_id;
    let recorded_shortfall = target.shortfall;
    target.delete(&txn).await?;

    let shortfall_restored = match policy {
        ShortfallPolicy::Reverse if recorded_shortfall != 0.0 => {
            customer::adjust_opening_due_atomic(&txn, customer_id, -recorded_shortfall).await?;
            recorded_shortfall
        }
        ShortfallPolicy::Reverse | ShortfallPolicy::Keep => 0.0,
    };

    // Commit the transaction
    txn.commit().await?;

    Ok(UndoReport {
        payment_id,
        bills_reverted,
        shortfall_restored,
    })
}

/// Retrieves all payments of a customer, newest collection first.
pub async fn get_payments_for_customer(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<Vec<payment::Model>> {
    Payment::find()
        .filter(payment::Column::AccountId.eq(account_id))
        .filter(payment::Column::CustomerId.eq(customer_id))
        .order_by_desc(payment::Column::Date)
        .order_by_desc(payment::Column::RecordedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
