//! Bill generation business logic
//!
//! Derives the set of monthly bills each customer should have and creates the
//! ones that are missing. A bill's identity is the deterministic key
//! (customer, year, month); generation checks for that key before inserting,
//! so re-running with the same inputs emits nothing new. The whole run is one
//! transaction: either every missing bill is created or none are. Generation
//! is driven by customer-collection changes (see `session`), never by bill
//! changes, which keeps payments from re-triggering it.

use crate::{
    core::customer::ConnectionStatus,
    entities::{Bill, Customer, bill, customer},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;

/// Settlement status of a bill, stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillStatus {
    /// Not yet settled by a payment
    Unpaid,
    /// Settled by a payment (possibly for less than the full amount)
    Paid,
}

impl BillStatus {
    /// The stored string form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }

    /// Parses a stored status string; unknown strings yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// One bill created by a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedBill {
    /// Customer the bill charges
    pub customer_id: i64,
    /// Customer name at generation time
    pub customer_name: String,
    /// Calendar year of the billing month
    pub year: i32,
    /// Calendar month of the billing month (1-12)
    pub month: u32,
    /// Charge amount
    pub amount: f64,
}

/// Result of one generation run across all customers of an account.
#[derive(Debug, Clone)]
pub struct BillGenerationReport {
    /// Bills that were created, in (customer, chronological) order
    pub created_bills: Vec<GeneratedBill>,
    /// Number of active customers whose schedule was examined
    pub customers_considered: usize,
    /// The "today" the schedule was derived against
    pub run_date: NaiveDate,
}

/// Lists every calendar month from `start_date`'s month through `today`'s
/// month inclusive, in chronological order. Empty when `start_date` is in
/// the future.
#[must_use]
pub fn billing_months(start_date: NaiveDate, today: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    if start_date > today {
        return months;
    }

    let (mut year, mut month) = (start_date.year(), start_date.month());
    let end = (today.year(), today.month());
    while (year, month) <= end {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Returns the last day of the given calendar month, which is what bills use
/// as their due date. `None` only for dates outside chrono's range.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|first| first.pred_opt())
}

/// Retrieves all bills of a customer, oldest billing month first.
pub async fn get_bills_for_customer(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<Vec<bill::Model>> {
    Bill::find()
        .filter(bill::Column::AccountId.eq(account_id))
        .filter(bill::Column::CustomerId.eq(customer_id))
        .order_by_asc(bill::Column::Year)
        .order_by_asc(bill::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the unpaid bills of a customer, oldest billing month first.
/// This is the set a payment can allocate against.
pub async fn get_unpaid_bills_for_customer(
    db: &DatabaseConnection,
    account_id: &str,
    customer_id: i64,
) -> Result<Vec<bill::Model>> {
    Bill::find()
        .filter(bill::Column::AccountId.eq(account_id))
        .filter(bill::Column::CustomerId.eq(customer_id))
        .filter(bill::Column::Status.eq(BillStatus::Unpaid.as_str()))
        .order_by_asc(bill::Column::Year)
        .order_by_asc(bill::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates every bill that should exist but does not yet, for all customers
/// of an account. This function:
///
/// 1. Examines each non-deleted customer with `connection_status = active`
///    whose start date is not after `today`
/// 2. Walks their months from the start month through `today`'s month
/// 3. Inserts an unpaid bill for each (year, month) with no existing bill,
///    `amount = customer.monthly_bill`, due on the last day of the month
///
/// The existence check per deterministic key makes the run idempotent; the
/// surrounding transaction makes it all-or-nothing.
///
/// # Returns
/// A report of the bills created (empty `created_bills` when nothing was
/// missing).
pub async fn generate_missing_bills(
    db: &DatabaseConnection,
    account_id: &str,
    today: NaiveDate,
) -> Result<BillGenerationReport> {
    let txn = db.begin().await?;

    let customers = Customer::find()
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::IsDeleted.eq(false))
        .filter(customer::Column::ConnectionStatus.eq(ConnectionStatus::Active.as_str()))
        .order_by_asc(customer::Column::Name)
        .all(&txn)
        .await?;

    // Existing deterministic keys across the whole account; one query instead
    // of one per (customer, month).
    let existing_bills = Bill::find()
        .filter(bill::Column::AccountId.eq(account_id))
        .all(&txn)
        .await?;
    let mut existing_keys: HashSet<(i64, i32, i32)> = existing_bills
        .iter()
        .map(|b| (b.customer_id, b.year, b.month))
        .collect();

    let mut created = Vec::new();
    let mut considered = 0;

    for cust in customers {
        if cust.start_date > today {
            continue;
        }
        considered += 1;

        for (year, month) in billing_months(cust.start_date, today) {
            let month_column = i32::try_from(month).map_err(|_| Error::Config {
                message: format!("Month out of range: {month}"),
            })?;
            if !existing_keys.insert((cust.id, year, month_column)) {
                continue;
            }

            let due_date = last_day_of_month(year, month).ok_or_else(|| Error::Config {
                message: format!("No last day for {year}-{month:02}"),
            })?;

            let new_bill = bill::ActiveModel {
                account_id: Set(account_id.to_string()),
                customer_id: Set(cust.id),
                year: Set(year),
                month: Set(month_column),
                amount: Set(cust.monthly_bill),
                status: Set(BillStatus::Unpaid.as_str().to_string()),
                due_date: Set(due_date),
                paid_date: Set(None),
                payment_id: Set(None),
                paid_amount: Set(None),
                ..Default::default()
            };
            new_bill.insert(&txn).await?;

            created.push(GeneratedBill {
                customer_id: cust.id,
                customer_name: cust.name.clone(),
                year,
                month,
                amount: cust.monthly_bill,
            });
        }
    }

    txn.commit().await?;

    Ok(BillGenerationReport {
        created_bills: created,
        customers_considered: considered,
        run_date: today,
    })
}

/// Formats a generation report into a human-readable summary string, useful
/// for logging after an automatic run.
#[must_use]
pub fn format_generation_summary(report: &BillGenerationReport) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Bill generation - {} - {} customers examined, {} bills created\n",
        report.run_date.format("%Y-%m-%d"),
        report.customers_considered,
        report.created_bills.len()
    );

    for bill in &report.created_bills {
        let month_label = NaiveDate::from_ymd_opt(bill.year, bill.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", bill.year, bill.month));

        // write! to a String cannot fail
        let _ = writeln!(
            summary,
            "  {} | {} | ${:.2}",
            bill.customer_name, month_label, bill.amount
        );
    }

    summary
}
