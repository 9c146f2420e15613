//! Collection reporting business logic.
//!
//! Aggregates the dashboard numbers for one calendar month: how much was
//! billed, how much cash came in (against bills and against opening dues),
//! and what is still outstanding across the whole account. Everything is
//! computed from the live collections on demand; nothing is cached or stored.

use crate::{
    core::billing::{BillStatus, last_day_of_month},
    entities::{Bill, Customer, DuePayment, Payment, bill, customer, due_payment, payment},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::prelude::*;
use std::collections::HashSet;

/// Dashboard numbers for one calendar month of one account.
#[derive(Debug, Clone)]
pub struct MonthlySummary {
    /// Calendar year the summary covers
    pub year: i32,
    /// Calendar month the summary covers (1-12)
    pub month: u32,
    /// Sum of bill amounts billed in this month
    pub billed_total: f64,
    /// Sum of payments collected (dated) in this month
    pub collected_total: f64,
    /// Sum of due-ledger collections dated in this month
    pub due_collected_total: f64,
    /// Bills of this month already settled
    pub paid_bills: usize,
    /// Bills of this month still open
    pub unpaid_bills: usize,
    /// Account-wide outstanding balance: unpaid bill amounts plus positive
    /// opening dues, over non-deleted customers
    pub outstanding_total: f64,
}

/// Computes the monthly summary for an account.
///
/// Billed and paid/unpaid counts cover the bills of exactly that (year,
/// month). Collected totals cover payments and due payments *dated* inside
/// the month, whichever months their money settled. Outstanding is
/// account-wide and ignores soft-deleted customers, matching what the
/// listings show.
pub async fn monthly_summary(
    db: &DatabaseConnection,
    account_id: &str,
    year: i32,
    month: u32,
) -> Result<MonthlySummary> {
    let month_column = i32::try_from(month).map_err(|_| Error::Config {
        message: format!("Month out of range: {month}"),
    })?;
    let month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::Config {
        message: format!("No such month: {year}-{month:02}"),
    })?;
    let month_end = last_day_of_month(year, month).ok_or_else(|| Error::Config {
        message: format!("No such month: {year}-{month:02}"),
    })?;

    let month_bills = Bill::find()
        .filter(bill::Column::AccountId.eq(account_id))
        .filter(bill::Column::Year.eq(year))
        .filter(bill::Column::Month.eq(month_column))
        .all(db)
        .await?;

    let billed_total = month_bills.iter().map(|b| b.amount).sum();
    let paid_bills = month_bills
        .iter()
        .filter(|b| b.status == BillStatus::Paid.as_str())
        .count();
    let unpaid_bills = month_bills.len() - paid_bills;

    let collected_total = Payment::find()
        .filter(payment::Column::AccountId.eq(account_id))
        .filter(payment::Column::Date.between(month_start, month_end))
        .all(db)
        .await?
        .iter()
        .map(|p| p.amount)
        .sum();

    let due_collected_total = DuePayment::find()
        .filter(due_payment::Column::AccountId.eq(account_id))
        .filter(due_payment::Column::Date.between(month_start, month_end))
        .all(db)
        .await?
        .iter()
        .map(|d| d.amount)
        .sum();

    // Outstanding looks at the whole account, not just this month
    let customers = Customer::find()
        .filter(customer::Column::AccountId.eq(account_id))
        .filter(customer::Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    let visible_ids: HashSet<i64> = customers.iter().map(|c| c.id).collect();

    let open_bill_total: f64 = Bill::find()
        .filter(bill::Column::AccountId.eq(account_id))
        .filter(bill::Column::Status.eq(BillStatus::Unpaid.as_str()))
        .all(db)
        .await?
        .iter()
        .filter(|b| visible_ids.contains(&b.customer_id))
        .map(|b| b.amount)
        .sum();
    let opening_due_total: f64 = customers.iter().map(|c| c.opening_due.max(0.0)).sum();

    Ok(MonthlySummary {
        year,
        month,
        billed_total,
        collected_total,
        due_collected_total,
        paid_bills,
        unpaid_bills,
        outstanding_total: open_bill_total + opening_due_total,
    })
}

/// Share of the billed total that was collected, as a percentage.
///
/// A month with nothing billed reports 0 rather than dividing by zero.
/// Collections above the billed total (dues being paid off) can push this
/// past 100.
#[must_use]
pub fn collection_rate(collected: f64, billed: f64) -> f64 {
    if billed == 0.0 {
        return 0.0;
    }

    (collected / billed) * 100.0
}

/// Formats a summary into a human-readable block, one figure per line.
#[must_use]
pub fn format_summary(summary: &MonthlySummary) -> String {
    let rate = collection_rate(
        summary.collected_total + summary.due_collected_total,
        summary.billed_total,
    );

    format!(
        "Summary {}-{:02}\n\
         Billed: ${:.2}\n\
         Collected: ${:.2} (due ledger: ${:.2})\n\
         Bills: {} paid / {} unpaid\n\
         Collection rate: {:.1}%\n\
         Outstanding: ${:.2}",
        summary.year,
        summary.month,
        summary.billed_total,
        summary.collected_total,
        summary.due_collected_total,
        summary.paid_bills,
        summary.unpaid_bills,
        rate,
        summary.outstanding_total
    )
}
