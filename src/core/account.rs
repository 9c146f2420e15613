//! Account provisioning and subscription transitions
//!
//! An account row mirrors one signed-in identity. It is created on first
//! sign-in with a running free trial and only ever changes when the
//! subscription status moves (payment submitted, payment verified). The
//! access decision itself lives in [`crate::core::access`]; this module is
//! the thin persistence layer around it.

use crate::{
    core::access::{self, AccessState, SubscriptionStatus},
    entities::{Account, account},
    errors::{Error, Result},
};
use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{Set, prelude::*};

/// Returns the account row for `account_id`, creating it on first sight.
///
/// A fresh account starts as `free_trial` with `trial_end = now +
/// trial_days`. An existing row is returned untouched, so repeated sign-ins
/// never extend a trial.
pub async fn ensure_account(
    db: &DatabaseConnection,
    account_id: &str,
    now: DateTime<Utc>,
    trial_days: i64,
) -> Result<account::Model> {
    if let Some(existing) = Account::find_by_id(account_id).one(db).await? {
        return Ok(existing);
    }

    let model = account::ActiveModel {
        id: Set(account_id.to_string()),
        subscription_status: Set(SubscriptionStatus::FreeTrial.as_str().to_string()),
        trial_end: Set(now + TimeDelta::days(trial_days)),
        created_at: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

async fn set_status(
    db: &DatabaseConnection,
    account_id: &str,
    status: SubscriptionStatus,
) -> Result<account::Model> {
    let existing = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "account",
            id: account_id.to_string(),
        })?;

    let mut active: account::ActiveModel = existing.into();
    active.subscription_status = Set(status.as_str().to_string());
    active.update(db).await.map_err(Into::into)
}

/// Marks the account as having submitted a payment that awaits verification.
pub async fn mark_pending(db: &DatabaseConnection, account_id: &str) -> Result<account::Model> {
    set_status(db, account_id, SubscriptionStatus::Pending).await
}

/// Marks the account as a verified subscriber.
pub async fn activate(db: &DatabaseConnection, account_id: &str) -> Result<account::Model> {
    set_status(db, account_id, SubscriptionStatus::Active).await
}

/// Reads the account and derives its current access state from `now`.
pub async fn access_state(
    db: &DatabaseConnection,
    account_id: &str,
    now: DateTime<Utc>,
) -> Result<AccessState> {
    let account = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            entity: "account",
            id: account_id.to_string(),
        })?;

    Ok(access::evaluate(
        &account.subscription_status,
        account.trial_end,
        now,
    ))
}
