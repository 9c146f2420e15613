//! Access-gate state machine
//!
//! Derives what a signed-in account may do from its stored subscription
//! status and trial deadline. The derivation is a pure function of the
//! stored fields and the current wall-clock time; nothing here is persisted,
//! so the gate can never go stale. Unknown stored statuses degrade to
//! [`AccessState::Locked`] instead of panicking.

use chrono::{DateTime, TimeDelta, Utc};

/// Subscription status of an account, stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Inside (or past) the free evaluation window
    FreeTrial,
    /// Payment submitted, verification not finished
    Pending,
    /// Verified subscriber
    Active,
}

impl SubscriptionStatus {
    /// The stored string form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FreeTrial => "free_trial",
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }

    /// Parses a stored status string; unknown strings yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free_trial" => Some(Self::FreeTrial),
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

/// What the account may do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// Verified subscriber; everything is unlocked and stays that way
    Subscribed,
    /// Free trial still running; everything is unlocked until it expires
    Trial {
        /// Whole days until expiry, a started day counting as one
        days_left: i64,
    },
    /// Payment submitted but not yet verified; features are locked but the
    /// account is not treated as expired
    PendingVerification,
    /// Trial expired (or status unrecognized); features are locked
    Locked,
}

impl AccessState {
    /// Whether gated features are usable in this state.
    #[must_use]
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Subscribed | Self::Trial { .. })
    }
}

impl std::fmt::Display for AccessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscribed => write!(f, "Subscribed"),
            Self::Trial { days_left } => write!(f, "Trial - {days_left} day(s) left"),
            Self::PendingVerification => write!(f, "Pending verification"),
            Self::Locked => write!(f, "Locked"),
        }
    }
}

/// Whole days remaining until `trial_end`, rounded up so that any remaining
/// fraction of a day counts as one more day. Never negative.
#[must_use]
pub fn trial_days_left(trial_end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining = trial_end - now;
    if remaining <= TimeDelta::zero() {
        return 0;
    }
    // Ceiling at full TimeDelta precision: any leftover beyond the whole
    // days, however small, counts as one more day
    let whole_days = remaining.num_days();
    if remaining > TimeDelta::days(whole_days) {
        whole_days + 1
    } else {
        whole_days
    }
}

/// Derives the access state from the stored subscription fields.
///
/// `active` unlocks unconditionally and permanently. `pending` is shown as
/// awaiting verification regardless of the trial deadline. `free_trial`
/// unlocks while days remain and locks the moment they run out. Anything
/// else locks.
#[must_use]
pub fn evaluate(status: &str, trial_end: DateTime<Utc>, now: DateTime<Utc>) -> AccessState {
    match SubscriptionStatus::parse(status) {
        Some(SubscriptionStatus::Active) => AccessState::Subscribed,
        Some(SubscriptionStatus::Pending) => AccessState::PendingVerification,
        Some(SubscriptionStatus::FreeTrial) => {
            let days_left = trial_days_left(trial_end, now);
            if days_left > 0 {
                AccessState::Trial { days_left }
            } else {
                AccessState::Locked
            }
        }
        None => AccessState::Locked,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    fn at_noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_active_is_subscribed_regardless_of_trial() {
        let now = at_noon(2024, 3, 20);
        let long_expired = at_noon(2023, 1, 1);

        assert_eq!(evaluate("active", long_expired, now), AccessState::Subscribed);
        assert!(evaluate("active", long_expired, now).is_unlocked());
    }

    #[test]
    fn test_pending_awaits_verification_regardless_of_trial() {
        let now = at_noon(2024, 3, 20);
        let long_expired = at_noon(2023, 1, 1);

        let state = evaluate("pending", long_expired, now);
        assert_eq!(state, AccessState::PendingVerification);
        assert!(!state.is_unlocked());
    }

    #[test]
    fn test_trial_with_time_left_is_unlocked() {
        let now = at_noon(2024, 3, 20);
        // A day and a half left rounds up to two days
        let trial_end = now + TimeDelta::hours(36);

        let state = evaluate("free_trial", trial_end, now);
        assert_eq!(state, AccessState::Trial { days_left: 2 });
        assert!(state.is_unlocked());
    }

    #[test]
    fn test_expired_trial_is_locked() {
        let now = at_noon(2024, 3, 20);

        assert_eq!(
            evaluate("free_trial", now - TimeDelta::days(3), now),
            AccessState::Locked
        );
        // Expiry at exactly now is already locked
        assert_eq!(evaluate("free_trial", now, now), AccessState::Locked);
    }

    #[test]
    fn test_unknown_status_is_locked() {
        let now = at_noon(2024, 3, 20);
        let trial_end = now + TimeDelta::days(30);

        assert_eq!(evaluate("premium", trial_end, now), AccessState::Locked);
        assert_eq!(evaluate("", trial_end, now), AccessState::Locked);
    }

    #[test]
    fn test_trial_days_left_rounds_up() {
        let now = at_noon(2024, 3, 20);

        assert_eq!(trial_days_left(now + TimeDelta::days(30), now), 30);
        assert_eq!(trial_days_left(now + TimeDelta::hours(24), now), 1);
        assert_eq!(trial_days_left(now + TimeDelta::hours(25), now), 2);
        // A sliver of time left still counts as a day
        assert_eq!(trial_days_left(now + TimeDelta::seconds(1), now), 1);
        // Never negative
        assert_eq!(trial_days_left(now - TimeDelta::days(5), now), 0);
    }

    #[test]
    fn test_trial_days_left_sub_millisecond_remainder() {
        let now = at_noon(2024, 3, 20);

        // Remainders below a millisecond still round up, not down to zero
        assert_eq!(trial_days_left(now + TimeDelta::microseconds(1), now), 1);
        assert_eq!(
            trial_days_left(now + TimeDelta::days(3) + TimeDelta::nanoseconds(1), now),
            4
        );
        // An exact day boundary does not round up
        assert_eq!(trial_days_left(now + TimeDelta::days(3), now), 3);
    }

    #[test]
    fn test_subscription_status_round_trip() {
        for status in [
            SubscriptionStatus::FreeTrial,
            SubscriptionStatus::Pending,
            SubscriptionStatus::Active,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_access_state_display() {
        assert_eq!(AccessState::Subscribed.to_string(), "Subscribed");
        assert_eq!(
            AccessState::Trial { days_left: 7 }.to_string(),
            "Trial - 7 day(s) left"
        );
        assert_eq!(
            AccessState::PendingVerification.to_string(),
            "Pending verification"
        );
        assert_eq!(AccessState::Locked.to_string(), "Locked");
    }
}
