//! Application settings loading from `billkeeper.toml`
//!
//! Settings tune behavior that is policy rather than data: how long a fresh
//! account's free trial runs, and whether undoing a payment also rolls its
//! shortfall back out of the customer's opening due. Every field has a
//! default, so an absent file (or an empty one) is a valid configuration.

use crate::core::payment::ShortfallPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Tunable application settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Length of the free trial granted to a new account, in days
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,
    /// Whether undoing a payment subtracts its recorded shortfall back out
    /// of the customer's opening due
    #[serde(default)]
    pub undo_restores_shortfall: bool,
}

const fn default_trial_days() -> i64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            undo_restores_shortfall: false,
        }
    }
}

impl Settings {
    /// The undo policy these settings select.
    #[must_use]
    pub const fn shortfall_policy(&self) -> ShortfallPolicy {
        if self.undo_restores_shortfall {
            ShortfallPolicy::Reverse
        } else {
            ShortfallPolicy::Keep
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse billkeeper.toml: {e}"),
    })
}

/// Loads settings from the default location (./billkeeper.toml), then applies
/// environment overrides.
///
/// A missing or unreadable file falls back to defaults. `.env` is loaded
/// first, so overrides can live there: `BILLKEEPER_TRIAL_DAYS` replaces the
/// trial length, and `BILLKEEPER_UNDO_RESTORES_SHORTFALL` (`1` or `true`)
/// switches the undo policy.
#[must_use]
pub fn load_default_settings() -> Settings {
    dotenvy::dotenv().ok();

    let mut settings = load_settings("billkeeper.toml").unwrap_or_default();

    if let Ok(days) = std::env::var("BILLKEEPER_TRIAL_DAYS") {
        if let Ok(parsed) = days.parse() {
            settings.trial_days = parsed;
        }
    }
    if let Ok(flag) = std::env::var("BILLKEEPER_UNDO_RESTORES_SHORTFALL") {
        settings.undo_restores_shortfall = flag == "1" || flag.eq_ignore_ascii_case("true");
    }

    settings
}
