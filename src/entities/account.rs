//! Account entity - The owning user profile and its subscription fields.
//!
//! The primary key is the opaque user id issued by the external identity
//! provider; it is also the scope key every other entity carries. Only the
//! raw subscription fields are stored - the derived access state is computed
//! on every read from wall-clock time (see `core::access`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Opaque user id from the identity provider (not auto-generated)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Subscription status: `"free_trial"`, `"pending"`, or `"active"`
    pub subscription_status: String,
    /// When the free trial ends
    pub trial_end: DateTimeUtc,
    /// When the account profile was created
    pub created_at: DateTimeUtc,
}

/// Account has no modeled relationships; other entities reference it by
/// scope key only.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
