//! Area entity - A named grouping tag for customers.
//!
//! Area names are unique per account, compared case-insensitively at
//! creation time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Area database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "areas")]
pub struct Model {
    /// Unique identifier for the area
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the account that owns this area
    pub account_id: String,
    /// Area name as submitted (original casing preserved)
    pub name: String,
    /// When the area was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Area and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One area groups many customers
    #[sea_orm(has_many = "super::customer::Entity")]
    Customers,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
