//! Due payment entity - A payment recorded against the opening-due balance.
//!
//! Due payments settle the legacy non-bill balance, not monthly bills. They
//! own a strict linear relationship with `customer.opening_due`: add
//! decreases it by `amount`, update decreases it by the amount delta, delete
//! increases it by `amount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Due payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "due_payments")]
pub struct Model {
    /// Unique identifier for the due payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the account that owns this due payment
    pub account_id: String,
    /// ID of the customer whose opening due this settles
    pub customer_id: i64,
    /// Amount collected against the opening due
    pub amount: f64,
    /// Date the payment was taken
    pub date: Date,
    /// Optional free-form note
    pub note: Option<String>,
    /// When the due payment record was created
    pub recorded_at: DateTimeUtc,
}

/// Defines relationships between DuePayment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each due payment belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
