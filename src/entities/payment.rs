//! Payment entity - A single collection event against one or more bills.
//!
//! `amount` is the collected total. `shortfall` records the opening-due
//! delta this payment introduced when it under-paid bills; keeping it on the
//! row lets the undo path reverse the delta exactly when the reversal policy
//! asks for it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the account that owns this payment
    pub account_id: String,
    /// ID of the customer who paid
    pub customer_id: i64,
    /// Total amount collected in this payment
    pub amount: f64,
    /// Date the payment was taken
    pub date: Date,
    /// Optional free-form note
    pub note: Option<String>,
    /// Opening-due delta created by under-paying bills (0 when fully paid)
    pub shortfall: f64,
    /// When the payment record was created
    pub recorded_at: DateTimeUtc,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One payment may settle many bills
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
