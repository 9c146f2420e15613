//! Bill entity - One month's recurring charge instance for a customer.
//!
//! Bill identity is deterministic: (`customer_id`, `year`, `month`). The
//! generator checks for that key before inserting, which is what makes
//! generation idempotent. Paid metadata (`paid_date`, `payment_id`,
//! `paid_amount`) is set by the payment reconciler and cleared back to NULL
//! only when the settling payment is undone.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    /// Unique identifier for the bill
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the account that owns this bill
    pub account_id: String,
    /// ID of the customer this bill charges
    pub customer_id: i64,
    /// Calendar year of the billing month
    pub year: i32,
    /// Calendar month of the billing month (1-12)
    pub month: i32,
    /// Charge amount, copied from the customer's `monthly_bill` at generation
    pub amount: f64,
    /// Bill status: `"unpaid"` or `"paid"`
    pub status: String,
    /// Last day of the billing month
    pub due_date: Date,
    /// Date the bill was settled, if paid
    pub paid_date: Option<Date>,
    /// ID of the payment that settled this bill, if paid
    pub payment_id: Option<i64>,
    /// Amount actually applied to this bill, if paid (may undercut `amount`)
    pub paid_amount: Option<f64>,
}

/// Defines relationships between Bill and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bill belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// Each paid bill references the payment that settled it
    #[sea_orm(
        belongs_to = "super::payment::Entity",
        from = "Column::PaymentId",
        to = "super::payment::Column::Id"
    )]
    Payment,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
