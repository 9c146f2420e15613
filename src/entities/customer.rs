//! Customer entity - Represents a recurring-service customer.
//!
//! Each customer carries their recurring monthly bill amount, a connection
//! status driving bill generation, and the running `opening_due` balance
//! (the legacy non-bill balance adjusted by due payments and bill shortfalls).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the account that owns this customer
    pub account_id: String,
    /// Customer name as shown in listings
    pub name: String,
    /// Optional contact phone number
    pub phone: Option<String>,
    /// Optional street address
    pub address: Option<String>,
    /// Optional area (grouping tag) this customer belongs to
    pub area_id: Option<i64>,
    /// Recurring monthly bill amount
    pub monthly_bill: f64,
    /// Connection status: `"active"`, `"inactive"`, or `"paused"`
    pub connection_status: String,
    /// Date the service started; bills are generated from this month on
    pub start_date: Date,
    /// Running non-recurring balance; negative values represent a credit
    pub opening_due: f64,
    /// When the customer was most recently reactivated, if ever
    pub reactivation_date: Option<Date>,
    /// Soft delete flag - if true, customer is hidden but data is preserved
    pub is_deleted: bool,
    /// When the customer record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many monthly bills
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
    /// One customer has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One customer has many due payments
    #[sea_orm(has_many = "super::due_payment::Entity")]
    DuePayments,
    /// Each customer may belong to one area
    #[sea_orm(
        belongs_to = "super::area::Entity",
        from = "Column::AreaId",
        to = "super::area::Column::Id"
    )]
    Area,
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::due_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DuePayments.def()
    }
}

impl Related<super::area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Area.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
