//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod area;
pub mod bill;
pub mod customer;
pub mod due_payment;
pub mod payment;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use area::{Column as AreaColumn, Entity as Area, Model as AreaModel};
pub use bill::{Column as BillColumn, Entity as Bill, Model as BillModel};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use due_payment::{
    Column as DuePaymentColumn, Entity as DuePayment, Model as DuePaymentModel,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
