//! Session layer - the embedding application's single entry point
//!
//! A [`Session`] owns the database connection, the loaded settings, and the
//! signed-in account scope. Every read and mutation below goes through that
//! scope, so an embedding UI never handles account ids after sign-in.
//!
//! Mutations return the uniform [`OpOutcome`] shape instead of `Result`:
//! failures are converted to user-facing messages right here and never
//! propagate further. Reads return `Result` and hand back live collection
//! state.
//!
//! Customer-collection changes (create, edit, status change, delete, area
//! detach) bump a watch revision that [`Session::subscribe_customers`]
//! exposes. Bill generation listens to exactly that revision - payments and
//! due-ledger edits do not bump it, which is what keeps settling a bill from
//! re-triggering the generator.
//!
//! Each mutation is a single store transaction and there is no conflict
//! detection across sessions: two sessions writing the same customer resolve
//! last-writer-wins.

use crate::{
    config::settings::Settings,
    core::{access, account, area, billing, customer, due_ledger, payment, report},
    entities::{AreaModel, BillModel, CustomerModel, DuePaymentModel, PaymentModel},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{error, info, warn};

/// Uniform outcome of a session mutation, ready to show to a user.
#[derive(Debug, Clone)]
#[must_use]
pub struct OpOutcome {
    /// Whether the operation went through
    pub success: bool,
    /// Human-readable description of what happened (or why it did not)
    pub message: String,
}

impl OpOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failure(error: &Error) -> Self {
        warn!("Rejected operation: {error}");
        Self {
            success: false,
            message: error.to_string(),
        }
    }
}

/// Shared state for one running instance of the tracker.
///
/// Holds the database connection, settings, and the signed-in account scope.
/// Cheap to share behind an [`Arc`]; all interior mutability is async-aware.
pub struct Session {
    database: DatabaseConnection,
    settings: Settings,
    account: RwLock<Option<String>>,
    customer_revision: watch::Sender<u64>,
}

impl Session {
    /// Creates a session over an already-connected database.
    #[must_use]
    pub fn new(database: DatabaseConnection, settings: Settings) -> Self {
        let (customer_revision, _) = watch::channel(0);
        Self {
            database,
            settings,
            account: RwLock::new(None),
            customer_revision,
        }
    }

    /// Connects to the configured database, ensures the schema exists, and
    /// returns a ready session with default-location settings.
    pub async fn initialize() -> Result<Self> {
        let settings = crate::config::settings::load_default_settings();
        let database = crate::config::database::create_connection().await?;
        crate::config::database::create_tables(&database).await?;
        Ok(Self::new(database, settings))
    }

    /// The settings this session was created with.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    // --- account scope -----------------------------------------------------

    /// Signs an account in, provisioning it on first sight.
    ///
    /// A brand-new account starts a free trial per the configured
    /// `trial_days`. Signing in bumps the customer revision, since the
    /// visible customer collection just changed wholesale.
    pub async fn sign_in(&self, account_id: &str) -> OpOutcome {
        let ensured =
            account::ensure_account(&self.database, account_id, Utc::now(), self.settings.trial_days)
                .await;
        let ensured = match ensured {
            Ok(model) => model,
            Err(e) => return OpOutcome::failure(&e),
        };

        *self.account.write().await = Some(ensured.id.clone());
        self.notify_customers_changed();

        let state = access::evaluate(&ensured.subscription_status, ensured.trial_end, Utc::now());
        info!("Signed in account {} ({state})", ensured.id);
        OpOutcome::ok(format!("Signed in ({state})"))
    }

    /// Signs the current account out. Scoped calls fail until the next
    /// sign-in.
    pub async fn sign_out(&self) -> OpOutcome {
        *self.account.write().await = None;
        OpOutcome::ok("Signed out")
    }

    /// The signed-in account id, if any.
    pub async fn current_account(&self) -> Option<String> {
        self.account.read().await.clone()
    }

    async fn require_account(&self) -> Result<String> {
        self.account
            .read()
            .await
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    fn notify_customers_changed(&self) {
        self.customer_revision.send_modify(|revision| *revision += 1);
    }

    /// Subscribes to the customer-collection revision. The value increases
    /// on every customer mutation (and on sign-in); payments and due-ledger
    /// edits leave it alone.
    #[must_use]
    pub fn subscribe_customers(&self) -> watch::Receiver<u64> {
        self.customer_revision.subscribe()
    }

    // --- access gate -------------------------------------------------------

    /// Derives the signed-in account's access state from the wall clock.
    pub async fn access_state(&self) -> Result<access::AccessState> {
        let account_id = self.require_account().await?;
        account::access_state(&self.database, &account_id, Utc::now()).await
    }

    /// Records that the account submitted a subscription payment.
    pub async fn mark_subscription_pending(&self) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match account::mark_pending(&self.database, &account_id).await {
            Ok(_) => OpOutcome::ok("Subscription payment submitted for verification"),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Marks the account as a verified subscriber.
    pub async fn activate_subscription(&self) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match account::activate(&self.database, &account_id).await {
            Ok(_) => OpOutcome::ok("Subscription active"),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    // --- reads -------------------------------------------------------------

    /// Lists the account's customers, alphabetically.
    pub async fn customers(&self) -> Result<Vec<CustomerModel>> {
        let account_id = self.require_account().await?;
        customer::get_all_customers(&self.database, &account_id).await
    }

    /// Looks a customer up by id within the account scope.
    pub async fn customer(&self, customer_id: i64) -> Result<Option<CustomerModel>> {
        let account_id = self.require_account().await?;
        customer::get_customer_by_id(&self.database, &account_id, customer_id).await
    }

    /// Lists a customer's bills, oldest billing month first.
    pub async fn bills_for(&self, customer_id: i64) -> Result<Vec<BillModel>> {
        let account_id = self.require_account().await?;
        billing::get_bills_for_customer(&self.database, &account_id, customer_id).await
    }

    /// Lists a customer's unpaid bills, oldest billing month first.
    pub async fn unpaid_bills_for(&self, customer_id: i64) -> Result<Vec<BillModel>> {
        let account_id = self.require_account().await?;
        billing::get_unpaid_bills_for_customer(&self.database, &account_id, customer_id).await
    }

    /// Lists a customer's payments, newest first.
    pub async fn payments_for(&self, customer_id: i64) -> Result<Vec<PaymentModel>> {
        let account_id = self.require_account().await?;
        payment::get_payments_for_customer(&self.database, &account_id, customer_id).await
    }

    /// Lists a customer's due-ledger collections, newest first.
    pub async fn due_payments_for(&self, customer_id: i64) -> Result<Vec<DuePaymentModel>> {
        let account_id = self.require_account().await?;
        due_ledger::get_due_payments_for_customer(&self.database, &account_id, customer_id).await
    }

    /// Lists the account's areas, alphabetically.
    pub async fn areas(&self) -> Result<Vec<AreaModel>> {
        let account_id = self.require_account().await?;
        area::get_all_areas(&self.database, &account_id).await
    }

    /// Computes the dashboard summary for one calendar month.
    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<report::MonthlySummary> {
        let account_id = self.require_account().await?;
        report::monthly_summary(&self.database, &account_id, year, month).await
    }

    // --- customer mutations (these bump the revision) ----------------------

    /// Creates a customer.
    pub async fn add_customer(&self, new: customer::NewCustomer) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match customer::create_customer(&self.database, &account_id, new).await {
            Ok(created) => {
                self.notify_customers_changed();
                OpOutcome::ok(format!("Added customer '{}'", created.name))
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Replaces a customer's editable profile fields.
    pub async fn update_customer(
        &self,
        customer_id: i64,
        profile: customer::CustomerProfile,
    ) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match customer::update_customer_profile(&self.database, &account_id, customer_id, profile)
            .await
        {
            Ok(updated) => {
                self.notify_customers_changed();
                OpOutcome::ok(format!("Updated customer '{}'", updated.name))
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Changes a customer's connection status as of the given date.
    pub async fn set_customer_status(
        &self,
        customer_id: i64,
        status: customer::ConnectionStatus,
        on: NaiveDate,
    ) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match customer::set_connection_status(&self.database, &account_id, customer_id, status, on)
            .await
        {
            Ok(updated) => {
                self.notify_customers_changed();
                OpOutcome::ok(format!("Customer '{}' is now {status}", updated.name))
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Soft-deletes a customer.
    pub async fn delete_customer(&self, customer_id: i64) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match customer::delete_customer(&self.database, &account_id, customer_id).await {
            Ok(()) => {
                self.notify_customers_changed();
                OpOutcome::ok("Removed customer")
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Creates an area.
    pub async fn create_area(&self, name: &str) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match area::create_area(&self.database, &account_id, name).await {
            Ok(created) => OpOutcome::ok(format!("Added area '{}'", created.name)),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Deletes an area, detaching its customers. Bumps the revision because
    /// the detach edits customer rows.
    pub async fn delete_area(&self, area_id: i64) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match area::delete_area(&self.database, &account_id, area_id).await {
            Ok(()) => {
                self.notify_customers_changed();
                OpOutcome::ok("Removed area")
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    // --- ledger mutations (no revision bump) -------------------------------

    /// Records a payment, settling the allocated bills.
    pub async fn record_payment(
        &self,
        customer_id: i64,
        amount: f64,
        date: NaiveDate,
        allocations: Vec<payment::BillAllocation>,
        note: Option<String>,
    ) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        let receipt = payment::record_payment(
            &self.database,
            &account_id,
            customer_id,
            amount,
            date,
            allocations,
            note,
        )
        .await;
        match receipt {
            Ok(receipt) => {
                let mut message = format!(
                    "Recorded payment of ${:.2} ({} bill(s) settled)",
                    receipt.payment.amount, receipt.bills_settled
                );
                if receipt.shortfall > 0.0 {
                    message.push_str(&format!("; ${:.2} added to due", receipt.shortfall));
                }
                OpOutcome::ok(message)
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Undoes a payment using the configured shortfall policy.
    pub async fn undo_payment(&self, payment_id: i64) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        let policy = self.settings.shortfall_policy();
        match payment::undo_payment(&self.database, &account_id, payment_id, policy).await {
            Ok(undone) => {
                let mut message =
                    format!("Payment undone ({} bill(s) reopened)", undone.bills_reverted);
                if undone.shortfall_restored > 0.0 {
                    message.push_str(&format!("; ${:.2} due restored", undone.shortfall_restored));
                }
                OpOutcome::ok(message)
            }
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Records a collection against a customer's opening due.
    pub async fn add_due_payment(
        &self,
        customer_id: i64,
        amount: f64,
        date: NaiveDate,
        note: Option<String>,
    ) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match due_ledger::add_due_payment(&self.database, &account_id, customer_id, amount, date, note)
            .await
        {
            Ok(recorded) => OpOutcome::ok(format!(
                "Recorded due collection of ${:.2}",
                recorded.amount
            )),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Corrects a recorded due collection.
    pub async fn update_due_payment(
        &self,
        due_payment_id: i64,
        new_amount: f64,
        new_date: NaiveDate,
        new_note: Option<String>,
    ) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        let updated = due_ledger::update_due_payment(
            &self.database,
            &account_id,
            due_payment_id,
            new_amount,
            new_date,
            new_note,
        )
        .await;
        match updated {
            Ok(_) => OpOutcome::ok("Updated due collection"),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Deletes a due collection, restoring its amount to the opening due.
    pub async fn delete_due_payment(&self, due_payment_id: i64) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match due_ledger::delete_due_payment(&self.database, &account_id, due_payment_id).await {
            Ok(()) => OpOutcome::ok("Deleted due collection"),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    // --- bill generation ---------------------------------------------------

    /// Runs bill generation for the signed-in account as of `today`.
    pub async fn generate_bills(&self, today: NaiveDate) -> OpOutcome {
        let account_id = match self.require_account().await {
            Ok(id) => id,
            Err(e) => return OpOutcome::failure(&e),
        };
        match billing::generate_missing_bills(&self.database, &account_id, today).await {
            Ok(report) if report.created_bills.is_empty() => {
                OpOutcome::ok("Bills are up to date")
            }
            Ok(report) => OpOutcome::ok(format!(
                "Generated {} bill(s)",
                report.created_bills.len()
            )),
            Err(e) => OpOutcome::failure(&e),
        }
    }

    /// Spawns the background task that re-runs bill generation on every
    /// customer-collection change (including sign-in).
    ///
    /// The task runs until the returned handle is aborted. Generation is
    /// idempotent, so a spurious wake-up is harmless; a failed run is logged
    /// and the task keeps listening.
    pub fn spawn_bill_autogenerator(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut revisions = self.subscribe_customers();

        tokio::spawn(async move {
            while revisions.changed().await.is_ok() {
                let Some(account_id) = self.current_account().await else {
                    continue;
                };
                let today = Utc::now().date_naive();
                match billing::generate_missing_bills(&self.database, &account_id, today).await {
                    Ok(report) if report.created_bills.is_empty() => {}
                    Ok(report) => info!("{}", billing::format_generation_summary(&report)),
                    Err(e) => error!("Automatic bill generation failed: {e}"),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::access::AccessState;
    use crate::core::customer::{ConnectionStatus, CustomerProfile, NewCustomer};
    use crate::test_utils::*;

    fn profile(name: &str) -> CustomerProfile {
        CustomerProfile {
            name: name.to_string(),
            phone: None,
            address: None,
            area_id: None,
            monthly_bill: 500.0,
        }
    }

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            profile: profile(name),
            start_date: date(2024, 1, 15),
            opening_due: 0.0,
        }
    }

    async fn signed_in_session() -> Result<Session> {
        let db = setup_test_db().await?;
        let session = Session::new(db, Settings::default());
        let outcome = session.sign_in(TEST_ACCOUNT).await;
        assert!(outcome.success);
        Ok(session)
    }

    #[tokio::test]
    async fn test_signed_out_operations_fail_with_message() -> Result<()> {
        let db = setup_test_db().await?;
        let session = Session::new(db, Settings::default());

        let outcome = session.add_customer(new_customer("Nobody")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Not signed in");

        let outcome = session.record_payment(1, 100.0, date(2024, 2, 1), vec![], None).await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Not signed in");

        // Reads propagate the error instead
        assert!(matches!(
            session.customers().await.unwrap_err(),
            Error::NotAuthenticated
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_starts_trial_and_scopes_reads() -> Result<()> {
        init_test_tracing();
        let session = signed_in_session().await?;

        assert_eq!(session.current_account().await.as_deref(), Some(TEST_ACCOUNT));
        assert_eq!(
            session.access_state().await?,
            AccessState::Trial { days_left: 30 }
        );
        assert!(session.customers().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_sign_out_revokes_scope() -> Result<()> {
        let session = signed_in_session().await?;

        let outcome = session.sign_out().await;
        assert!(outcome.success);
        assert!(session.current_account().await.is_none());
        assert!(matches!(
            session.customers().await.unwrap_err(),
            Error::NotAuthenticated
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_mutations_bump_revision_ledger_does_not() -> Result<()> {
        let db = setup_test_db().await?;
        let session = Session::new(db, Settings::default());
        let mut revisions = session.subscribe_customers();

        // Sign-in counts as a collection change
        assert!(session.sign_in(TEST_ACCOUNT).await.success);
        assert!(revisions.has_changed().unwrap());
        let _ = revisions.borrow_and_update();

        let outcome = session.add_customer(new_customer("Alice")).await;
        assert!(outcome.success);
        assert!(revisions.has_changed().unwrap());
        let _ = revisions.borrow_and_update();

        let alice = session.customers().await?.remove(0);

        // Ledger activity stays quiet
        let outcome = session
            .record_payment(alice.id, 100.0, date(2024, 2, 1), vec![], None)
            .await;
        assert!(outcome.success);
        let outcome = session
            .add_due_payment(alice.id, 25.0, date(2024, 2, 2), None)
            .await;
        assert!(outcome.success);
        assert!(!revisions.has_changed().unwrap());

        // Status changes speak up again
        let outcome = session
            .set_customer_status(alice.id, ConnectionStatus::Paused, date(2024, 2, 3))
            .await;
        assert!(outcome.success);
        assert!(revisions.has_changed().unwrap());

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_lifecycle_through_session() -> Result<()> {
        let session = signed_in_session().await?;

        let outcome = session.add_customer(new_customer("Alice")).await;
        assert!(outcome.success);
        assert!(outcome.message.contains("Alice"));

        let listed = session.customers().await?;
        assert_eq!(listed.len(), 1);
        let id = listed[0].id;

        let outcome = session.update_customer(id, profile("Alice Renamed")).await;
        assert!(outcome.success);
        assert_eq!(
            session.customer(id).await?.unwrap().name,
            "Alice Renamed"
        );

        let outcome = session.delete_customer(id).await;
        assert!(outcome.success);
        assert!(session.customers().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_generate_and_settle_through_session() -> Result<()> {
        let session = signed_in_session().await?;
        assert!(session.add_customer(new_customer("Bill Me")).await.success);
        let customer_id = session.customers().await?[0].id;

        // Start 2024-01-15, run 2024-03-20: three bills
        let outcome = session.generate_bills(date(2024, 3, 20)).await;
        assert!(outcome.success);
        assert!(outcome.message.contains("3 bill(s)"));

        let unpaid = session.unpaid_bills_for(customer_id).await?;
        assert_eq!(unpaid.len(), 3);

        // Second run is a no-op
        let outcome = session.generate_bills(date(2024, 3, 20)).await;
        assert_eq!(outcome.message, "Bills are up to date");

        // Settle January short by 200
        let outcome = session
            .record_payment(
                customer_id,
                300.0,
                date(2024, 3, 21),
                vec![payment::BillAllocation {
                    bill_id: unpaid[0].id,
                    amount: 300.0,
                }],
                None,
            )
            .await;
        assert!(outcome.success);
        assert!(outcome.message.contains("$200.00 added to due"));

        assert_eq!(session.unpaid_bills_for(customer_id).await?.len(), 2);
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 200.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_undo_policy_follows_settings() -> Result<()> {
        let db = setup_test_db().await?;
        let session = Session::new(
            db,
            Settings {
                trial_days: 30,
                undo_restores_shortfall: true,
            },
        );
        assert!(session.sign_in(TEST_ACCOUNT).await.success);
        assert!(session.add_customer(new_customer("Reversible")).await.success);
        let customer_id = session.customers().await?[0].id;
        assert!(session.generate_bills(date(2024, 1, 31)).await.success);
        let bill_id = session.unpaid_bills_for(customer_id).await?[0].id;

        let outcome = session
            .record_payment(
                customer_id,
                300.0,
                date(2024, 2, 1),
                vec![payment::BillAllocation {
                    bill_id,
                    amount: 300.0,
                }],
                None,
            )
            .await;
        assert!(outcome.success);
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 200.0);

        let payment_id = session.payments_for(customer_id).await?[0].id;
        let outcome = session.undo_payment(payment_id).await;
        assert!(outcome.success);
        assert!(outcome.message.contains("$200.00 due restored"));
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_due_ledger_through_session() -> Result<()> {
        let session = signed_in_session().await?;
        let outcome = session
            .add_customer(NewCustomer {
                profile: profile("Owes"),
                start_date: date(2024, 1, 1),
                opening_due: 400.0,
            })
            .await;
        assert!(outcome.success);
        let customer_id = session.customers().await?[0].id;

        let outcome = session
            .add_due_payment(customer_id, 150.0, date(2024, 3, 5), None)
            .await;
        assert!(outcome.success);
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 250.0);

        let due_id = session.due_payments_for(customer_id).await?[0].id;
        let outcome = session
            .update_due_payment(due_id, 100.0, date(2024, 3, 5), None)
            .await;
        assert!(outcome.success);
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 300.0);

        assert!(session.delete_due_payment(due_id).await.success);
        assert_eq!(session.customer(customer_id).await?.unwrap().opening_due, 400.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_flow_through_session() -> Result<()> {
        let session = signed_in_session().await?;

        let outcome = session.mark_subscription_pending().await;
        assert!(outcome.success);
        assert_eq!(
            session.access_state().await?,
            AccessState::PendingVerification
        );

        let outcome = session.activate_subscription().await;
        assert!(outcome.success);
        assert_eq!(session.access_state().await?, AccessState::Subscribed);

        Ok(())
    }

    #[tokio::test]
    async fn test_accounts_see_only_their_customers() -> Result<()> {
        let session = signed_in_session().await?;
        assert!(session.add_customer(new_customer("Mine")).await.success);

        assert!(session.sign_out().await.success);
        assert!(session.sign_in("other-account").await.success);
        assert!(session.customers().await?.is_empty());

        assert!(session.sign_out().await.success);
        assert!(session.sign_in(TEST_ACCOUNT).await.success);
        assert_eq!(session.customers().await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_autogenerator_runs_on_sign_in() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;

        // Seed the account and a customer before the session ever sees them
        create_test_account(&db).await?;
        create_custom_customer(&db, TEST_ACCOUNT, "Eager", 500.0, date(2024, 1, 1), 0.0).await?;

        let session = Arc::new(Session::new(db, Settings::default()));
        let generator = Arc::clone(&session).spawn_bill_autogenerator();

        assert!(session.sign_in(TEST_ACCOUNT).await.success);

        // Give the background task a chance to observe the bump and finish
        let mut generated = Vec::new();
        for _ in 0..200 {
            tokio::task::yield_now().await;
            let customer_id = session.customers().await?[0].id;
            generated = session.bills_for(customer_id).await?;
            if !generated.is_empty() {
                break;
            }
        }
        assert!(!generated.is_empty());

        generator.abort();
        Ok(())
    }
}
