//! Shared test utilities for the sync engine.
//!
//! In-memory `SQLite` databases stand in for both tiers. [`TestEnv`] wires a complete
//! engine around them with a [`FaultyRemote`] so tests can count remote calls and make
//! a chosen insert or delete fail.

#![allow(clippy::unwrap_used)]

use crate::{
    config::database,
    core::{
        connectivity::ConnectivityMonitor,
        household::{self, NewExpense, NewRecurringExpense},
        local::LocalStore,
        remote::{CloudStore, RemoteStore},
        session::SessionState,
        sync::SyncEngine,
        tables::{self, EntityKind},
    },
    entities::{
        CategoryLimit, Expense, Family, FamilyMember, IncomeSource, Month, RecurringExpense,
        Subcategory, SyncQueue, category_limit, expense, family, family_member, income_source,
        month, recurring_expense, subcategory,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// User signed in by [`TestEnv`].
pub const TEST_USER: &str = "user-1";

/// Every household table, parents first.
pub const ALL_KINDS: [EntityKind; 8] = [
    EntityKind::Family,
    EntityKind::FamilyMember,
    EntityKind::Subcategory,
    EntityKind::RecurringExpense,
    EntityKind::Month,
    EntityKind::Expense,
    EntityKind::IncomeSource,
    EntityKind::CategoryLimit,
];

/// In-memory local database with the household tables and the sync queue.
pub async fn setup_local_db() -> Result<DatabaseConnection> {
    let db = database::connect("sqlite::memory:").await?;
    database::create_local_tables(&db).await?;
    Ok(db)
}

/// In-memory cloud database with the household tables.
pub async fn setup_cloud_db() -> Result<DatabaseConnection> {
    let db = database::connect("sqlite::memory:").await?;
    database::create_cloud_tables(&db).await?;
    Ok(db)
}

/// A [`LocalStore`] over a fresh in-memory database.
pub async fn setup_local_store() -> Result<LocalStore> {
    Ok(LocalStore::new(setup_local_db().await?))
}

/// A [`CloudStore`] over a fresh in-memory database.
pub async fn setup_cloud_store() -> Result<CloudStore> {
    Ok(CloudStore::new(setup_cloud_db().await?))
}

/// Installs a test subscriber; repeated calls are harmless.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("budget_sync=debug")
        .with_test_writer()
        .try_init();
}

/// Every row of one table as JSON, ordered by id.
pub async fn table_rows(db: &DatabaseConnection, kind: EntityKind) -> Result<Vec<Value>> {
    let rows = match kind {
        EntityKind::Family => to_values(
            Family::find()
                .order_by_asc(family::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::FamilyMember => to_values(
            FamilyMember::find()
                .order_by_asc(family_member::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::Subcategory => to_values(
            Subcategory::find()
                .order_by_asc(subcategory::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::RecurringExpense => to_values(
            RecurringExpense::find()
                .order_by_asc(recurring_expense::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::Month => to_values(
            Month::find()
                .order_by_asc(month::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::Expense => to_values(
            Expense::find()
                .order_by_asc(expense::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::IncomeSource => to_values(
            IncomeSource::find()
                .order_by_asc(income_source::Column::Id)
                .all(db)
                .await?,
        ),
        EntityKind::CategoryLimit => to_values(
            CategoryLimit::find()
                .order_by_asc(category_limit::Column::Id)
                .all(db)
                .await?,
        ),
    };
    Ok(rows)
}

fn to_values<T: serde::Serialize>(rows: Vec<T>) -> Vec<Value> {
    rows.iter()
        .map(|row| serde_json::to_value(row).unwrap())
        .collect()
}

/// Every local row, sync queue included, for before/after comparisons.
pub async fn local_snapshot(local: &LocalStore) -> Result<Vec<Value>> {
    let mut snapshot = household_snapshot(local).await?;
    snapshot.extend(to_values(SyncQueue::find().all(local.connection()).await?));
    Ok(snapshot)
}

/// Every household row in the local database, without the sync queue.
pub async fn household_snapshot(local: &LocalStore) -> Result<Vec<Value>> {
    let mut snapshot = Vec::new();
    for kind in ALL_KINDS {
        snapshot.extend(table_rows(local.connection(), kind).await?);
    }
    Ok(snapshot)
}

/// Number of household rows in the local database.
pub async fn local_row_count(local: &LocalStore) -> Result<usize> {
    let mut count = 0;
    for kind in ALL_KINDS {
        count += table_rows(local.connection(), kind).await?.len();
    }
    Ok(count)
}

/// Number of rows across every cloud table.
pub async fn cloud_row_count(cloud: &CloudStore) -> Result<usize> {
    let mut count = 0;
    for kind in ALL_KINDS {
        count += table_rows(cloud.connection(), kind).await?.len();
    }
    Ok(count)
}

/// An offline family seeded by a fixture, with its row counts.
#[derive(Debug, Clone)]
pub struct SeededFamily {
    /// The local family row
    pub family: family::Model,
    /// Subcategories created
    pub subcategories: usize,
    /// Recurring expenses created
    pub recurring: usize,
    /// Months created
    pub months: usize,
    /// Expenses across all months, generated ones included
    pub expenses: usize,
    /// Income sources across all months
    pub income_sources: usize,
    /// Category limits across all months
    pub category_limits: usize,
}

impl SeededFamily {
    /// Descendant rows, the family excluded.
    pub const fn child_rows(&self) -> usize {
        self.subcategories
            + self.recurring
            + self.months
            + self.expenses
            + self.income_sources
            + self.category_limits
    }

    /// Migration units of work: the family plus every descendant.
    pub const fn total(&self) -> usize {
        1 + self.child_rows()
    }
}

/// Family "Silva": subcategory "Groceries" (essenciais), month 2026-01 with income
/// 5000 and one expense "Milk" of 20 in that subcategory.
pub async fn seed_groceries_family(db: &DatabaseConnection) -> Result<SeededFamily> {
    let family = household::create_offline_family(db, "Silva").await?;
    let groceries = household::add_subcategory(db, &family.id, "essenciais", "Groceries").await?;
    let january = household::create_month(db, &family.id, 2026, 1).await?;
    tables::update_value(db, EntityKind::Month, &january.id, &json!({"income": 5000.0})).await?;
    household::add_expense(
        db,
        &january.id,
        NewExpense {
            category_key: "essenciais".to_string(),
            subcategory_id: Some(groceries.id),
            description: "Milk".to_string(),
            value: 20.0,
            ..Default::default()
        },
    )
    .await?;

    Ok(SeededFamily {
        family,
        subcategories: 1,
        recurring: 0,
        months: 1,
        expenses: 1,
        income_sources: 0,
        category_limits: 0,
    })
}

/// Family "Costa" exercising every table:
/// - subcategories "Groceries" and "Electronics"
/// - recurring "Rent" and a 3-installment "Laptop" starting 2026-01
/// - month 2026-01: Rent, Laptop 1/3, "Milk"; income Salary + Freelance; two limits
/// - month 2026-02: Rent, Laptop 2/3; income Salary
pub async fn seed_full_family(db: &DatabaseConnection) -> Result<SeededFamily> {
    let family = household::create_offline_family(db, "Costa").await?;
    let groceries = household::add_subcategory(db, &family.id, "essenciais", "Groceries").await?;
    let electronics = household::add_subcategory(db, &family.id, "lazer", "Electronics").await?;

    household::add_recurring_expense(
        db,
        &family.id,
        NewRecurringExpense {
            category_key: "essenciais".to_string(),
            description: "Rent".to_string(),
            value: 1500.0,
            due_day: Some(5),
            ..Default::default()
        },
    )
    .await?;
    household::add_recurring_expense(
        db,
        &family.id,
        NewRecurringExpense {
            category_key: "lazer".to_string(),
            subcategory_id: Some(electronics.id),
            description: "Laptop".to_string(),
            value: 400.0,
            installments: Some((3, 2026, 1)),
            ..Default::default()
        },
    )
    .await?;

    let january = household::create_month(db, &family.id, 2026, 1).await?;
    let february = household::create_month(db, &family.id, 2026, 2).await?;

    household::add_expense(
        db,
        &january.id,
        NewExpense {
            category_key: "essenciais".to_string(),
            subcategory_id: Some(groceries.id),
            description: "Milk".to_string(),
            value: 20.0,
            ..Default::default()
        },
    )
    .await?;

    household::add_income_source(db, &january.id, "Salary", 5000.0).await?;
    household::add_income_source(db, &january.id, "Freelance", 800.0).await?;
    household::add_income_source(db, &february.id, "Salary", 5000.0).await?;
    household::set_category_limit(db, &january.id, "essenciais", 50.0).await?;
    household::set_category_limit(db, &january.id, "lazer", 20.0).await?;

    Ok(SeededFamily {
        family,
        subcategories: 2,
        recurring: 2,
        months: 2,
        expenses: 5,
        income_sources: 3,
        category_limits: 2,
    })
}

/// [`CloudStore`] wrapper that counts calls, can fail one insert and can reject
/// deletes from one table.
///
/// Inserts made through the per-entity `insert_*` functions are numbered from 1 in
/// call order (family = 1, owner membership = 2, ...).
#[derive(Debug)]
pub struct FaultyRemote {
    inner: CloudStore,
    fail_on_insert: Option<usize>,
    fail_deletes_of: Option<EntityKind>,
    inserts: AtomicUsize,
    calls: AtomicUsize,
}

impl FaultyRemote {
    /// Wraps `inner`; `fail_on_insert` selects the insert to reject.
    pub const fn new(inner: CloudStore, fail_on_insert: Option<usize>) -> Self {
        Self {
            inner,
            fail_on_insert,
            fail_deletes_of: None,
            inserts: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Also rejects every delete from `kind`.
    #[must_use]
    pub fn failing_deletes_of(mut self, kind: Option<EntityKind>) -> Self {
        self.fail_deletes_of = kind;
        self
    }

    /// Remote calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn next_insert(&self) -> Result<()> {
        self.call();
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_insert == Some(n) {
            return Err(Error::Remote {
                message: format!("injected failure on insert {n}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FaultyRemote {
    async fn insert_into_table(&self, table: EntityKind, data: &Value) -> Result<()> {
        self.call();
        self.inner.insert_into_table(table, data).await
    }

    async fn update_in_table(&self, table: EntityKind, id: &str, data: &Value) -> Result<()> {
        self.call();
        self.inner.update_in_table(table, id, data).await
    }

    async fn delete_by_id_from_table(&self, table: EntityKind, id: &str) -> Result<()> {
        self.call();
        if self.fail_deletes_of == Some(table) {
            return Err(Error::Remote {
                message: format!("injected failure deleting {table} {id}"),
            });
        }
        self.inner.delete_by_id_from_table(table, id).await
    }

    async fn insert_family(&self, name: &str, owner_id: &str) -> Result<family::Model> {
        self.next_insert()?;
        self.inner.insert_family(name, owner_id).await
    }

    async fn insert_family_member(
        &self,
        family_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<family_member::Model> {
        self.next_insert()?;
        self.inner.insert_family_member(family_id, user_id, role).await
    }

    async fn insert_subcategory(&self, row: subcategory::Model) -> Result<subcategory::Model> {
        self.next_insert()?;
        self.inner.insert_subcategory(row).await
    }

    async fn insert_recurring_expense(
        &self,
        row: recurring_expense::Model,
    ) -> Result<recurring_expense::Model> {
        self.next_insert()?;
        self.inner.insert_recurring_expense(row).await
    }

    async fn insert_month(&self, row: month::Model) -> Result<month::Model> {
        self.next_insert()?;
        self.inner.insert_month(row).await
    }

    async fn insert_expense(&self, row: expense::Model) -> Result<expense::Model> {
        self.next_insert()?;
        self.inner.insert_expense(row).await
    }

    async fn insert_income_source(
        &self,
        row: income_source::Model,
    ) -> Result<income_source::Model> {
        self.next_insert()?;
        self.inner.insert_income_source(row).await
    }

    async fn insert_category_limit(
        &self,
        row: category_limit::Model,
    ) -> Result<category_limit::Model> {
        self.next_insert()?;
        self.inner.insert_category_limit(row).await
    }

    async fn list_families_for_user(&self, user_id: &str) -> Result<Vec<family::Model>> {
        self.call();
        self.inner.list_families_for_user(user_id).await
    }
}

/// Remote that only records deletes; everything else is rejected.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    deleted: Mutex<Vec<(EntityKind, String)>>,
    failing: Option<EntityKind>,
}

impl RecordingRemote {
    /// Rejects deletes from `kind`.
    pub fn failing_deletes_of(kind: EntityKind) -> Self {
        Self {
            failing: Some(kind),
            ..Default::default()
        }
    }

    /// Successful deletes, in call order.
    pub fn deleted(&self) -> Vec<(EntityKind, String)> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn unsupported<T>() -> Result<T> {
    Err(Error::Remote {
        message: "not supported by RecordingRemote".to_string(),
    })
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn insert_into_table(&self, _table: EntityKind, _data: &Value) -> Result<()> {
        unsupported()
    }

    async fn update_in_table(&self, _table: EntityKind, _id: &str, _data: &Value) -> Result<()> {
        unsupported()
    }

    async fn delete_by_id_from_table(&self, table: EntityKind, id: &str) -> Result<()> {
        if self.failing == Some(table) {
            return Err(Error::Remote {
                message: format!("cannot delete from {table}"),
            });
        }
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((table, id.to_string()));
        Ok(())
    }

    async fn insert_family(&self, _name: &str, _owner_id: &str) -> Result<family::Model> {
        unsupported()
    }

    async fn insert_family_member(
        &self,
        _family_id: &str,
        _user_id: &str,
        _role: &str,
    ) -> Result<family_member::Model> {
        unsupported()
    }

    async fn insert_subcategory(&self, _row: subcategory::Model) -> Result<subcategory::Model> {
        unsupported()
    }

    async fn insert_recurring_expense(
        &self,
        _row: recurring_expense::Model,
    ) -> Result<recurring_expense::Model> {
        unsupported()
    }

    async fn insert_month(&self, _row: month::Model) -> Result<month::Model> {
        unsupported()
    }

    async fn insert_expense(&self, _row: expense::Model) -> Result<expense::Model> {
        unsupported()
    }

    async fn insert_income_source(
        &self,
        _row: income_source::Model,
    ) -> Result<income_source::Model> {
        unsupported()
    }

    async fn insert_category_limit(
        &self,
        _row: category_limit::Model,
    ) -> Result<category_limit::Model> {
        unsupported()
    }

    async fn list_families_for_user(&self, _user_id: &str) -> Result<Vec<family::Model>> {
        unsupported()
    }
}

/// A complete engine over in-memory databases.
pub struct TestEnv {
    /// The engine under test
    pub engine: SyncEngine,
    /// Same local store the engine uses
    pub local: LocalStore,
    /// Direct access to the cloud database, bypassing call counting
    pub cloud: CloudStore,
    /// The remote the engine talks to
    pub remote: Arc<FaultyRemote>,
    /// Injected session
    pub session: SessionState,
    /// Injected connectivity
    pub connectivity: ConnectivityMonitor,
}

impl TestEnv {
    /// Signed in as [`TEST_USER`] and online.
    pub async fn online() -> Result<Self> {
        Self::build(true, None, None).await
    }

    /// Signed in as [`TEST_USER`] but offline.
    pub async fn offline() -> Result<Self> {
        Self::build(false, None, None).await
    }

    /// Online, with the `n`-th remote insert failing.
    pub async fn failing_on_insert(n: usize) -> Result<Self> {
        Self::build(true, Some(n), None).await
    }

    /// Online, with the `n`-th remote insert failing and every delete from `kind`
    /// rejected during rollback.
    pub async fn failing_on_insert_and_delete(n: usize, kind: EntityKind) -> Result<Self> {
        Self::build(true, Some(n), Some(kind)).await
    }

    async fn build(
        online: bool,
        fail_on_insert: Option<usize>,
        fail_deletes_of: Option<EntityKind>,
    ) -> Result<Self> {
        init_test_tracing();
        let local = setup_local_store().await?;
        let cloud = setup_cloud_store().await?;
        let remote = Arc::new(
            FaultyRemote::new(cloud.clone(), fail_on_insert).failing_deletes_of(fail_deletes_of),
        );
        let session = SessionState::signed_in(TEST_USER);
        let connectivity = ConnectivityMonitor::new(online);
        let engine = SyncEngine::new(
            local.clone(),
            Arc::clone(&remote) as Arc<dyn RemoteStore>,
            session.clone(),
            connectivity.clone(),
        );
        Ok(Self {
            engine,
            local,
            cloud,
            remote,
            session,
            connectivity,
        })
    }

    /// Creates a cloud family owned by [`TEST_USER`] without going through the engine.
    pub async fn cloud_family(&self, name: &str) -> Result<family::Model> {
        let family = self.cloud.insert_family(name, TEST_USER).await?;
        self.cloud
            .insert_family_member(&family.id, TEST_USER, family_member::OWNER_ROLE)
            .await?;
        Ok(family)
    }
}
