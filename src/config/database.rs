//! Database configuration for both storage tiers.
//!
//! The local and cloud databases are separate `SeaORM` connections built from the same
//! entity definitions. Tables are created with `Schema::create_table_from_entity`, so
//! the schema always matches the entity structs. Only the local database carries the
//! sync queue.

use crate::entities::{
    CategoryLimit, Expense, Family, FamilyMember, IncomeSource, Month, RecurringExpense,
    Subcategory, SyncQueue,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::TableCreateStatement,
};
use std::path::Path;

const DEFAULT_LOCAL_URL: &str = "sqlite://data/budget_local.sqlite?mode=rwc";
const DEFAULT_CLOUD_URL: &str = "sqlite://data/budget_cloud.sqlite?mode=rwc";

/// URL of the on-device database (`LOCAL_DATABASE_URL`).
#[must_use]
pub fn local_database_url() -> String {
    std::env::var("LOCAL_DATABASE_URL").unwrap_or_else(|_| DEFAULT_LOCAL_URL.to_string())
}

/// URL of the cloud database (`CLOUD_DATABASE_URL`).
#[must_use]
pub fn cloud_database_url() -> String {
    std::env::var("CLOUD_DATABASE_URL").unwrap_or_else(|_| DEFAULT_CLOUD_URL.to_string())
}

/// Directory holding a file-backed `SQLite` database, if it needs creating.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Opens a connection to `url`, creating the directory of a `SQLite` file first.
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(url) {
        std::fs::create_dir_all(dir)?;
    }
    Database::connect(url).await.map_err(Into::into)
}

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Household tables in dependency order.
fn household_tables(schema: &Schema) -> Vec<TableCreateStatement> {
    vec![
        table(schema, Family),
        table(schema, FamilyMember),
        table(schema, Subcategory),
        table(schema, RecurringExpense),
        table(schema, Month),
        table(schema, Expense),
        table(schema, IncomeSource),
        table(schema, CategoryLimit),
    ]
}

/// Creates the household tables and the sync queue in the local database.
pub async fn create_local_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = household_tables(&schema);
    tables.push(table(&schema, SyncQueue));
    for statement in &tables {
        db.execute(builder.build(statement)).await?;
    }
    Ok(())
}

/// Creates the household tables in the cloud database.
pub async fn create_cloud_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for statement in &household_tables(&schema) {
        db.execute(builder.build(statement)).await?;
    }
    Ok(())
}
