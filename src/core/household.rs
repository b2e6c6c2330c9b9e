//! Household helpers for the local tier.
//!
//! Thin creation helpers for offline families and their descendants. They refuse
//! cloud ids so the local database never holds rows of a cloud family.

use crate::{
    core::{
        ids::{self, generate_offline_id, is_offline_id},
        installments::{self, Projection},
    },
    entities::{
        CategoryLimit, IncomeSource, Month, RecurringExpense, category_limit, expense, family,
        income_source, month, recurring_expense, subcategory,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

/// Fields of a new recurring expense.
#[derive(Debug, Clone, Default)]
pub struct NewRecurringExpense {
    /// Budget category key
    pub category_key: String,
    /// Optional subcategory of the same family
    pub subcategory_id: Option<String>,
    /// Description copied to generated expenses
    pub description: String,
    /// Amount per occurrence
    pub value: f64,
    /// Day of month the expense is due
    pub due_day: Option<i32>,
    /// `(total, start_year, start_month)` for installment plans
    pub installments: Option<(i32, i32, i32)>,
}

/// Fields of a new expense.
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    /// Budget category key
    pub category_key: String,
    /// Optional subcategory of the same family
    pub subcategory_id: Option<String>,
    /// Description (e.g., "Milk")
    pub description: String,
    /// Amount spent
    pub value: f64,
    /// Whether the expense is still unpaid
    pub is_pending: bool,
    /// Day of month the expense is due
    pub due_day: Option<i32>,
}

fn ensure_local(id: &str) -> Result<()> {
    if is_offline_id(id) {
        Ok(())
    } else {
        Err(Error::InvalidPayload {
            message: format!("{id} belongs to a cloud family"),
        })
    }
}

fn ensure_named(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidPayload {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}

/// Creates a family in the local tier.
pub async fn create_offline_family<C>(db: &C, name: &str) -> Result<family::Model>
where
    C: ConnectionTrait,
{
    ensure_named("family name", name)?;
    let family = family::ActiveModel {
        id: Set(generate_offline_id(Some("family"))),
        name: Set(name.trim().to_string()),
        owner_id: Set(None),
        created_at: Set(chrono::Utc::now()),
    };
    family.insert(db).await.map_err(Into::into)
}

/// Adds a subcategory to an offline family.
pub async fn add_subcategory<C>(
    db: &C,
    family_id: &str,
    category_key: &str,
    name: &str,
) -> Result<subcategory::Model>
where
    C: ConnectionTrait,
{
    ensure_local(family_id)?;
    ensure_named("subcategory name", name)?;
    let subcategory = subcategory::ActiveModel {
        id: Set(generate_offline_id(Some("subcategory"))),
        family_id: Set(family_id.to_string()),
        category_key: Set(category_key.to_string()),
        name: Set(name.trim().to_string()),
    };
    subcategory.insert(db).await.map_err(Into::into)
}

/// Adds a recurring expense to an offline family.
pub async fn add_recurring_expense<C>(
    db: &C,
    family_id: &str,
    new: NewRecurringExpense,
) -> Result<recurring_expense::Model>
where
    C: ConnectionTrait,
{
    ensure_local(family_id)?;
    ensure_named("description", &new.description)?;
    let (total, start_year, start_month) = match new.installments {
        Some((total, year, month)) => (Some(total), Some(year), Some(month)),
        None => (None, None, None),
    };
    let recurring = recurring_expense::ActiveModel {
        id: Set(generate_offline_id(Some("recurring"))),
        family_id: Set(family_id.to_string()),
        subcategory_id: Set(new.subcategory_id),
        category_key: Set(new.category_key),
        description: Set(new.description),
        value: Set(new.value),
        due_day: Set(new.due_day),
        has_installments: Set(new.installments.is_some()),
        total_installments: Set(total),
        start_year: Set(start_year),
        start_month: Set(start_month),
    };
    recurring.insert(db).await.map_err(Into::into)
}

/// Creates a month and materializes every recurring expense that projects into it.
///
/// Returns the existing month when it was already created.
pub async fn create_month<C>(db: &C, family_id: &str, year: i32, month: i32) -> Result<month::Model>
where
    C: ConnectionTrait,
{
    ensure_local(family_id)?;
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidPayload {
            message: format!("month must be between 1 and 12, got {month}"),
        });
    }

    let id = ids::month_id(family_id, year, month);
    if let Some(existing) = Month::find_by_id(id.clone()).one(db).await? {
        return Ok(existing);
    }

    let created = month::ActiveModel {
        id: Set(id),
        family_id: Set(family_id.to_string()),
        year: Set(year),
        month: Set(month),
        income: Set(0.0),
    }
    .insert(db)
    .await?;

    let templates = RecurringExpense::find()
        .filter(recurring_expense::Column::FamilyId.eq(family_id))
        .all(db)
        .await?;

    for template in templates {
        let Some(projection) = installments::project(&template, year, month) else {
            continue;
        };
        let (installment_number, total_installments) = match projection {
            Projection::Recurring => (None, None),
            Projection::Installment { number, total } => (Some(number), Some(total)),
        };
        expense::ActiveModel {
            id: Set(generate_offline_id(Some("expense"))),
            month_id: Set(created.id.clone()),
            category_key: Set(template.category_key.clone()),
            subcategory_id: Set(template.subcategory_id.clone()),
            recurring_expense_id: Set(Some(template.id.clone())),
            description: Set(template.description.clone()),
            value: Set(template.value),
            is_recurring: Set(true),
            is_pending: Set(true),
            due_day: Set(template.due_day),
            installment_number: Set(installment_number),
            total_installments: Set(total_installments),
        }
        .insert(db)
        .await?;
    }

    Ok(created)
}

/// Adds a one-off expense to an offline month.
pub async fn add_expense<C>(db: &C, month_id: &str, new: NewExpense) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    ensure_local(month_id)?;
    ensure_named("description", &new.description)?;
    let expense = expense::ActiveModel {
        id: Set(generate_offline_id(Some("expense"))),
        month_id: Set(month_id.to_string()),
        category_key: Set(new.category_key),
        subcategory_id: Set(new.subcategory_id),
        recurring_expense_id: Set(None),
        description: Set(new.description),
        value: Set(new.value),
        is_recurring: Set(false),
        is_pending: Set(new.is_pending),
        due_day: Set(new.due_day),
        installment_number: Set(None),
        total_installments: Set(None),
    };
    expense.insert(db).await.map_err(Into::into)
}

/// Adds an income source and recomputes the month's income as the sum of its sources.
pub async fn add_income_source<C>(
    db: &C,
    month_id: &str,
    name: &str,
    value: f64,
) -> Result<income_source::Model>
where
    C: ConnectionTrait,
{
    ensure_local(month_id)?;
    ensure_named("income source name", name)?;
    let month = Month::find_by_id(month_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            table: "months".to_string(),
            id: month_id.to_string(),
        })?;

    let source = income_source::ActiveModel {
        id: Set(generate_offline_id(Some("income"))),
        month_id: Set(month_id.to_string()),
        name: Set(name.trim().to_string()),
        value: Set(value),
    }
    .insert(db)
    .await?;

    let total: f64 = IncomeSource::find()
        .filter(income_source::Column::MonthId.eq(month_id))
        .all(db)
        .await?
        .iter()
        .map(|s| s.value)
        .sum();

    let mut active: month::ActiveModel = month.into();
    active.income = Set(total);
    active.update(db).await?;

    Ok(source)
}

/// Sets the budget percentage of a category for a month, replacing any previous value.
pub async fn set_category_limit<C>(
    db: &C,
    month_id: &str,
    category_key: &str,
    percentage: f64,
) -> Result<category_limit::Model>
where
    C: ConnectionTrait,
{
    ensure_local(month_id)?;
    if !(0.0..=100.0).contains(&percentage) {
        return Err(Error::InvalidPayload {
            message: format!("percentage must be between 0 and 100, got {percentage}"),
        });
    }

    let existing = CategoryLimit::find()
        .filter(category_limit::Column::MonthId.eq(month_id))
        .filter(category_limit::Column::CategoryKey.eq(category_key))
        .one(db)
        .await?;

    if let Some(limit) = existing {
        let mut active: category_limit::ActiveModel = limit.into();
        active.percentage = Set(percentage);
        return active.update(db).await.map_err(Into::into);
    }

    category_limit::ActiveModel {
        id: Set(generate_offline_id(Some("limit"))),
        month_id: Set(month_id.to_string()),
        category_key: Set(category_key.to_string()),
        percentage: Set(percentage),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
