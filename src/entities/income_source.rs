//! Income source entity - one named income line of a month.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income source database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "income_sources")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Month the income belongs to
    pub month_id: String,
    /// Source name (e.g., "Salary")
    pub name: String,
    /// Amount received
    pub value: f64,
}

/// Defines relationships between `IncomeSource` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each income source belongs to one month
    #[sea_orm(
        belongs_to = "super::month::Entity",
        from = "Column::MonthId",
        to = "super::month::Column::Id"
    )]
    Month,
}

impl Related<super::month::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Month.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
