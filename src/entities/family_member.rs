//! Family member entity - grants a user a role on a cloud family.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role given to the user who migrates or creates a family
pub const OWNER_ROLE: &str = "owner";

/// Family member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "family_members")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Family the membership belongs to
    pub family_id: String,
    /// Authenticated user id
    pub user_id: String,
    /// `"owner"` or `"member"`
    pub role: String,
    /// When the membership was granted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `FamilyMember` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each membership belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id"
    )]
    Family,
}

impl Related<super::family::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
