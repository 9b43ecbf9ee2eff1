//! Saving entries: single logged instances of forgone spending.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A saving entry counted toward a goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_id: Uuid,
    /// What the user did without.
    pub item_name: String,
    pub amount: i64,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub item_name: String,
    pub amount: i64,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Goals,
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingEntry> for ActiveModel {
    fn from(value: &SavingEntry) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            goal_id: ActiveValue::Set(value.goal_id.to_string()),
            item_name: ActiveValue::Set(value.item_name.clone()),
            amount: ActiveValue::Set(value.amount),
            category: ActiveValue::Set(value.category.clone()),
            memo: ActiveValue::Set(value.memo.clone()),
            occurred_at: ActiveValue::Set(value.occurred_at),
        }
    }
}

impl TryFrom<Model> for SavingEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "saving")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            goal_id: parse_uuid(&model.goal_id, "goal")?,
            item_name: model.item_name,
            amount: model.amount,
            category: model.category,
            memo: model.memo,
            occurred_at: model.occurred_at,
        })
    }
}
