//! The module contains `Goal` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    progress::{DeadlineStatus, days_left, progress_percent},
    util::parse_uuid,
};

/// A savings goal.
///
/// A goal is *achieved* exactly when `current_amount >= target_amount`;
/// `achieved_at` records when that first became true and is cleared when the
/// amount drops below the target again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub deadline: DateTime<Utc>,
    /// Position in the user's list, starting at 0.
    pub order: i32,
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn is_achieved(&self) -> bool {
        self.achieved_at.is_some()
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current_amount, self.target_amount)
    }

    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        days_left(self.deadline, now)
    }

    pub fn deadline_status(&self, now: DateTime<Utc>) -> DeadlineStatus {
        DeadlineStatus::from_days_left(self.days_left(now))
    }
}

/// Next value of `achieved_at` after the amounts changed.
///
/// Keeps the original timestamp while the goal stays achieved, stamps `now`
/// when it becomes achieved and clears it otherwise.
pub(crate) fn achievement_transition(
    current_amount: i64,
    target_amount: i64,
    achieved_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if current_amount >= target_amount {
        achieved_at.or(Some(now))
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub deadline: DateTimeUtc,
    pub sort_order: i32,
    pub achieved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::savings::Entity")]
    Savings,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::savings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Savings.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(value: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            title: ActiveValue::Set(value.title.clone()),
            target_amount: ActiveValue::Set(value.target_amount),
            current_amount: ActiveValue::Set(value.current_amount),
            deadline: ActiveValue::Set(value.deadline),
            sort_order: ActiveValue::Set(value.order),
            achieved_at: ActiveValue::Set(value.achieved_at),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            title: model.title,
            target_amount: model.target_amount,
            current_amount: model.current_amount,
            deadline: model.deadline,
            order: model.sort_order,
            achieved_at: model.achieved_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
