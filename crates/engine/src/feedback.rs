//! Feedback items users submit and vote on.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    Feature,
    Bug,
    Improvement,
}

impl FeedbackCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Improvement => "improvement",
        }
    }
}

impl TryFrom<&str> for FeedbackCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "feature" => Ok(Self::Feature),
            "bug" => Ok(Self::Bug),
            "improvement" => Ok(Self::Improvement),
            other => Err(EngineError::InvalidInput(format!(
                "invalid feedback category: {other}"
            ))),
        }
    }
}

/// Triage state set by admins. A feedback item without a status is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Scheduled,
    Completed,
}

impl FeedbackStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for FeedbackStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidInput(format!(
                "invalid feedback status: {other}"
            ))),
        }
    }
}

/// A feedback item with its current voters.
///
/// `votes` always equals `voters.len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Author name at submission time.
    pub user_display_name: String,
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
    pub status: Option<FeedbackStatus>,
    pub votes: i64,
    pub voters: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
}

impl Feedback {
    pub fn has_voted(&self, user_id: Uuid) -> bool {
        self.voters.contains(&user_id)
    }

    pub(crate) fn from_model(model: Model, voters: Vec<Uuid>) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "feedback")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            user_display_name: model.user_display_name,
            title: model.title,
            description: model.description,
            category: FeedbackCategory::try_from(model.category.as_str())?,
            status: model
                .status
                .as_deref()
                .map(FeedbackStatus::try_from)
                .transpose()?,
            votes: model.votes,
            voters,
            created_at: model.created_at,
            updated_at: model.updated_at,
            completed_at: model.completed_at,
            completed_by: model
                .completed_by
                .as_deref()
                .map(|id| parse_uuid(id, "user"))
                .transpose()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub user_display_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: Option<String>,
    pub votes: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub completed_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::feedback_votes::Entity")]
    Votes,
}

impl Related<super::feedback_votes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Feedback> for ActiveModel {
    fn from(value: &Feedback) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            user_display_name: ActiveValue::Set(value.user_display_name.clone()),
            title: ActiveValue::Set(value.title.clone()),
            description: ActiveValue::Set(value.description.clone()),
            category: ActiveValue::Set(value.category.as_str().to_string()),
            status: ActiveValue::Set(value.status.map(|s| s.as_str().to_string())),
            votes: ActiveValue::Set(value.votes),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
            completed_at: ActiveValue::Set(value.completed_at),
            completed_by: ActiveValue::Set(value.completed_by.map(|id| id.to_string())),
        }
    }
}
