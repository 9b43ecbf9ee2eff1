//! User profiles and their roles.
//!
//! The `users` table holds both the profile mirrored to the rest of the
//! application and the credentials the auth gateway checks.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Provider name stored for email/password accounts.
pub(crate) const PASSWORD_PROVIDER: &str = "password";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::InvalidInput(format!("invalid role: {other}"))),
        }
    }
}

/// A user profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    /// `password` or the name of the OAuth provider the account signs in with.
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: Option<String>,
    pub provider: String,
    pub provider_subject: Option<String>,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goals::Entity")]
    Goals,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            display_name: model.display_name,
            email: model.email,
            role: Role::try_from(model.role.as_str())?,
            provider: model.provider,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Fields needed to insert a fresh account row.
pub(crate) struct NewAccount<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub display_name: &'a str,
    pub role: Role,
    pub password_hash: Option<String>,
    pub provider: &'a str,
    pub provider_subject: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl From<NewAccount<'_>> for ActiveModel {
    fn from(value: NewAccount<'_>) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            email: ActiveValue::Set(value.email.to_string()),
            display_name: ActiveValue::Set(value.display_name.to_string()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            password_hash: ActiveValue::Set(value.password_hash),
            provider: ActiveValue::Set(value.provider.to_string()),
            provider_subject: ActiveValue::Set(value.provider_subject.map(ToString::to_string)),
            failed_attempts: ActiveValue::Set(0),
            locked_until: ActiveValue::Set(None),
            created_at: ActiveValue::Set(value.now),
            updated_at: ActiveValue::Set(value.now),
        }
    }
}
