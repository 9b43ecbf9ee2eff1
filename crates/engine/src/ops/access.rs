use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Role, goals, savings, users};

use super::Engine;

impl Engine {
    pub(super) async fn find_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        self.find_user(db, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Loads the caller and fails unless they hold the admin role.
    pub(super) async fn require_admin<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        let Some(model) = self.find_user(db, user_id).await? else {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        };
        if Role::try_from(model.role.as_str())? != Role::Admin {
            tracing::warn!(%user_id, "admin action refused");
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(model)
    }

    /// Goals of other users are reported as missing.
    pub(super) async fn require_goal_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        goal_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<goals::Model> {
        goals::Entity::find_by_id(goal_id.to_string())
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))
    }

    pub(super) async fn require_saving_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        saving_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<savings::Model> {
        savings::Entity::find_by_id(saving_id.to_string())
            .filter(savings::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("saving not exists".to_string()))
    }
}
