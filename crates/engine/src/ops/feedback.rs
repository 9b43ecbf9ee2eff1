use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Feedback, FeedbackFilter, FeedbackStatus, NewFeedback, ResultEngine, Role,
    VoteOutcome, feedback, feedback_votes,
    util::{FEEDBACK_DESCRIPTION_MAX, FEEDBACK_TITLE_MAX, normalize_required_text, parse_uuid},
};

use super::{Engine, with_tx};

impl Engine {
    /// Submits a feedback item under the author's current display name.
    pub async fn create_feedback(
        &self,
        user_id: Uuid,
        cmd: NewFeedback,
    ) -> ResultEngine<Feedback> {
        let title = normalize_required_text(&cmd.title, "title", FEEDBACK_TITLE_MAX, true)?;
        let description = normalize_required_text(
            &cmd.description,
            "description",
            FEEDBACK_DESCRIPTION_MAX,
            false,
        )?;

        with_tx!(self, |db_tx| {
            let author = self.require_user(&db_tx, user_id).await?;
            let count = feedback::Entity::find()
                .filter(feedback::Column::UserId.eq(user_id.to_string()))
                .count(&db_tx)
                .await?;
            if count >= self.limits.max_feedback_per_user {
                return Err(EngineError::LimitReached(format!(
                    "at most {} feedback items per user",
                    self.limits.max_feedback_per_user
                )));
            }
            let now = Utc::now();
            let item = Feedback {
                id: Uuid::new_v4(),
                user_id,
                user_display_name: author.display_name,
                title,
                description,
                category: cmd.category,
                status: None,
                votes: 0,
                voters: Vec::new(),
                created_at: now,
                updated_at: now,
                completed_at: None,
                completed_by: None,
            };
            feedback::ActiveModel::from(&item).insert(&db_tx).await?;
            tracing::debug!(feedback_id = %item.id, %user_id, "feedback submitted");
            Ok(item)
        })
    }

    /// Feedback ordered by votes, then newest first.
    pub async fn list_feedback(&self, filter: FeedbackFilter) -> ResultEngine<Vec<Feedback>> {
        let mut query = feedback::Entity::find()
            .order_by_desc(feedback::Column::Votes)
            .order_by_desc(feedback::Column::CreatedAt);
        if let Some(category) = filter.category {
            query = query.filter(feedback::Column::Category.eq(category.as_str()));
        }
        let models = query.all(&self.database).await?;

        let mut voters: HashMap<String, Vec<Uuid>> = HashMap::new();
        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
        if !ids.is_empty() {
            let votes = feedback_votes::Entity::find()
                .filter(feedback_votes::Column::FeedbackId.is_in(ids))
                .order_by_asc(feedback_votes::Column::CreatedAt)
                .all(&self.database)
                .await?;
            for vote in votes {
                let user_id = parse_uuid(&vote.user_id, "user")?;
                voters.entry(vote.feedback_id).or_default().push(user_id);
            }
        }

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let item_voters = voters.remove(&model.id).unwrap_or_default();
            let item = Feedback::from_model(model, item_voters)?;
            if filter.matches(&item) {
                out.push(item);
            }
        }
        Ok(out)
    }

    pub async fn feedback(&self, feedback_id: Uuid) -> ResultEngine<Feedback> {
        let model = self.require_feedback(&self.database, feedback_id).await?;
        self.with_voters(&self.database, model).await
    }

    /// Adds the caller's vote, or withdraws it when already present.
    pub async fn vote_feedback(
        &self,
        user_id: Uuid,
        feedback_id: Uuid,
    ) -> ResultEngine<VoteOutcome> {
        with_tx!(self, |db_tx| {
            let model = self.require_feedback(&db_tx, feedback_id).await?;
            let key = (model.id.clone(), user_id.to_string());
            let voted = match feedback_votes::Entity::find_by_id(key.clone())
                .one(&db_tx)
                .await?
            {
                Some(_) => {
                    feedback_votes::Entity::delete_by_id(key).exec(&db_tx).await?;
                    false
                }
                None => {
                    feedback_votes::ActiveModel {
                        feedback_id: ActiveValue::Set(key.0),
                        user_id: ActiveValue::Set(key.1),
                        created_at: ActiveValue::Set(Utc::now()),
                    }
                    .insert(&db_tx)
                    .await?;
                    true
                }
            };

            let votes = feedback_votes::Entity::find()
                .filter(feedback_votes::Column::FeedbackId.eq(model.id.as_str()))
                .count(&db_tx)
                .await?;
            let votes = i64::try_from(votes)
                .map_err(|_| EngineError::Internal("vote count overflow".to_string()))?;
            feedback::ActiveModel {
                id: ActiveValue::Set(model.id),
                votes: ActiveValue::Set(votes),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(VoteOutcome { voted, votes })
        })
    }

    /// Sets or clears the triage status. Admin only.
    ///
    /// `None` reopens the item. Completion records who completed it and when.
    pub async fn set_feedback_status(
        &self,
        admin_id: Uuid,
        feedback_id: Uuid,
        status: Option<FeedbackStatus>,
    ) -> ResultEngine<Feedback> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let model = self.require_feedback(&db_tx, feedback_id).await?;
            let now = Utc::now();
            let (completed_at, completed_by) = match status {
                Some(FeedbackStatus::Completed)
                    if model.status.as_deref() == Some(FeedbackStatus::Completed.as_str()) =>
                {
                    (model.completed_at, model.completed_by.clone())
                }
                Some(FeedbackStatus::Completed) => (Some(now), Some(admin_id.to_string())),
                _ => (None, None),
            };
            let updated = feedback::ActiveModel {
                id: ActiveValue::Set(model.id),
                status: ActiveValue::Set(status.map(|s| s.as_str().to_string())),
                completed_at: ActiveValue::Set(completed_at),
                completed_by: ActiveValue::Set(completed_by),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(
                %admin_id,
                %feedback_id,
                status = status.map_or("open", FeedbackStatus::as_str),
                "feedback status changed"
            );
            self.with_voters(&db_tx, updated).await
        })
    }

    /// Deletes a feedback item. Authors may delete their own, admins any.
    pub async fn delete_feedback(&self, user_id: Uuid, feedback_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let caller = self.require_user(&db_tx, user_id).await?;
            let model = self.require_feedback(&db_tx, feedback_id).await?;
            let is_admin = Role::try_from(caller.role.as_str())? == Role::Admin;
            if model.user_id != caller.id && !is_admin {
                return Err(EngineError::Forbidden(
                    "only the author or an admin can delete feedback".to_string(),
                ));
            }
            feedback_votes::Entity::delete_many()
                .filter(feedback_votes::Column::FeedbackId.eq(model.id.as_str()))
                .exec(&db_tx)
                .await?;
            feedback::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn require_feedback<C: ConnectionTrait>(
        &self,
        db: &C,
        feedback_id: Uuid,
    ) -> ResultEngine<feedback::Model> {
        feedback::Entity::find_by_id(feedback_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("feedback not exists".to_string()))
    }

    async fn with_voters<C: ConnectionTrait>(
        &self,
        db: &C,
        model: feedback::Model,
    ) -> ResultEngine<Feedback> {
        let voters = feedback_votes::Entity::find()
            .filter(feedback_votes::Column::FeedbackId.eq(model.id.as_str()))
            .order_by_asc(feedback_votes::Column::CreatedAt)
            .all(db)
            .await?
            .iter()
            .map(|vote| parse_uuid(&vote.user_id, "user"))
            .collect::<ResultEngine<Vec<_>>>()?;
        Feedback::from_model(model, voters)
    }
}
