use chrono::Utc;
use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, GoalRecomputed, NewSaving, ResultEngine, SavingCreated, SavingEntry,
    SavingUpdate, goals, savings,
    util::{
        SAVING_CATEGORY_MAX, SAVING_ITEM_NAME_MAX, SAVING_MEMO_MAX, normalize_optional_text,
        normalize_required_text, parse_uuid, validate_amount,
    },
};

use super::{Engine, with_tx};

impl Engine {
    /// Logs a saving entry and adds its amount to the goal.
    ///
    /// The insert and the goal update commit together.
    pub async fn create_saving(
        &self,
        user_id: Uuid,
        cmd: NewSaving,
    ) -> ResultEngine<SavingCreated> {
        let item_name =
            normalize_required_text(&cmd.item_name, "item name", SAVING_ITEM_NAME_MAX, true)?;
        let amount = validate_amount(cmd.amount, "amount")?;
        let category =
            normalize_optional_text(cmd.category.as_deref(), "category", SAVING_CATEGORY_MAX)?;
        let memo = normalize_optional_text(cmd.memo.as_deref(), "memo", SAVING_MEMO_MAX)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            let goal = self.require_goal_owned(&db_tx, cmd.goal_id, user_id).await?;
            let count = savings::Entity::find()
                .filter(savings::Column::GoalId.eq(goal.id.as_str()))
                .count(&db_tx)
                .await?;
            if count >= self.limits.max_savings_per_goal {
                return Err(EngineError::LimitReached(format!(
                    "at most {} savings per goal",
                    self.limits.max_savings_per_goal
                )));
            }

            let entry = SavingEntry {
                id: Uuid::new_v4(),
                user_id,
                goal_id: cmd.goal_id,
                item_name,
                amount,
                category,
                memo,
                occurred_at: cmd.occurred_at.unwrap_or(now),
            };
            savings::ActiveModel::from(&entry).insert(&db_tx).await?;

            let current_amount = goal.current_amount.saturating_add(amount);
            let GoalRecomputed {
                goal,
                newly_achieved,
            } = self
                .set_current_amount(&db_tx, goal, current_amount, now)
                .await?;
            tracing::debug!(saving_id = %entry.id, goal_id = %goal.id, amount, "saving logged");
            Ok(SavingCreated {
                entry,
                goal,
                newly_achieved,
            })
        })
    }

    pub async fn saving(&self, user_id: Uuid, saving_id: Uuid) -> ResultEngine<SavingEntry> {
        let model = self
            .require_saving_owned(&self.database, saving_id, user_id)
            .await?;
        SavingEntry::try_from(model)
    }

    /// Entries of one goal, newest first.
    pub async fn list_savings(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
    ) -> ResultEngine<Vec<SavingEntry>> {
        let goal = self
            .require_goal_owned(&self.database, goal_id, user_id)
            .await?;
        savings::Entity::find()
            .filter(savings::Column::GoalId.eq(goal.id))
            .order_by_desc(savings::Column::OccurredAt)
            .order_by_desc(savings::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(SavingEntry::try_from)
            .collect()
    }

    /// Edits an entry and recomputes its goal in the same transaction.
    pub async fn update_saving(
        &self,
        user_id: Uuid,
        saving_id: Uuid,
        cmd: SavingUpdate,
    ) -> ResultEngine<(SavingEntry, GoalRecomputed)> {
        let item_name = cmd
            .item_name
            .as_deref()
            .map(|name| normalize_required_text(name, "item name", SAVING_ITEM_NAME_MAX, true))
            .transpose()?;
        let amount = cmd
            .amount
            .map(|amount| validate_amount(amount, "amount"))
            .transpose()?;
        let category = cmd
            .category
            .as_deref()
            .map(|value| normalize_optional_text(Some(value), "category", SAVING_CATEGORY_MAX))
            .transpose()?;
        let memo = cmd
            .memo
            .as_deref()
            .map(|value| normalize_optional_text(Some(value), "memo", SAVING_MEMO_MAX))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_saving_owned(&db_tx, saving_id, user_id)
                .await?;
            let mut active = savings::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if let Some(item_name) = item_name {
                active.item_name = ActiveValue::Set(item_name);
            }
            if let Some(amount) = amount {
                active.amount = ActiveValue::Set(amount);
            }
            if let Some(category) = category {
                active.category = ActiveValue::Set(category);
            }
            if let Some(memo) = memo {
                active.memo = ActiveValue::Set(memo);
            }
            if let Some(occurred_at) = cmd.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
            }
            let updated = if active.is_changed() {
                active.update(&db_tx).await?
            } else {
                model
            };

            let goal_id = parse_uuid(&updated.goal_id, "goal")?;
            let goal = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let recomputed = self.recompute_goal(&db_tx, goal, Utc::now()).await?;
            Ok((SavingEntry::try_from(updated)?, recomputed))
        })
    }

    /// Removes an entry and recomputes its goal in the same transaction.
    pub async fn delete_saving(
        &self,
        user_id: Uuid,
        saving_id: Uuid,
    ) -> ResultEngine<GoalRecomputed> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_saving_owned(&db_tx, saving_id, user_id)
                .await?;
            savings::Entity::delete_by_id(model.id.clone())
                .exec(&db_tx)
                .await?;
            let goal = goals::Entity::find_by_id(model.goal_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
            let recomputed = self.recompute_goal(&db_tx, goal, Utc::now()).await?;
            tracing::debug!(%saving_id, goal_id = %model.goal_id, "saving deleted");
            Ok(recomputed)
        })
    }
}
