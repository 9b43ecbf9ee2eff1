use std::{cmp::Ordering, collections::HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalListQuery, GoalRecomputed, GoalSort, GoalStatusFilter, GoalUpdate,
    GoalView, NewGoal, ResultEngine, SortOrder, format_amount,
    goals::{self, achievement_transition},
    savings,
    util::{
        GOAL_TITLE_MAX, normalize_required_text, parse_deadline, validate_amount,
        validate_balance,
    },
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a goal at the end of the user's list.
    pub async fn create_goal(&self, user_id: Uuid, cmd: NewGoal) -> ResultEngine<Goal> {
        let title = normalize_required_text(&cmd.title, "title", GOAL_TITLE_MAX, true)?;
        let target_amount = validate_amount(cmd.target_amount, "target amount")?;
        let current_amount = validate_balance(cmd.current_amount, "current amount")?;
        let now = Utc::now();
        let deadline = match cmd.deadline.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_deadline(value)?,
            _ => now,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let count = goals::Entity::find()
                .filter(goals::Column::UserId.eq(user_id.to_string()))
                .count(&db_tx)
                .await?;
            if count >= self.limits.max_goals_per_user {
                return Err(EngineError::LimitReached(format!(
                    "at most {} goals per user",
                    self.limits.max_goals_per_user
                )));
            }
            let max_order: Option<Option<i32>> = goals::Entity::find()
                .select_only()
                .column_as(goals::Column::SortOrder.max(), "max_order")
                .filter(goals::Column::UserId.eq(user_id.to_string()))
                .into_tuple()
                .one(&db_tx)
                .await?;
            let order = max_order.flatten().map_or(0, |max| max + 1);

            let goal = Goal {
                id: Uuid::new_v4(),
                user_id,
                title,
                target_amount,
                current_amount,
                deadline,
                order,
                achieved_at: achievement_transition(current_amount, target_amount, None, now),
                created_at: now,
                updated_at: now,
            };
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;
            tracing::debug!(goal_id = %goal.id, %user_id, order, "goal created");
            Ok(goal)
        })
    }

    /// The user's goals in their explicit order.
    pub async fn goals(&self, user_id: Uuid) -> ResultEngine<Vec<Goal>> {
        self.load_goals(&self.database, user_id)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    pub async fn goal(&self, user_id: Uuid, goal_id: Uuid) -> ResultEngine<Goal> {
        let model = self
            .require_goal_owned(&self.database, goal_id, user_id)
            .await?;
        Goal::try_from(model)
    }

    /// Goals filtered by achievement and optionally re-sorted, with progress
    /// and deadline figures computed at `now`.
    pub async fn list_goal_views(
        &self,
        user_id: Uuid,
        query: GoalListQuery,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<GoalView>> {
        let mut views: Vec<GoalView> = self
            .goals(user_id)
            .await?
            .into_iter()
            .filter(|goal| match query.status {
                GoalStatusFilter::All => true,
                GoalStatusFilter::Completed => goal.is_achieved(),
                GoalStatusFilter::Incomplete => !goal.is_achieved(),
            })
            .map(|goal| GoalView::new(goal, now))
            .collect();

        if let Some(sort) = query.sort {
            views.sort_by(|a, b| {
                let ordering = compare_views(sort, a, b);
                match query.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
        Ok(views)
    }

    /// Applies a partial update and re-evaluates achievement.
    pub async fn update_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        cmd: GoalUpdate,
    ) -> ResultEngine<Goal> {
        if cmd.is_empty() {
            return Err(EngineError::InvalidInput("nothing to update".to_string()));
        }
        let title = cmd
            .title
            .as_deref()
            .map(|title| normalize_required_text(title, "title", GOAL_TITLE_MAX, true))
            .transpose()?;
        let target_amount = cmd
            .target_amount
            .map(|amount| validate_amount(amount, "target amount"))
            .transpose()?;
        let current_amount = cmd
            .current_amount
            .map(|amount| validate_balance(amount, "current amount"))
            .transpose()?;
        let deadline = cmd.deadline.as_deref().map(parse_deadline).transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let now = Utc::now();
            let target = target_amount.unwrap_or(model.target_amount);
            let current = current_amount.unwrap_or(model.current_amount);
            let achieved_at = achievement_transition(current, target, model.achieved_at, now);

            let mut active = goals::ActiveModel {
                id: ActiveValue::Set(model.id),
                target_amount: ActiveValue::Set(target),
                current_amount: ActiveValue::Set(current),
                achieved_at: ActiveValue::Set(achieved_at),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            };
            if let Some(title) = title {
                active.title = ActiveValue::Set(title);
            }
            if let Some(deadline) = deadline {
                active.deadline = ActiveValue::Set(deadline);
            }
            Goal::try_from(active.update(&db_tx).await?)
        })
    }

    /// Rewrites the order of the user's goals.
    ///
    /// `goal_ids` must list every goal of the user exactly once. Only goals
    /// whose position changed are written.
    pub async fn reorder_goals(
        &self,
        user_id: Uuid,
        goal_ids: &[Uuid],
    ) -> ResultEngine<Vec<Goal>> {
        with_tx!(self, |db_tx| {
            let models = self.load_goals(&db_tx, user_id).await?;
            let owned: HashSet<String> = models.iter().map(|m| m.id.clone()).collect();
            let requested: HashSet<String> = goal_ids.iter().map(Uuid::to_string).collect();
            if requested.len() != goal_ids.len() || requested != owned {
                return Err(EngineError::InvalidInput(
                    "the new order must list each goal exactly once".to_string(),
                ));
            }

            let now = Utc::now();
            let mut reordered = Vec::with_capacity(models.len());
            for (index, goal_id) in goal_ids.iter().enumerate() {
                let order = i32::try_from(index)
                    .map_err(|_| EngineError::InvalidInput("too many goals".to_string()))?;
                let id = goal_id.to_string();
                let Some(model) = models.iter().find(|m| m.id == id) else {
                    return Err(EngineError::KeyNotFound("goal not exists".to_string()));
                };
                let model = if model.sort_order == order {
                    model.clone()
                } else {
                    goals::ActiveModel {
                        id: ActiveValue::Set(id),
                        sort_order: ActiveValue::Set(order),
                        updated_at: ActiveValue::Set(now),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?
                };
                reordered.push(Goal::try_from(model)?);
            }
            Ok(reordered)
        })
    }

    /// Deletes the goal together with all of its saving entries.
    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            let removed = savings::Entity::delete_many()
                .filter(savings::Column::GoalId.eq(model.id.as_str()))
                .exec(&db_tx)
                .await?;
            goals::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            tracing::debug!(%goal_id, savings = removed.rows_affected, "goal deleted");
            Ok(())
        })
    }

    /// Re-sums the goal's saving entries into its current amount.
    pub async fn recompute_current_amount(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
    ) -> ResultEngine<GoalRecomputed> {
        with_tx!(self, |db_tx| {
            let model = self.require_goal_owned(&db_tx, goal_id, user_id).await?;
            self.recompute_goal(&db_tx, model, Utc::now()).await
        })
    }

    pub(super) async fn recompute_goal<C: ConnectionTrait>(
        &self,
        db: &C,
        model: goals::Model,
        now: DateTime<Utc>,
    ) -> ResultEngine<GoalRecomputed> {
        let total: Option<Option<i64>> = savings::Entity::find()
            .select_only()
            .column_as(savings::Column::Amount.sum(), "total")
            .filter(savings::Column::GoalId.eq(model.id.as_str()))
            .into_tuple()
            .one(db)
            .await?;
        let total = total.flatten().unwrap_or(0);
        self.set_current_amount(db, model, total, now).await
    }

    /// Writes a new current amount and the matching achievement state.
    pub(super) async fn set_current_amount<C: ConnectionTrait>(
        &self,
        db: &C,
        model: goals::Model,
        current_amount: i64,
        now: DateTime<Utc>,
    ) -> ResultEngine<GoalRecomputed> {
        let achieved_at =
            achievement_transition(current_amount, model.target_amount, model.achieved_at, now);
        let newly_achieved = model.achieved_at.is_none() && achieved_at.is_some();
        let updated = goals::ActiveModel {
            id: ActiveValue::Set(model.id),
            current_amount: ActiveValue::Set(current_amount),
            achieved_at: ActiveValue::Set(achieved_at),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
        if newly_achieved {
            tracing::info!(
                goal_id = %updated.id,
                target = %format_amount(updated.target_amount),
                "goal achieved"
            );
        }
        Ok(GoalRecomputed {
            goal: Goal::try_from(updated)?,
            newly_achieved,
        })
    }

    async fn load_goals<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Uuid,
    ) -> ResultEngine<Vec<goals::Model>> {
        goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(goals::Column::SortOrder)
            .order_by_asc(goals::Column::CreatedAt)
            .all(db)
            .await
            .map_err(Into::into)
    }
}

fn compare_views(sort: GoalSort, a: &GoalView, b: &GoalView) -> Ordering {
    match sort {
        GoalSort::Deadline => a.goal.deadline.cmp(&b.goal.deadline),
        GoalSort::Progress => a.progress_percent.total_cmp(&b.progress_percent),
        GoalSort::TargetAmount => a.goal.target_amount.cmp(&b.goal.target_amount),
    }
}
