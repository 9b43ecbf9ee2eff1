//! Goals API endpoints.

use api_types::goal::{
    DeadlineStatus as ApiDeadlineStatus, GoalListParams, GoalNew, GoalOrder, GoalRecomputed,
    GoalUpdate, GoalView, GoalsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    DeadlineStatus, Goal, GoalListQuery, GoalSort, GoalStatusFilter, NewGoal, SortOrder, User,
};
use uuid::Uuid;

use crate::{ServerError, amount, server::ServerState};

fn map_deadline_status(status: DeadlineStatus) -> ApiDeadlineStatus {
    match status {
        DeadlineStatus::Remaining(days) => ApiDeadlineStatus::Remaining(days),
        DeadlineStatus::DueToday => ApiDeadlineStatus::DueToday,
        DeadlineStatus::Overdue(days) => ApiDeadlineStatus::Overdue(days),
    }
}

pub(crate) fn goal_view(view: engine::GoalView) -> GoalView {
    let engine::GoalView {
        goal,
        progress_percent,
        days_left,
        deadline_status,
    } = view;
    GoalView {
        id: goal.id,
        title: goal.title,
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        deadline: goal.deadline,
        order: goal.order,
        achieved_at: goal.achieved_at,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
        progress_percent,
        days_left,
        deadline_status: map_deadline_status(deadline_status),
    }
}

/// Decorates a goal with progress figures as of now.
pub(crate) fn decorate(goal: Goal) -> GoalView {
    goal_view(engine::GoalView::new(goal, Utc::now()))
}

fn list_query(params: GoalListParams) -> Result<GoalListQuery, ServerError> {
    Ok(GoalListQuery {
        status: params
            .status
            .as_deref()
            .map(GoalStatusFilter::try_from)
            .transpose()?
            .unwrap_or_default(),
        sort: params.sort.as_deref().map(GoalSort::try_from).transpose()?,
        order: params
            .order
            .as_deref()
            .map(SortOrder::try_from)
            .transpose()?
            .unwrap_or_default(),
    })
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(params): Query<GoalListParams>,
) -> Result<Json<GoalsResponse>, ServerError> {
    let query = list_query(params)?;
    let views = state
        .engine
        .list_goal_views(user.id, query, Utc::now())
        .await?;
    Ok(Json(GoalsResponse {
        goals: views.into_iter().map(goal_view).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let cmd = NewGoal {
        title: payload.title,
        target_amount: amount(payload.target_amount),
        current_amount: payload.current_amount.map_or(0, amount),
        deadline: payload.deadline,
    };
    let goal = state.engine.create_goal(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(decorate(goal))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.goal(user.id, goal_id).await?;
    Ok(Json(decorate(goal)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let cmd = engine::GoalUpdate {
        title: payload.title,
        target_amount: payload.target_amount.map(amount),
        current_amount: payload.current_amount.map(amount),
        deadline: payload.deadline,
    };
    if cmd.is_empty() {
        return Err(ServerError::Generic(
            "provide at least one of title, targetAmount, currentAmount or deadline".to_string(),
        ));
    }
    let goal = state.engine.update_goal(user.id, goal_id, cmd).await?;
    Ok(Json(decorate(goal)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_goal(user.id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalOrder>,
) -> Result<Json<GoalsResponse>, ServerError> {
    let goals = state.engine.reorder_goals(user.id, &payload.ids).await?;
    Ok(Json(GoalsResponse {
        goals: goals.into_iter().map(decorate).collect(),
    }))
}

pub async fn recompute(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalRecomputed>, ServerError> {
    let recomputed = state
        .engine
        .recompute_current_amount(user.id, goal_id)
        .await?;
    Ok(Json(GoalRecomputed {
        goal: decorate(recomputed.goal),
        newly_achieved: recomputed.newly_achieved,
    }))
}
