//! Saving entries API endpoints.
//!
//! Every write answers with the parent goal as well, since its amount moves
//! with the entry.

use api_types::saving::{SavingChanged, SavingNew, SavingUpdate, SavingView, SavingsResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{NewSaving, SavingEntry, User};
use uuid::Uuid;

use crate::{ServerError, amount, goals::decorate, server::ServerState};

fn saving_view(entry: SavingEntry) -> SavingView {
    SavingView {
        id: entry.id,
        goal_id: entry.goal_id,
        item_name: entry.item_name,
        amount: entry.amount,
        category: entry.category,
        memo: entry.memo,
        occurred_at: entry.occurred_at,
    }
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<SavingNew>,
) -> Result<(StatusCode, Json<SavingChanged>), ServerError> {
    let cmd = NewSaving {
        goal_id: payload.goal_id,
        item_name: payload.item_name,
        amount: amount(payload.amount),
        category: payload.category,
        memo: payload.memo,
        occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
    };
    let created = state.engine.create_saving(user.id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(SavingChanged {
            entry: Some(saving_view(created.entry)),
            goal: decorate(created.goal),
            newly_achieved: created.newly_achieved,
        }),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(saving_id): Path<Uuid>,
) -> Result<Json<SavingView>, ServerError> {
    let entry = state.engine.saving(user.id, saving_id).await?;
    Ok(Json(saving_view(entry)))
}

pub async fn list_for_goal(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<SavingsResponse>, ServerError> {
    let entries = state.engine.list_savings(user.id, goal_id).await?;
    Ok(Json(SavingsResponse {
        savings: entries.into_iter().map(saving_view).collect(),
    }))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(saving_id): Path<Uuid>,
    Json(payload): Json<SavingUpdate>,
) -> Result<Json<SavingChanged>, ServerError> {
    let cmd = engine::SavingUpdate {
        item_name: payload.item_name,
        amount: payload.amount.map(amount),
        category: payload.category,
        memo: payload.memo,
        occurred_at: payload.occurred_at.map(|at| at.with_timezone(&Utc)),
    };
    let (entry, recomputed) = state.engine.update_saving(user.id, saving_id, cmd).await?;
    Ok(Json(SavingChanged {
        entry: Some(saving_view(entry)),
        goal: decorate(recomputed.goal),
        newly_achieved: recomputed.newly_achieved,
    }))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(saving_id): Path<Uuid>,
) -> Result<Json<SavingChanged>, ServerError> {
    let recomputed = state.engine.delete_saving(user.id, saving_id).await?;
    Ok(Json(SavingChanged {
        entry: None,
        goal: decorate(recomputed.goal),
        newly_achieved: recomputed.newly_achieved,
    }))
}
