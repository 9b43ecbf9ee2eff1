//! Feedback API endpoints.

use api_types::feedback::{
    FeedbackCategory as ApiCategory, FeedbackListParams, FeedbackListResponse, FeedbackNew,
    FeedbackStatus as ApiStatus, FeedbackStatusUpdate, FeedbackView, VoteResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    Feedback, FeedbackCategory, FeedbackFilter, FeedbackStatus, FeedbackStatusFilter,
    NewFeedback, User,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_category(category: FeedbackCategory) -> ApiCategory {
    match category {
        FeedbackCategory::Feature => ApiCategory::Feature,
        FeedbackCategory::Bug => ApiCategory::Bug,
        FeedbackCategory::Improvement => ApiCategory::Improvement,
    }
}

fn engine_category(category: ApiCategory) -> FeedbackCategory {
    match category {
        ApiCategory::Feature => FeedbackCategory::Feature,
        ApiCategory::Bug => FeedbackCategory::Bug,
        ApiCategory::Improvement => FeedbackCategory::Improvement,
    }
}

fn map_status(status: Option<FeedbackStatus>) -> ApiStatus {
    match status {
        None => ApiStatus::Open,
        Some(FeedbackStatus::Scheduled) => ApiStatus::Scheduled,
        Some(FeedbackStatus::Completed) => ApiStatus::Completed,
    }
}

/// Open items carry no stored status.
fn engine_status(status: ApiStatus) -> Option<FeedbackStatus> {
    match status {
        ApiStatus::Open => None,
        ApiStatus::Scheduled => Some(FeedbackStatus::Scheduled),
        ApiStatus::Completed => Some(FeedbackStatus::Completed),
    }
}

/// `viewer` decides `hasVoted`.
fn feedback_view(feedback: Feedback, viewer: Uuid) -> FeedbackView {
    FeedbackView {
        has_voted: feedback.has_voted(viewer),
        id: feedback.id,
        user_id: feedback.user_id,
        user_display_name: feedback.user_display_name,
        title: feedback.title,
        description: feedback.description,
        category: map_category(feedback.category),
        status: map_status(feedback.status),
        votes: feedback.votes,
        voters: feedback.voters,
        created_at: feedback.created_at,
        updated_at: feedback.updated_at,
        completed_at: feedback.completed_at,
        completed_by: feedback.completed_by,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(params): Query<FeedbackListParams>,
) -> Result<Json<FeedbackListResponse>, ServerError> {
    let filter = FeedbackFilter {
        category: params.category.map(engine_category),
        status: params
            .status
            .as_deref()
            .map(FeedbackStatusFilter::try_from)
            .transpose()?,
    };
    let items = state.engine.list_feedback(filter).await?;
    Ok(Json(FeedbackListResponse {
        feedback: items
            .into_iter()
            .map(|item| feedback_view(item, user.id))
            .collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<FeedbackNew>,
) -> Result<(StatusCode, Json<FeedbackView>), ServerError> {
    let cmd = NewFeedback::new(
        payload.title,
        payload.description,
        engine_category(payload.category),
    );
    let item = state.engine.create_feedback(user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(feedback_view(item, user.id))))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(feedback_id): Path<Uuid>,
) -> Result<Json<FeedbackView>, ServerError> {
    let item = state.engine.feedback(feedback_id).await?;
    Ok(Json(feedback_view(item, user.id)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(feedback_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_feedback(user.id, feedback_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(feedback_id): Path<Uuid>,
) -> Result<Json<VoteResponse>, ServerError> {
    let outcome = state.engine.vote_feedback(user.id, feedback_id).await?;
    Ok(Json(VoteResponse {
        voted: outcome.voted,
        votes: outcome.votes,
    }))
}

pub async fn set_status(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(feedback_id): Path<Uuid>,
    Json(payload): Json<FeedbackStatusUpdate>,
) -> Result<Json<FeedbackView>, ServerError> {
    let item = state
        .engine
        .set_feedback_status(user.id, feedback_id, payload.status.and_then(engine_status))
        .await?;
    Ok(Json(feedback_view(item, user.id)))
}
