//! Profile and admin user-management endpoints.

use api_types::user::{
    DisplayNameUpdate, PasswordChange, Role as ApiRole, RoleUpdate, UserNew, UserView,
    UsersResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Role, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_role(role: Role) -> ApiRole {
    match role {
        Role::User => ApiRole::User,
        Role::Admin => ApiRole::Admin,
    }
}

fn engine_role(role: ApiRole) -> Role {
    match role {
        ApiRole::User => Role::User,
        ApiRole::Admin => Role::Admin,
    }
}

pub(crate) fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        display_name: user.display_name,
        email: user.email,
        role: map_role(user.role),
        provider: user.provider,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user_view(user))
}

pub async fn update_me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<DisplayNameUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_display_name(user.id, &payload.display_name)
        .await?;
    Ok(Json(user_view(user)))
}

pub async fn change_password(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<UsersResponse>, ServerError> {
    let users = state.engine.list_users(user.id).await?;
    Ok(Json(UsersResponse {
        users: users.into_iter().map(user_view).collect(),
    }))
}

pub async fn create_user(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let role = payload.role.map_or(Role::User, engine_role);
    let created = state
        .engine
        .admin_create_user(user.id, &payload.email, payload.display_name.as_deref(), role)
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(created))))
}

pub async fn set_role(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let updated = state
        .engine
        .set_role(user.id, user_id, engine_role(payload.role))
        .await?;
    Ok(Json(user_view(updated)))
}
