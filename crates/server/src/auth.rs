//! Sign-up, sign-in and password reset endpoints.

use api_types::auth::{
    OAuthSignIn, OAuthStatus, PasswordResetConfirm, PasswordResetRequest, SessionResponse, SignIn,
    SignUp,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{AuthError, OAuthIdentity, OAuthOutcome, Session};

use crate::{
    ServerError,
    server::{ServerState, SessionToken},
    user::user_view,
};

fn session_response(session: Session) -> SessionResponse {
    SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user_view(session.user),
    }
}

pub async fn sign_up(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<SessionResponse>), ServerError> {
    let session = state
        .engine
        .sign_up(&payload.email, &payload.password, &payload.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(session_response(session))))
}

pub async fn sign_in(
    State(state): State<ServerState>,
    Json(payload): Json<SignIn>,
) -> Result<Json<SessionResponse>, ServerError> {
    let session = state
        .engine
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(Json(session_response(session)))
}

pub async fn oauth(
    State(state): State<ServerState>,
    Json(payload): Json<OAuthSignIn>,
) -> Result<Json<SessionResponse>, ServerError> {
    let outcome = match payload.status {
        OAuthStatus::Cancelled => OAuthOutcome::Cancelled,
        OAuthStatus::Blocked => OAuthOutcome::Blocked,
        OAuthStatus::Completed => {
            let (Some(provider), Some(subject), Some(email)) =
                (payload.provider, payload.subject, payload.email)
            else {
                return Err(AuthError::InvalidCredential.into());
            };
            OAuthOutcome::Completed(OAuthIdentity {
                provider,
                subject,
                email,
                display_name: payload.display_name,
            })
        }
    };
    let session = state.engine.sign_in_with_oauth(outcome).await?;
    Ok(Json(session_response(session)))
}

pub async fn sign_out(
    Extension(token): Extension<SessionToken>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.sign_out(&token.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The reset link goes out through the `mail` log target; the response never
/// carries the token.
pub async fn request_password_reset(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<StatusCode, ServerError> {
    let ticket = state.engine.request_password_reset(&payload.email).await?;
    tracing::info!(
        target: "mail",
        to = %ticket.email,
        token = %ticket.token,
        expires_at = %ticket.expires_at,
        "password reset requested"
    );
    Ok(StatusCode::ACCEPTED)
}

pub async fn confirm_password_reset(
    State(state): State<ServerState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .confirm_password_reset(&payload.token, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
