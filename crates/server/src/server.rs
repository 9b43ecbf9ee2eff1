use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use tokio::sync::broadcast::error::RecvError;

use std::sync::Arc;

use crate::{ServerError, auth, feedback, goals, legal, savings, user};
use engine::{Engine, SessionEvent};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Bearer token of the current request, for handlers that act on the session
/// itself.
#[derive(Clone, Debug)]
pub struct SessionToken(pub String);

/// Resolves the bearer token into the signed-in [`engine::User`].
async fn authenticate(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    // Missing, non-bearer and unparsable headers all read as signed out.
    let TypedHeader(Authorization(bearer)) = auth_header.map_err(|rejection| {
        tracing::debug!(reason = ?rejection.reason(), "rejected authorization header");
        ServerError::Unauthorized
    })?;
    let token = bearer.token();
    if token.is_empty() {
        return Err(ServerError::Unauthorized);
    }

    let user = state.engine.session_user(token).await?;

    request
        .extensions_mut()
        .insert(SessionToken(token.to_string()));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/signout", post(auth::sign_out))
        .route("/me", get(user::me).patch(user::update_me))
        .route("/me/password", post(user::change_password))
        .route("/goals", get(goals::list).post(goals::create))
        .route("/goals/order", put(goals::reorder))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::delete),
        )
        .route("/goals/{id}/recompute", post(goals::recompute))
        .route("/goals/{id}/savings", get(savings::list_for_goal))
        .route("/savings", post(savings::create))
        .route(
            "/savings/{id}",
            get(savings::get)
                .patch(savings::update)
                .delete(savings::delete),
        )
        .route("/feedback", get(feedback::list).post(feedback::create))
        .route(
            "/feedback/{id}",
            get(feedback::get).delete(feedback::delete),
        )
        .route("/feedback/{id}/vote", post(feedback::vote))
        .route("/feedback/{id}/status", put(feedback::set_status))
        .route(
            "/admin/users",
            get(user::list_users).post(user::create_user),
        )
        .route("/admin/users/{id}/role", put(user::set_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/oauth", post(auth::oauth))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .route("/legal/terms", get(legal::terms))
        .route("/legal/privacy", get(legal::privacy))
        .merge(protected)
        .with_state(state)
}

/// Logs every session event until the engine goes away.
fn spawn_session_logger(engine: &Engine) {
    let mut events = engine.subscribe_sessions();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn { user_id }) => {
                    tracing::debug!(%user_id, "session opened");
                }
                Ok(SessionEvent::SignedOut { user_id }) => {
                    tracing::debug!(%user_id, "session closed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    spawn_session_logger(&engine);
    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}
