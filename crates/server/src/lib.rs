use api_types::{AmountInput, ErrorBody};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{AuthError, EngineError, is_unavailable};

pub use server::{ServerState, router, run_with_listener};

mod auth;
mod feedback;
mod goals;
mod legal;
mod savings;
mod server;
mod user;

pub enum ServerError {
    Engine(EngineError),
    /// Missing or malformed bearer token.
    Unauthorized,
    Generic(String),
}

fn status_for_auth_error(err: AuthError) -> StatusCode {
    match err {
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::InvalidCredential | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
        AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::EmailInUse | AuthError::AccountExistsWithDifferentCredential => {
            StatusCode::CONFLICT
        }
        AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        AuthError::NetworkFailure => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::PopupClosed | AuthError::PopupBlocked => StatusCode::BAD_REQUEST,
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::InvalidInput(_) | EngineError::LimitReached(_) | EngineError::InvalidId(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::Auth(err) => status_for_auth_error(*err),
        EngineError::Database(err) if is_unavailable(err) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Database(_) | EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) if is_unavailable(&db_err) => {
            tracing::error!("database unavailable: {db_err}");
            "service temporarily unavailable".to_string()
        }
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Internal(msg) => {
            tracing::error!("internal error: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, code) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let code = err.code();
                (status, message_for_engine_error(err), code)
            }
            ServerError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or malformed bearer token".to_string(),
                AuthError::SessionExpired.code(),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err, "bad-request"),
        };

        (
            status,
            Json(ErrorBody {
                error,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        Self::Engine(value.into())
    }
}

/// Numbers pass through, text keeps only its digits.
fn amount(input: AmountInput) -> i64 {
    match input {
        AmountInput::Number(value) => value,
        AmountInput::Text(text) => engine::parse_amount_input(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidInput("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::LimitReached("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn auth_errors_map_to_their_statuses() {
        let cases = [
            (AuthError::InvalidCredential, StatusCode::UNAUTHORIZED),
            (AuthError::SessionExpired, StatusCode::UNAUTHORIZED),
            (AuthError::EmailInUse, StatusCode::CONFLICT),
            (AuthError::WeakPassword, StatusCode::UNPROCESSABLE_ENTITY),
            (AuthError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::PopupClosed, StatusCode::BAD_REQUEST),
            (AuthError::NetworkFailure, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).into_response().status(), status, "{err:?}");
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let msg = message_for_engine_error(EngineError::Internal("secret".to_string()));
        assert_eq!(msg, "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn amount_text_keeps_digits() {
        assert_eq!(amount(AmountInput::Text("1,200円".to_string())), 1200);
        assert_eq!(amount(AmountInput::Number(5)), 5);
    }
}
