//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidInput`] thrown when a field fails validation.
//! - [`LimitReached`] thrown when a per-user or per-goal quota is exhausted.
//! - [`KeyNotFound`] thrown when an item is not found (or not owned by the
//!   caller).
//! - [`Forbidden`] thrown when an admin-only action is attempted by a user.
//! - [`Auth`] wraps the fixed set of user-facing [`AuthError`] categories.
//!
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`LimitReached`]: EngineError::LimitReached
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Auth`]: EngineError::Auth
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Limit reached: {0}")]
    LimitReached(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// User-facing authentication failures.
///
/// The messages are safe to show verbatim: they never carry backend details.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("no account is registered for this email address")]
    UserNotFound,
    #[error("the email address or password is incorrect")]
    InvalidCredential,
    #[error("the email address is not valid")]
    InvalidEmail,
    #[error("passwords need 8 to 128 characters including a letter and a digit")]
    WeakPassword,
    #[error("this email address is already in use")]
    EmailInUse,
    #[error("too many attempts, wait a while and try again")]
    TooManyRequests,
    #[error("the authentication service is unreachable")]
    NetworkFailure,
    #[error("sign-in was cancelled")]
    PopupClosed,
    #[error("the sign-in popup was blocked, allow popups and retry")]
    PopupBlocked,
    #[error("this email address is registered with a different sign-in method")]
    AccountExistsWithDifferentCredential,
    #[error("the session has expired, sign in again")]
    SessionExpired,
}

impl AuthError {
    /// Stable machine-readable code for clients.
    pub fn code(self) -> &'static str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::InvalidEmail => "auth/invalid-email",
            Self::WeakPassword => "auth/weak-password",
            Self::EmailInUse => "auth/email-already-in-use",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::NetworkFailure => "auth/network-request-failed",
            Self::PopupClosed => "auth/popup-closed-by-user",
            Self::PopupBlocked => "auth/popup-blocked",
            Self::AccountExistsWithDifferentCredential => {
                "auth/account-exists-with-different-credential"
            }
            Self::SessionExpired => "auth/session-expired",
        }
    }
}

impl EngineError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid-argument",
            Self::LimitReached(_) => "resource-exhausted",
            Self::KeyNotFound(_) => "not-found",
            Self::ExistingKey(_) => "already-exists",
            Self::Forbidden(_) => "permission-denied",
            Self::InvalidId(_) => "invalid-argument",
            Self::Internal(_) => "internal",
            Self::Auth(err) => err.code(),
            Self::Database(err) if is_unavailable(err) => "unavailable",
            Self::Database(_) => "internal",
        }
    }

    /// Auth entry points report a lost backend connection as a network
    /// failure, like an identity provider would.
    pub(crate) fn into_auth_failure(self) -> Self {
        match self {
            Self::Database(err) if is_unavailable(&err) => {
                tracing::error!("auth backend unavailable: {err}");
                Self::Auth(AuthError::NetworkFailure)
            }
            other => other,
        }
    }
}

/// `true` when the database error means the store cannot be reached at all.
pub fn is_unavailable(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::LimitReached(a), Self::LimitReached(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Auth(a), Self::Auth(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
