//! Authentication gateway: sign-up, sign-in, sign-out, password reset and
//! session lookup.
//!
//! Every entry point returns failures as [`AuthError`] categories. A lost
//! database connection is reported as [`AuthError::NetworkFailure`].

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AuthError, EngineError, OAuthIdentity, OAuthOutcome, PasswordResetTicket, ResultEngine,
    Session, SessionEvent, User, password_resets,
    sessions::{self, hash_token, new_token},
    users::{self, NewAccount, PASSWORD_PROVIDER},
    util::{
        DISPLAY_NAME_MAX, normalize_email, normalize_required_text, parse_uuid, validate_password,
    },
};

use super::{
    Engine,
    users::{DEFAULT_DISPLAY_NAME, is_locked},
    with_tx,
};

/// Outcome of a password check whose side effects must be committed even when
/// the sign-in is refused.
enum SignInAttempt {
    Accepted(Session),
    Rejected(AuthError),
}

impl Engine {
    /// Registers an email/password account and signs it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ResultEngine<Session> {
        let session = self
            .create_account(email, password, display_name)
            .await
            .map_err(EngineError::into_auth_failure)?;
        tracing::info!(user_id = %session.user.id, "signed up");
        self.publish(SessionEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(session)
    }

    /// Signs in with email and password.
    ///
    /// Consecutive failures are counted; once the policy limit is hit the
    /// account refuses sign-ins until the lockout expires.
    pub async fn sign_in(&self, email: &str, password: &str) -> ResultEngine<Session> {
        let attempt = self
            .check_password(email, password)
            .await
            .map_err(EngineError::into_auth_failure)?;
        match attempt {
            SignInAttempt::Accepted(session) => {
                tracing::info!(user_id = %session.user.id, "signed in");
                self.publish(SessionEvent::SignedIn {
                    user_id: session.user.id,
                });
                Ok(session)
            }
            SignInAttempt::Rejected(err) => Err(err.into()),
        }
    }

    /// Completes an OAuth popup flow.
    ///
    /// A known provider identity signs into its account. An unknown one
    /// creates an account, or links to an admin-provisioned account without
    /// credentials that carries the same email.
    pub async fn sign_in_with_oauth(&self, outcome: OAuthOutcome) -> ResultEngine<Session> {
        let identity = match outcome {
            OAuthOutcome::Completed(identity) => identity,
            OAuthOutcome::Cancelled => return Err(AuthError::PopupClosed.into()),
            OAuthOutcome::Blocked => return Err(AuthError::PopupBlocked.into()),
        };
        let provider = identity.provider.trim().to_lowercase();
        let session = self
            .oauth_account(identity)
            .await
            .map_err(EngineError::into_auth_failure)?;
        tracing::info!(user_id = %session.user.id, provider = %provider, "signed in with oauth");
        self.publish(SessionEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(session)
    }

    /// Ends the session. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> ResultEngine<()> {
        let ended = self
            .delete_session(token)
            .await
            .map_err(EngineError::into_auth_failure)?;
        if let Some(user_id) = ended {
            tracing::info!(%user_id, "signed out");
            self.publish(SessionEvent::SignedOut { user_id });
        }
        Ok(())
    }

    /// Resolves a bearer token to its user.
    pub async fn session_user(&self, token: &str) -> ResultEngine<User> {
        self.lookup_session(token)
            .await
            .map_err(EngineError::into_auth_failure)
    }

    /// Issues a password-reset token for out-of-band delivery.
    pub async fn request_password_reset(&self, email: &str) -> ResultEngine<PasswordResetTicket> {
        let ticket = self
            .issue_reset(email)
            .await
            .map_err(EngineError::into_auth_failure)?;
        tracing::info!(user_id = %ticket.user_id, "password reset requested");
        Ok(ticket)
    }

    /// Sets a new password from a reset token.
    ///
    /// Clears any lockout and revokes every session of the user.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        let (user_id, revoked) = self
            .apply_reset(token, new_password)
            .await
            .map_err(EngineError::into_auth_failure)?;
        tracing::info!(%user_id, revoked, "password reset completed");
        if revoked > 0 {
            self.publish(SessionEvent::SignedOut { user_id });
        }
        Ok(())
    }

    /// Replaces the password after re-checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        self.replace_password(user_id, current_password, new_password)
            .await
            .map_err(EngineError::into_auth_failure)?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ResultEngine<Session> {
        let email = normalize_email(email)?;
        validate_password(password)?;
        let display_name =
            normalize_required_text(display_name, "display name", DISPLAY_NAME_MAX, true)?;
        let password_hash = hash_password(password)?;

        with_tx!(self, |db_tx| {
            if self.find_user_by_email(&db_tx, &email).await?.is_some() {
                return Err(AuthError::EmailInUse.into());
            }
            let now = Utc::now();
            let model = self
                .insert_account(
                    &db_tx,
                    NewAccount {
                        id: Uuid::new_v4(),
                        email: &email,
                        display_name: &display_name,
                        role: self.initial_role(&email),
                        password_hash: Some(password_hash),
                        provider: PASSWORD_PROVIDER,
                        provider_subject: None,
                        now,
                    },
                )
                .await?;
            self.open_session(&db_tx, User::try_from(model)?, now).await
        })
    }

    /// A wrong password still commits the failure counter, so it comes back
    /// as `Ok(Rejected)`.
    async fn check_password(&self, email: &str, password: &str) -> ResultEngine<SignInAttempt> {
        let email = normalize_email(email)?;
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let Some(model) = self.find_user_by_email(&db_tx, &email).await? else {
                return Err(AuthError::UserNotFound.into());
            };
            if is_locked(&model, now) {
                return Err(AuthError::TooManyRequests.into());
            }
            let Some(stored_hash) = model.password_hash.as_deref() else {
                if model.provider != PASSWORD_PROVIDER {
                    return Err(AuthError::AccountExistsWithDifferentCredential.into());
                }
                return Err(AuthError::InvalidCredential.into());
            };

            if verify_password(password, stored_hash)? {
                if model.failed_attempts != 0 || model.locked_until.is_some() {
                    self.reset_failures(&db_tx, &model.id, now).await?;
                }
                let session = self
                    .open_session(&db_tx, User::try_from(model)?, now)
                    .await?;
                Ok(SignInAttempt::Accepted(session))
            } else {
                self.record_failure(&db_tx, model, now).await?;
                Ok(SignInAttempt::Rejected(AuthError::InvalidCredential))
            }
        })
    }

    async fn oauth_account(&self, identity: OAuthIdentity) -> ResultEngine<Session> {
        let OAuthIdentity {
            provider,
            subject,
            email,
            display_name,
        } = identity;
        let provider = provider.trim().to_lowercase();
        let subject = subject.trim().to_string();
        if provider.is_empty() || provider == PASSWORD_PROVIDER || subject.is_empty() {
            return Err(AuthError::InvalidCredential.into());
        }
        let email = normalize_email(&email)?;
        let display_name = display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| normalize_required_text(name, "display name", DISPLAY_NAME_MAX, true))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let linked = users::Entity::find()
                .filter(users::Column::Provider.eq(provider.as_str()))
                .filter(users::Column::ProviderSubject.eq(subject.as_str()))
                .one(&db_tx)
                .await?;
            let model = match linked {
                Some(model) => model,
                None => match self.find_user_by_email(&db_tx, &email).await? {
                    Some(existing)
                        if existing.password_hash.is_none()
                            && existing.provider_subject.is_none() =>
                    {
                        users::ActiveModel {
                            id: ActiveValue::Set(existing.id),
                            provider: ActiveValue::Set(provider.clone()),
                            provider_subject: ActiveValue::Set(Some(subject.clone())),
                            updated_at: ActiveValue::Set(now),
                            ..Default::default()
                        }
                        .update(&db_tx)
                        .await?
                    }
                    Some(_) => return Err(AuthError::AccountExistsWithDifferentCredential.into()),
                    None => {
                        self.insert_account(
                            &db_tx,
                            NewAccount {
                                id: Uuid::new_v4(),
                                email: &email,
                                display_name: &display_name,
                                role: self.initial_role(&email),
                                password_hash: None,
                                provider: &provider,
                                provider_subject: Some(&subject),
                                now,
                            },
                        )
                        .await?
                    }
                },
            };
            self.open_session(&db_tx, User::try_from(model)?, now).await
        })
    }

    async fn delete_session(&self, token: &str) -> ResultEngine<Option<Uuid>> {
        let token_hash = hash_token(token);
        with_tx!(self, |db_tx| {
            match sessions::Entity::find_by_id(token_hash.clone())
                .one(&db_tx)
                .await?
            {
                Some(model) => {
                    sessions::Entity::delete_by_id(token_hash.clone())
                        .exec(&db_tx)
                        .await?;
                    parse_uuid(&model.user_id, "user").map(Some)
                }
                None => Ok(None),
            }
        })
    }

    async fn lookup_session(&self, token: &str) -> ResultEngine<User> {
        let token_hash = hash_token(token);
        let Some(session) = sessions::Entity::find_by_id(token_hash.clone())
            .one(&self.database)
            .await?
        else {
            return Err(AuthError::SessionExpired.into());
        };
        if session.expires_at <= Utc::now() {
            sessions::Entity::delete_by_id(token_hash)
                .exec(&self.database)
                .await?;
            return Err(AuthError::SessionExpired.into());
        }
        let user_id = parse_uuid(&session.user_id, "user")?;
        let model = self
            .find_user(&self.database, user_id)
            .await?
            .ok_or(AuthError::SessionExpired)?;
        User::try_from(model)
    }

    async fn issue_reset(&self, email: &str) -> ResultEngine<PasswordResetTicket> {
        let email = normalize_email(email)?;
        with_tx!(self, |db_tx| {
            let Some(model) = self.find_user_by_email(&db_tx, &email).await? else {
                return Err(AuthError::UserNotFound.into());
            };
            let now = Utc::now();
            let token = new_token();
            let expires_at = now + self.auth_policy.reset_token_ttl();
            password_resets::ActiveModel {
                token_hash: ActiveValue::Set(hash_token(&token)),
                user_id: ActiveValue::Set(model.id.clone()),
                created_at: ActiveValue::Set(now),
                expires_at: ActiveValue::Set(expires_at),
            }
            .insert(&db_tx)
            .await?;
            Ok(PasswordResetTicket {
                user_id: parse_uuid(&model.id, "user")?,
                email: email.clone(),
                token,
                expires_at,
            })
        })
    }

    /// Returns the user and how many sessions were revoked.
    async fn apply_reset(&self, token: &str, new_password: &str) -> ResultEngine<(Uuid, u64)> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;
        let token_hash = hash_token(token);
        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let reset = password_resets::Entity::find_by_id(token_hash.clone())
                .one(&db_tx)
                .await?
                .filter(|reset| reset.expires_at > now)
                .ok_or(AuthError::InvalidCredential)?;
            password_resets::Entity::delete_many()
                .filter(password_resets::Column::UserId.eq(reset.user_id.as_str()))
                .exec(&db_tx)
                .await?;
            users::ActiveModel {
                id: ActiveValue::Set(reset.user_id.clone()),
                password_hash: ActiveValue::Set(Some(password_hash)),
                failed_attempts: ActiveValue::Set(0),
                locked_until: ActiveValue::Set(None),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            let revoked = self.revoke_sessions(&db_tx, &reset.user_id).await?;
            Ok((parse_uuid(&reset.user_id, "user")?, revoked))
        })
    }

    async fn replace_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        validate_password(new_password)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let Some(stored_hash) = model.password_hash.as_deref() else {
                return Err(AuthError::InvalidCredential.into());
            };
            if !verify_password(current_password, stored_hash)? {
                return Err(AuthError::InvalidCredential.into());
            }
            users::ActiveModel {
                id: ActiveValue::Set(model.id),
                password_hash: ActiveValue::Set(Some(hash_password(new_password)?)),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(())
        })
    }

    async fn open_session<C: ConnectionTrait>(
        &self,
        db: &C,
        user: User,
        now: DateTime<Utc>,
    ) -> ResultEngine<Session> {
        let token = new_token();
        let expires_at = now + self.auth_policy.session_ttl();
        sessions::ActiveModel {
            token_hash: ActiveValue::Set(hash_token(&token)),
            user_id: ActiveValue::Set(user.id.to_string()),
            created_at: ActiveValue::Set(now),
            expires_at: ActiveValue::Set(expires_at),
        }
        .insert(db)
        .await?;
        Ok(Session {
            token,
            user,
            expires_at,
        })
    }

    async fn revoke_sessions<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn reset_failures<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            failed_attempts: ActiveValue::Set(0),
            locked_until: ActiveValue::Set(None),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    async fn record_failure<C: ConnectionTrait>(
        &self,
        db: &C,
        model: users::Model,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let failed_attempts = model.failed_attempts.saturating_add(1);
        let (failed_attempts, locked_until) =
            if failed_attempts >= self.auth_policy.max_failed_attempts.max(1) {
                tracing::warn!(user_id = %model.id, "account locked after failed sign-ins");
                (0, Some(now + self.auth_policy.lockout()))
            } else {
                (failed_attempts, None)
            };
        users::ActiveModel {
            id: ActiveValue::Set(model.id),
            failed_attempts: ActiveValue::Set(failed_attempts),
            locked_until: ActiveValue::Set(locked_until),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }
}

fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Internal(format!("password hashing failed: {err}")))
}

fn verify_password(candidate: &str, stored_hash: &str) -> ResultEngine<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| EngineError::Internal(format!("invalid stored password hash: {err}")))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(other) => Err(EngineError::Internal(format!(
            "password verification failed: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("secret124", &hash).unwrap());
    }

    #[test]
    fn corrupt_hash_is_internal_error() {
        assert!(matches!(
            verify_password("secret123", "not-a-hash"),
            Err(EngineError::Internal(_))
        ));
    }
}
