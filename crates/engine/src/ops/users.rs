use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    AuthError, EngineError, ResultEngine, Role, User,
    users::{self, NewAccount, PASSWORD_PROVIDER},
    util::{DISPLAY_NAME_MAX, normalize_email, normalize_required_text},
};

use super::{Engine, with_tx};

/// Display name used when none is known at account creation.
pub(super) const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

impl Engine {
    /// Returns the profile for `user_id`, creating it with the `user` role on
    /// first sight.
    pub async fn get_or_create_user(
        &self,
        user_id: Uuid,
        email: &str,
        display_name: Option<&str>,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let display_name = default_display_name(display_name)?;
        with_tx!(self, |db_tx| {
            let model = match self.find_user(&db_tx, user_id).await? {
                Some(model) => model,
                None => {
                    if self.find_user_by_email(&db_tx, &email).await?.is_some() {
                        return Err(AuthError::EmailInUse.into());
                    }
                    self.insert_account(
                        &db_tx,
                        NewAccount {
                            id: user_id,
                            email: &email,
                            display_name: &display_name,
                            role: self.initial_role(&email),
                            password_hash: None,
                            provider: PASSWORD_PROVIDER,
                            provider_subject: None,
                            now: Utc::now(),
                        },
                    )
                    .await?
                }
            };
            User::try_from(model)
        })
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = self.require_user(&self.database, user_id).await?;
        User::try_from(model)
    }

    pub async fn update_display_name(
        &self,
        user_id: Uuid,
        display_name: &str,
    ) -> ResultEngine<User> {
        let display_name =
            normalize_required_text(display_name, "display name", DISPLAY_NAME_MAX, true)?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let model = users::ActiveModel {
                id: ActiveValue::Set(user_id.to_string()),
                display_name: ActiveValue::Set(display_name),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            User::try_from(model)
        })
    }

    /// Changes the role of `user_id`. Admin only.
    ///
    /// The last remaining admin cannot be demoted.
    pub async fn set_role(&self, admin_id: Uuid, user_id: Uuid, role: Role) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let target = self.require_user(&db_tx, user_id).await?;
            let current = Role::try_from(target.role.as_str())?;
            if current == Role::Admin && role == Role::User {
                let admins = users::Entity::find()
                    .filter(users::Column::Role.eq(Role::Admin.as_str()))
                    .count(&db_tx)
                    .await?;
                if admins <= 1 {
                    return Err(EngineError::Forbidden(
                        "cannot demote the last admin".to_string(),
                    ));
                }
            }
            let model = users::ActiveModel {
                id: ActiveValue::Set(target.id),
                role: ActiveValue::Set(role.as_str().to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%admin_id, %user_id, role = role.as_str(), "role changed");
            User::try_from(model)
        })
    }

    /// All users, oldest first. Admin only.
    pub async fn list_users(&self, admin_id: Uuid) -> ResultEngine<Vec<User>> {
        self.require_admin(&self.database, admin_id).await?;
        users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Email)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Provisions an account without a password. Admin only.
    ///
    /// The new user sets a password through the reset flow or signs in with
    /// an OAuth provider using the same email.
    pub async fn admin_create_user(
        &self,
        admin_id: Uuid,
        email: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> ResultEngine<User> {
        let email = normalize_email(email)?;
        let display_name = default_display_name(display_name)?;
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            if self.find_user_by_email(&db_tx, &email).await?.is_some() {
                return Err(AuthError::EmailInUse.into());
            }
            let model = self
                .insert_account(
                    &db_tx,
                    NewAccount {
                        id: Uuid::new_v4(),
                        email: &email,
                        display_name: &display_name,
                        role,
                        password_hash: None,
                        provider: PASSWORD_PROVIDER,
                        provider_subject: None,
                        now: Utc::now(),
                    },
                )
                .await?;
            tracing::info!(%admin_id, email = %email, "user provisioned");
            User::try_from(model)
        })
    }

    pub(super) async fn find_user_by_email<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn insert_account<C: ConnectionTrait>(
        &self,
        db: &C,
        account: NewAccount<'_>,
    ) -> ResultEngine<users::Model> {
        let model = users::ActiveModel::from(account).insert(db).await?;
        tracing::debug!(user_id = %model.id, "account created");
        Ok(model)
    }

    pub(super) fn initial_role(&self, email: &str) -> Role {
        if self.auth_policy.is_bootstrap_admin(email) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

fn default_display_name(value: Option<&str>) -> ResultEngine<String> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => normalize_required_text(name, "display name", DISPLAY_NAME_MAX, true),
        None => Ok(DEFAULT_DISPLAY_NAME.to_string()),
    }
}

/// `true` while a lockout is still running at `now`.
pub(super) fn is_locked(model: &users::Model, now: DateTime<Utc>) -> bool {
    model.locked_until.is_some_and(|until| until > now)
}
