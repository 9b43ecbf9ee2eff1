//! Tunable quotas and authentication policy.
//!
//! Both structs deserialize with defaults so the application can embed them
//! directly in its settings file.

use chrono::Duration;
use serde::Deserialize;

const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;
const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;
const MAX_LOCKOUT_MINUTES: i64 = 60 * 24 * 30;

/// Per-user and per-goal quotas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_goals_per_user: u64,
    pub max_savings_per_goal: u64,
    pub max_feedback_per_user: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_goals_per_user: 10,
            max_savings_per_goal: 100,
            max_feedback_per_user: 5,
        }
    }
}

/// Session lifetime, password-reset lifetime and lockout rules.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthPolicy {
    pub session_ttl_hours: i64,
    pub reset_token_ttl_minutes: i64,
    /// Consecutive wrong passwords before the account is locked.
    pub max_failed_attempts: i32,
    pub lockout_minutes: i64,
    /// Accounts created with one of these emails start with the admin role.
    pub bootstrap_admins: Vec<String>,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 14,
            reset_token_ttl_minutes: 60,
            max_failed_attempts: 5,
            lockout_minutes: 15,
            bootstrap_admins: Vec::new(),
        }
    }
}

/// Lifetimes are clamped to `1..=max`.
impl AuthPolicy {
    pub(crate) fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }

    pub(crate) fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(
            self.reset_token_ttl_minutes
                .clamp(1, MAX_RESET_TOKEN_TTL_MINUTES),
        )
    }

    pub(crate) fn lockout(&self) -> Duration {
        Duration::minutes(self.lockout_minutes.clamp(1, MAX_LOCKOUT_MINUTES))
    }

    pub(crate) fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.bootstrap_admins
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetimes_are_clamped() {
        let policy = AuthPolicy {
            session_ttl_hours: i64::MAX,
            reset_token_ttl_minutes: i64::MAX,
            lockout_minutes: i64::MIN,
            ..AuthPolicy::default()
        };
        assert_eq!(policy.session_ttl(), Duration::hours(MAX_SESSION_TTL_HOURS));
        assert_eq!(
            policy.reset_token_ttl(),
            Duration::minutes(MAX_RESET_TOKEN_TTL_MINUTES)
        );
        assert_eq!(policy.lockout(), Duration::minutes(1));
    }

    #[test]
    fn defaults_pass_through() {
        let policy = AuthPolicy::default();
        assert_eq!(policy.session_ttl(), Duration::hours(24 * 14));
        assert_eq!(policy.reset_token_ttl(), Duration::minutes(60));
        assert_eq!(policy.lockout(), Duration::minutes(15));
    }
}
