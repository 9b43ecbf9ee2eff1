//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire. Timestamps are RFC 3339.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An amount typed by the user.
///
/// Clients may send a plain number or the raw text of a form field such as
/// `"100,000円"`; only the digits of the text are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(i64),
    Text(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Stable machine-readable code such as `auth/weak-password`.
    pub code: String,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        User,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserView {
        pub id: Uuid,
        pub display_name: String,
        pub email: String,
        pub role: Role,
        pub provider: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DisplayNameUpdate {
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PasswordChange {
        pub current_password: String,
        pub new_password: String,
    }

    /// Admin request to provision an account without a password.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserNew {
        pub email: String,
        pub display_name: Option<String>,
        /// Defaults to `user`.
        pub role: Option<Role>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RoleUpdate {
        pub role: Role,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsersResponse {
        pub users: Vec<UserView>,
    }
}

pub mod auth {
    use super::*;
    use crate::user::UserView;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SignUp {
        pub email: String,
        pub password: String,
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignIn {
        pub email: String,
        pub password: String,
    }

    /// How the provider popup ended, as reported by the client.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OAuthStatus {
        Completed,
        Cancelled,
        Blocked,
    }

    /// Identity fields are required only when `status` is `completed`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OAuthSignIn {
        pub status: OAuthStatus,
        pub provider: Option<String>,
        pub subject: Option<String>,
        pub email: Option<String>,
        pub display_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SessionResponse {
        /// Bearer token for the `Authorization` header.
        pub token: String,
        pub expires_at: DateTime<Utc>,
        pub user: UserView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordResetRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PasswordResetConfirm {
        pub token: String,
        pub new_password: String,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalNew {
        pub title: String,
        pub target_amount: AmountInput,
        pub current_amount: Option<AmountInput>,
        /// `YYYY-MM-DD` or RFC 3339. Absent means now.
        pub deadline: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalUpdate {
        pub title: Option<String>,
        pub target_amount: Option<AmountInput>,
        pub current_amount: Option<AmountInput>,
        pub deadline: Option<String>,
    }

    /// Query string of `GET /goals`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalListParams {
        /// `all`, `completed` or `incomplete`.
        pub status: Option<String>,
        /// `deadline`, `progress` or `targetAmount`.
        pub sort: Option<String>,
        /// `asc` or `desc`.
        pub order: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalOrder {
        pub ids: Vec<Uuid>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case", tag = "kind", content = "days")]
    pub enum DeadlineStatus {
        Remaining(i64),
        DueToday,
        Overdue(i64),
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalView {
        pub id: Uuid,
        pub title: String,
        pub target_amount: i64,
        pub current_amount: i64,
        pub deadline: DateTime<Utc>,
        pub order: i32,
        pub achieved_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub progress_percent: f64,
        pub days_left: i64,
        pub deadline_status: DeadlineStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalsResponse {
        pub goals: Vec<GoalView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalRecomputed {
        pub goal: GoalView,
        pub newly_achieved: bool,
    }
}

pub mod saving {
    use super::*;
    use crate::goal::GoalView;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingNew {
        pub goal_id: Uuid,
        pub item_name: String,
        pub amount: AmountInput,
        pub category: Option<String>,
        pub memo: Option<String>,
        /// RFC3339 timestamp, including timezone offset. Absent means now.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    /// An empty `category` or `memo` clears the field.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingUpdate {
        pub item_name: Option<String>,
        pub amount: Option<AmountInput>,
        pub category: Option<String>,
        pub memo: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingView {
        pub id: Uuid,
        pub goal_id: Uuid,
        pub item_name: String,
        pub amount: i64,
        pub category: Option<String>,
        pub memo: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SavingsResponse {
        pub savings: Vec<SavingView>,
    }

    /// Result of a create, update or delete: the entry (absent after a
    /// delete) and the parent goal after its amount was adjusted.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SavingChanged {
        pub entry: Option<SavingView>,
        pub goal: GoalView,
        pub newly_achieved: bool,
    }
}

pub mod feedback {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FeedbackCategory {
        Feature,
        Bug,
        Improvement,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FeedbackStatus {
        Open,
        Scheduled,
        Completed,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeedbackNew {
        pub title: String,
        pub description: String,
        pub category: FeedbackCategory,
    }

    /// Query string of `GET /feedback`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FeedbackListParams {
        pub category: Option<FeedbackCategory>,
        /// `open`, `scheduled` or `completed`.
        pub status: Option<String>,
    }

    /// `open` or `null` reopens the item.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeedbackStatusUpdate {
        pub status: Option<FeedbackStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FeedbackView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub user_display_name: String,
        pub title: String,
        pub description: String,
        pub category: FeedbackCategory,
        pub status: FeedbackStatus,
        pub votes: i64,
        pub voters: Vec<Uuid>,
        /// Whether the caller is among the voters.
        pub has_voted: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub completed_at: Option<DateTime<Utc>>,
        pub completed_by: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FeedbackListResponse {
        pub feedback: Vec<FeedbackView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VoteResponse {
        pub voted: bool,
        pub votes: i64,
    }
}
