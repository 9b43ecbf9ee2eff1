//! Command structs for engine operations.
//!
//! These types group parameters for write operations and list queries,
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, Feedback, FeedbackCategory, FeedbackStatus, Goal, SavingEntry,
    progress::DeadlineStatus,
};

/// Create a goal.
#[derive(Clone, Debug)]
pub struct NewGoal {
    pub title: String,
    pub target_amount: i64,
    pub current_amount: i64,
    /// `YYYY-MM-DD` or RFC 3339. `None` means now.
    pub deadline: Option<String>,
}

impl NewGoal {
    #[must_use]
    pub fn new(title: impl Into<String>, target_amount: i64) -> Self {
        Self {
            title: title.into(),
            target_amount,
            current_amount: 0,
            deadline: None,
        }
    }

    #[must_use]
    pub fn current_amount(mut self, current_amount: i64) -> Self {
        self.current_amount = current_amount;
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }
}

/// Partial goal update. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub target_amount: Option<i64>,
    pub current_amount: Option<i64>,
    pub deadline: Option<String>,
}

impl GoalUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.target_amount.is_none()
            && self.current_amount.is_none()
            && self.deadline.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GoalStatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl TryFrom<&str> for GoalStatusFilter {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "incomplete" => Ok(Self::Incomplete),
            other => Err(EngineError::InvalidInput(format!(
                "invalid goal status filter: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalSort {
    Deadline,
    Progress,
    TargetAmount,
}

impl TryFrom<&str> for GoalSort {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deadline" => Ok(Self::Deadline),
            "progress" => Ok(Self::Progress),
            "target_amount" | "targetAmount" => Ok(Self::TargetAmount),
            other => Err(EngineError::InvalidInput(format!(
                "invalid goal sort: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl TryFrom<&str> for SortOrder {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(EngineError::InvalidInput(format!(
                "invalid sort order: {other}"
            ))),
        }
    }
}

/// Filter and sort for the goal list. Without `sort` goals keep their
/// explicit order.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoalListQuery {
    pub status: GoalStatusFilter,
    pub sort: Option<GoalSort>,
    pub order: SortOrder,
}

/// A goal decorated with the values the list shows next to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalView {
    pub goal: Goal,
    pub progress_percent: f64,
    pub days_left: i64,
    pub deadline_status: DeadlineStatus,
}

impl GoalView {
    pub fn new(goal: Goal, now: DateTime<Utc>) -> Self {
        Self {
            progress_percent: goal.progress_percent(),
            days_left: goal.days_left(now),
            deadline_status: goal.deadline_status(now),
            goal,
        }
    }
}

/// Log a saving entry against a goal.
#[derive(Clone, Debug)]
pub struct NewSaving {
    pub goal_id: Uuid,
    pub item_name: String,
    pub amount: i64,
    pub category: Option<String>,
    pub memo: Option<String>,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewSaving {
    #[must_use]
    pub fn new(goal_id: Uuid, item_name: impl Into<String>, amount: i64) -> Self {
        Self {
            goal_id,
            item_name: item_name.into(),
            amount,
            category: None,
            memo: None,
            occurred_at: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }
}

/// Partial saving entry update.
///
/// For `category` and `memo`, `Some("")` clears the field.
#[derive(Clone, Debug, Default)]
pub struct SavingUpdate {
    pub item_name: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<String>,
    pub memo: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Result of logging a saving entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavingCreated {
    pub entry: SavingEntry,
    /// The parent goal after the amount update.
    pub goal: Goal,
    /// `true` when this entry pushed the goal over its target.
    pub newly_achieved: bool,
}

/// Result of a saving update or delete: the parent goal after recomputation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalRecomputed {
    pub goal: Goal,
    pub newly_achieved: bool,
}

/// Submit a feedback item.
#[derive(Clone, Debug)]
pub struct NewFeedback {
    pub title: String,
    pub description: String,
    pub category: FeedbackCategory,
}

impl NewFeedback {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: FeedbackCategory,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackStatusFilter {
    /// No status set yet.
    Open,
    Scheduled,
    Completed,
}

impl TryFrom<&str> for FeedbackStatusFilter {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::InvalidInput(format!(
                "invalid feedback status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FeedbackFilter {
    pub category: Option<FeedbackCategory>,
    pub status: Option<FeedbackStatusFilter>,
}

impl FeedbackFilter {
    pub(crate) fn matches(&self, feedback: &Feedback) -> bool {
        let category_ok = self.category.is_none_or(|c| c == feedback.category);
        let status_ok = match self.status {
            None => true,
            Some(FeedbackStatusFilter::Open) => feedback.status.is_none(),
            Some(FeedbackStatusFilter::Scheduled) => {
                feedback.status == Some(FeedbackStatus::Scheduled)
            }
            Some(FeedbackStatusFilter::Completed) => {
                feedback.status == Some(FeedbackStatus::Completed)
            }
        };
        category_ok && status_ok
    }
}

/// Result of a vote toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Whether the caller is now among the voters.
    pub voted: bool,
    pub votes: i64,
}

/// Identity asserted by an OAuth provider after a completed popup flow.
#[derive(Clone, Debug)]
pub struct OAuthIdentity {
    pub provider: String,
    /// Stable account id at the provider.
    pub subject: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// How the provider popup ended.
#[derive(Clone, Debug)]
pub enum OAuthOutcome {
    Completed(OAuthIdentity),
    Cancelled,
    Blocked,
}
