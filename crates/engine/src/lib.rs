//! Domain engine of the savings-toward-goals tracker.
//!
//! [`Engine`] owns the database handle and exposes every store: the auth
//! gateway, user profiles, goals, saving entries and feedback.

pub use amount::{format_amount, parse_amount_input};
pub use commands::{
    FeedbackFilter, FeedbackStatusFilter, GoalListQuery, GoalRecomputed, GoalSort,
    GoalStatusFilter, GoalUpdate, GoalView, NewFeedback, NewGoal, NewSaving, OAuthIdentity,
    OAuthOutcome, SavingCreated, SavingUpdate, SortOrder, VoteOutcome,
};
pub use error::{AuthError, EngineError, is_unavailable};
pub use feedback::{Feedback, FeedbackCategory, FeedbackStatus};
pub use goals::Goal;
pub use ops::{Engine, EngineBuilder};
pub use password_resets::PasswordResetTicket;
pub use policy::{AuthPolicy, Limits};
pub use progress::{DeadlineStatus, days_left, progress_percent};
pub use savings::SavingEntry;
pub use sessions::{Session, SessionEvent};
pub use users::{Role, User};

mod amount;
mod commands;
mod error;
mod feedback;
mod feedback_votes;
mod goals;
mod ops;
mod password_resets;
mod policy;
mod progress;
mod savings;
mod sessions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
