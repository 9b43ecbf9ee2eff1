//! Progress and deadline math for goals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Percentage of the target reached, capped at 100. A zero target reads as 0.
#[must_use]
pub fn progress_percent(current: i64, target: i64) -> f64 {
    if target <= 0 {
        return 0.0;
    }
    (current as f64 / target as f64 * 100.0).min(100.0)
}

/// Whole days until `deadline`, rounded up. Negative once the deadline passed.
#[must_use]
pub fn days_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds();
    let days = millis / DAY_MILLIS;
    if millis % DAY_MILLIS > 0 { days + 1 } else { days }
}

/// How a goal's deadline reads relative to today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "days")]
pub enum DeadlineStatus {
    Remaining(i64),
    DueToday,
    Overdue(i64),
}

impl DeadlineStatus {
    #[must_use]
    pub fn from_days_left(days: i64) -> Self {
        match days {
            d if d > 0 => Self::Remaining(d),
            0 => Self::DueToday,
            d => Self::Overdue(d.abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn percent_is_capped() {
        assert_eq!(progress_percent(40_000, 100_000), 40.0);
        assert_eq!(progress_percent(150, 100), 100.0);
        assert_eq!(progress_percent(10, 0), 0.0);
    }

    #[test]
    fn days_round_up() {
        let now = noon();
        assert_eq!(days_left(now + Duration::hours(36), now), 2);
        assert_eq!(days_left(now + Duration::days(3), now), 3);
        assert_eq!(days_left(now, now), 0);
        assert_eq!(days_left(now - Duration::hours(36), now), -1);
        assert_eq!(days_left(now - Duration::days(2), now), -2);
    }

    #[test]
    fn status_from_days() {
        assert_eq!(DeadlineStatus::from_days_left(5), DeadlineStatus::Remaining(5));
        assert_eq!(DeadlineStatus::from_days_left(0), DeadlineStatus::DueToday);
        assert_eq!(DeadlineStatus::from_days_left(-3), DeadlineStatus::Overdue(3));
    }
}
