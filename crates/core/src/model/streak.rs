use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::progress::date_or_empty;

/// Consecutive-day activity streak, persisted on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    #[serde(default, with = "date_or_empty")]
    pub last_date: Option<NaiveDate>,
    #[serde(default)]
    pub count: u32,
}

impl StreakState {
    #[must_use]
    pub fn new(last_date: NaiveDate, count: u32) -> Self {
        Self {
            last_date: Some(last_date),
            count,
        }
    }

    /// Streak as shown to the learner on `today`.
    ///
    /// A streak last extended today or yesterday is still alive; anything older
    /// reads as zero.
    #[must_use]
    pub fn displayed(&self, today: NaiveDate) -> u32 {
        match self.last_date {
            Some(last) if last == today || Some(last) == today.checked_sub_days(Days::new(1)) => {
                self.count
            }
            _ => 0,
        }
    }
}

/// Advance the streak after activity on `today`.
///
/// Nothing changes until at least one exercise exists, and the streak moves at
/// most once per calendar day.
#[must_use]
pub fn update_streak(total_exercises: usize, today: NaiveDate, prior: StreakState) -> StreakState {
    if total_exercises == 0 {
        return prior;
    }
    let yesterday = today.checked_sub_days(Days::new(1));

    match prior.last_date {
        Some(last) if last == today => prior,
        Some(last) if Some(last) == yesterday => StreakState {
            last_date: Some(today),
            count: prior.count.saturating_add(1),
        },
        _ => StreakState::new(today, 1),
    }
}
