use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One evaluated exercise attempt.
///
/// `score` is kept as the agent sent it. Use [`ExerciseRecord::score_value`]
/// for the numeric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub score: String,
    #[serde(default)]
    pub feedback: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub exercise_number: String,
}

impl ExerciseRecord {
    #[must_use]
    pub fn new(
        score: impl Into<String>,
        feedback: impl Into<String>,
        date: NaiveDate,
        topic: impl Into<String>,
        exercise_number: impl Into<String>,
    ) -> Self {
        Self {
            score: score.into(),
            feedback: feedback.into(),
            date,
            topic: topic.into(),
            exercise_number: exercise_number.into(),
        }
    }

    /// Numeric score if it counts toward averages.
    ///
    /// Reads the leading decimal number of the string (`"8/10"` reads as 8).
    /// Returns `None` for unparsable, non-finite or non-positive values.
    #[must_use]
    pub fn score_value(&self) -> Option<f64> {
        parse_leading_number(&self.score).filter(|v| v.is_finite() && *v > 0.0)
    }
}

fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    s[..end].parse().ok()
}
