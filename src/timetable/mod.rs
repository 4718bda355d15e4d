//! Revision timetables: the request sent to the model, the schedule it
//! returns, and the weekly grid layout used to display it.

pub mod grid;

pub use grid::{layout, GridLayout, Placement, TimeRange};

use crate::reconcile::{recover_object, ParseStage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_TIMETABLE_TITLE: &str = "Your Personalised Revision Timetable";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum TimetableError {
    #[error("Cannot generate a timetable without at least one exam date.")]
    NoExams,
    #[error("Exam {index} has no subject")]
    BlankSubject { index: usize },
    #[error("Invalid {field} date {value:?}; expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },
    #[error("Study hours per week must be a positive number, got {0}")]
    InvalidHours(f64),
    #[error("Revision start date {start} is not before the final exam on {last_exam}")]
    StartAfterLastExam {
        start: NaiveDate,
        last_exam: NaiveDate,
    },
    #[error("The AI response did not contain a readable timetable")]
    Unreadable,
    #[error("The AI timetable has an unexpected shape: {0}")]
    Malformed(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exam {
    pub subject: String,
    pub date: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// What the student asks for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRequest {
    pub exams: Vec<Exam>,
    pub start_date: String,
    pub hours_per_week: f64,
    /// Day name to preferred slots, e.g. `"Monday" -> ["18:00", "18:30"]`.
    #[serde(default)]
    pub study_times: BTreeMap<String, Vec<String>>,
}

impl RevisionRequest {
    /// Latest parseable exam date.
    pub fn last_exam_date(&self) -> Option<NaiveDate> {
        self.exams
            .iter()
            .filter_map(|exam| NaiveDate::parse_from_str(exam.date.trim(), DATE_FORMAT).ok())
            .max()
    }

    /// Checks the request and returns the final exam date.
    pub fn validate(&self) -> Result<NaiveDate, TimetableError> {
        if self.exams.is_empty() {
            return Err(TimetableError::NoExams);
        }

        let mut last_exam: Option<NaiveDate> = None;
        for (index, exam) in self.exams.iter().enumerate() {
            if exam.subject.trim().is_empty() {
                return Err(TimetableError::BlankSubject { index: index + 1 });
            }
            let date = parse_date(&format!("{} exam", exam.subject.trim()), &exam.date)?;
            last_exam = Some(last_exam.map_or(date, |d| d.max(date)));
        }
        let last_exam = last_exam.ok_or(TimetableError::NoExams)?;

        if !self.hours_per_week.is_finite() || self.hours_per_week <= 0.0 {
            return Err(TimetableError::InvalidHours(self.hours_per_week));
        }

        let start = parse_date("start", &self.start_date)?;
        if start >= last_exam {
            return Err(TimetableError::StartAfterLastExam { start, last_exam });
        }
        Ok(last_exam)
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, TimetableError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| TimetableError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Timetable {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::list")]
    pub weekly_schedule: Vec<WeeklySchedule>,
}

impl Default for Timetable {
    fn default() -> Self {
        Self {
            title: DEFAULT_TIMETABLE_TITLE.to_string(),
            summary: String::new(),
            weekly_schedule: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklySchedule {
    /// Zero when the model gave no usable number.
    #[serde(deserialize_with = "lenient::number")]
    pub week: u32,
    #[serde(deserialize_with = "lenient::text")]
    pub dates: String,
    #[serde(deserialize_with = "lenient::list")]
    pub daily_sessions: Vec<DailySession>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct DailySession {
    #[serde(deserialize_with = "lenient::text")]
    pub day: String,
    #[serde(deserialize_with = "lenient::list")]
    pub tasks: Vec<SessionTask>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SessionTask {
    #[serde(deserialize_with = "lenient::text")]
    pub time: String,
    #[serde(deserialize_with = "lenient::text")]
    pub subject: String,
    #[serde(deserialize_with = "lenient::text")]
    pub topic: String,
}

/// Field decoders that treat `null` as absent and coerce scalars.
mod lenient {
    use serde::de::{Deserialize, DeserializeOwned, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Ok(parsed.and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
    }

    /// `null` is an empty list, a lone object a one-element list; `null`
    /// elements are dropped.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single @ Value::Object(_) => vec![single],
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected a list, found {}",
                    other
                )))
            }
        };
        items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect()
    }
}

impl Timetable {
    pub fn total_sessions(&self) -> usize {
        self.weekly_schedule
            .iter()
            .flat_map(|w| &w.daily_sessions)
            .map(|d| d.tasks.len())
            .sum()
    }
}

/// Reads a timetable out of model text using the same parse chain as
/// problem breakdowns. Missing or `null` fields take defaults, scalars are
/// coerced to text, and unnumbered weeks are numbered by position.
pub fn parse_timetable(raw_text: &str) -> Result<(Timetable, ParseStage), TimetableError> {
    let recovered = recover_object(raw_text).ok_or(TimetableError::Unreadable)?;
    if recovered.stage != ParseStage::Direct {
        debug!(stage = %recovered.stage, "Timetable needed recovery");
    }

    let mut timetable: Timetable = serde_json::from_value(Value::Object(recovered.object))
        .map_err(|e| TimetableError::Malformed(e.to_string()))?;

    if timetable.title.trim().is_empty() {
        timetable.title = DEFAULT_TIMETABLE_TITLE.to_string();
    }
    for (index, week) in timetable.weekly_schedule.iter_mut().enumerate() {
        if week.week == 0 {
            week.week = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
    }
    if timetable.weekly_schedule.is_empty() {
        warn!("Timetable has no weeks");
    }
    Ok((timetable, recovered.stage))
}

#[cfg(test)]
mod tests;
