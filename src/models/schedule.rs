use chrono::NaiveTime;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

pub const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Recurrence window controlling when a slide is shown.
///
/// Persisted as a JSON column and always carries all four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Schedule {
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
    pub tz: String,
}

impl Schedule {
    /// Every day, whole day, in the given timezone.
    #[must_use]
    pub fn all_week(tz: &str) -> Self {
        Self {
            days: WEEKDAYS.iter().map(ToString::to_string).collect(),
            start: "00:00".to_string(),
            end: "23:59".to_string(),
            tz: tz.to_string(),
        }
    }

    /// Returns `(field, message)` pairs for every invalid field.
    #[must_use]
    pub fn problems(&self) -> Vec<(&'static str, String)> {
        let mut problems = Vec::new();

        if self.days.is_empty() {
            problems.push(("schedule.days", "must contain at least one day".to_string()));
        } else if let Some(bad) = self
            .days
            .iter()
            .find(|d| !WEEKDAYS.contains(&d.to_ascii_lowercase().as_str()))
        {
            problems.push((
                "schedule.days",
                format!("unknown day '{bad}', expected one of {}", WEEKDAYS.join(", ")),
            ));
        }

        if NaiveTime::parse_from_str(&self.start, "%H:%M").is_err() {
            problems.push(("schedule.start", "must be a HH:MM time".to_string()));
        }

        if NaiveTime::parse_from_str(&self.end, "%H:%M").is_err() {
            problems.push(("schedule.end", "must be a HH:MM time".to_string()));
        }

        if self.tz.trim().is_empty() {
            problems.push(("schedule.tz", "is required".to_string()));
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_week_is_valid() {
        let schedule = Schedule::all_week("America/Sao_Paulo");
        assert_eq!(schedule.days.len(), 7);
        assert_eq!(schedule.start, "00:00");
        assert_eq!(schedule.end, "23:59");
        assert!(schedule.problems().is_empty());
    }

    #[test]
    fn reports_each_bad_field() {
        let schedule = Schedule {
            days: vec!["mon".to_string(), "funday".to_string()],
            start: "25:00".to_string(),
            end: "18:30".to_string(),
            tz: String::new(),
        };

        let fields: Vec<&str> = schedule.problems().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["schedule.days", "schedule.start", "schedule.tz"]);
    }

    #[test]
    fn rejects_missing_fields_on_deserialize() {
        let parsed: Result<Schedule, _> =
            serde_json::from_str(r#"{"days":["mon"],"start":"08:00","end":"18:00"}"#);
        assert!(parsed.is_err());
    }
}
