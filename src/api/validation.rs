use std::collections::BTreeMap;

use super::ApiError;
use crate::models::Schedule;

/// Minimum length for passwords set through the user endpoints.
pub const USER_PASSWORD_MIN_LEN: usize = 4;

/// Collects per-field problems and turns them into a single 422.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }

    /// Records a missing or blank required string.
    pub fn require<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.add(field, format!("The {field} field must be defined"));
                None
            }
        }
    }

    pub fn check_email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.add(field, format!("The {field} field must be a valid email address"));
        }
    }

    pub fn check_min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(
                field,
                format!("The {field} field must have at least {min} characters"),
            );
        }
    }

    pub fn check_schedule(&mut self, schedule: &Schedule) {
        for (field, message) in schedule.problems() {
            self.add(field, message);
        }
    }
}

/// Loose structural check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
