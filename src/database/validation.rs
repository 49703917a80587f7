// database/validation.rs - Declarative document validation
//
// Each collection declares a table of FieldRule entries. Rules run over the
// JSON form of an incoming document and every failure is reported, in table
// order, as "Validation error: <msg>. <msg>".

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::parse_timestamp;

#[derive(Debug, Clone, Copy)]
pub enum Constraint {
    Required,
    Min(f64),
    Max(f64),
    MinLength(usize),
    Email,
    Timestamp,
    /// Must equal the named sibling field
    SameAs(&'static str),
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub constraint: Constraint,
    pub message: &'static str,
}

const fn rule(field: &'static str, constraint: Constraint, message: &'static str) -> FieldRule {
    FieldRule { field, constraint, message }
}

#[derive(Debug, Clone, Error)]
#[error("Validation error: {}", .messages.join(". "))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
    pub field_errors: HashMap<String, String>,
}

pub const WEATHER_RULES: &[FieldRule] = &[
    rule("humidity", Constraint::Required, "A weather data should have humidity"),
    rule("latitude", Constraint::Min(-180.0), "Latitude cannot be less than -180"),
    rule("latitude", Constraint::Max(180.0), "Latitude cannot exceed 180"),
    rule("atmosphericPressure", Constraint::Min(0.0), "Atmospheric pressure cannot be negative"),
    rule("deviceName", Constraint::Required, "Device name is required"),
    rule("longitude", Constraint::Required, "Longitude is required"),
    rule("longitude", Constraint::Min(-180.0), "Longitude cannot be less than -180"),
    rule("longitude", Constraint::Max(180.0), "Longitude cannot exceed 180"),
    rule("maxWindSpeed", Constraint::Min(0.0), "Wind speed cannot be negative"),
    rule("solarRadiation", Constraint::Min(0.0), "Solar radiation cannot be negative"),
    rule("temperature", Constraint::Required, "Temperature is required"),
    rule("time", Constraint::Required, "Time of data collection is required"),
    rule("time", Constraint::Timestamp, "Time of data collection must be a valid date"),
    rule("vaporPressure", Constraint::Min(0.0), "Vapor pressure cannot be negative"),
    rule("windDirection", Constraint::Min(0.0), "Wind direction cannot be negative"),
    rule("windDirection", Constraint::Max(360.0), "Wind direction must be within 0-360 degrees"),
    rule("precipitation", Constraint::Min(0.0), "Precipitation cannot be negative"),
];

pub const USER_RULES: &[FieldRule] = &[
    rule("name", Constraint::Required, "Please tell us your name!"),
    rule("email", Constraint::Required, "Please provide your email"),
    rule("email", Constraint::Email, "Please provide a valid email"),
    rule("role", Constraint::OneOf(&["teacher", "student", "sensor"]), "Role is either: teacher, student or sensor"),
];

pub const PASSWORD_RULES: &[FieldRule] = &[
    rule("password", Constraint::Required, "Please provide password"),
    rule("password", Constraint::MinLength(8), "Password must have at least 8 characters"),
    rule("passwordConfirm", Constraint::Required, "Please confirm your password"),
    rule("passwordConfirm", Constraint::SameAs("password"), "Password are not the same!"),
];

/// Run every rule against `doc`; absent optional fields pass all but `Required`
pub fn validate(rules: &[FieldRule], doc: &Value) -> Result<(), ValidationErrors> {
    let mut messages = Vec::new();
    let mut field_errors = HashMap::new();

    for rule in rules {
        let value = doc.get(rule.field).filter(|v| !v.is_null());
        if !satisfies(rule.constraint, value, doc) {
            messages.push(rule.message.to_string());
            field_errors.entry(rule.field.to_string()).or_insert_with(|| rule.message.to_string());
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { messages, field_errors })
    }
}

fn satisfies(constraint: Constraint, value: Option<&Value>, doc: &Value) -> bool {
    let Some(value) = value else {
        return !matches!(constraint, Constraint::Required);
    };

    match constraint {
        Constraint::Required => match value {
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        },
        Constraint::Min(min) => value.as_f64().map_or(true, |n| n >= min),
        Constraint::Max(max) => value.as_f64().map_or(true, |n| n <= max),
        Constraint::MinLength(len) => value.as_str().map_or(true, |s| s.chars().count() >= len),
        Constraint::Email => value.as_str().map_or(false, is_email),
        Constraint::Timestamp => value.as_str().and_then(parse_timestamp).is_some(),
        Constraint::SameAs(other) => doc.get(other) == Some(value),
        Constraint::OneOf(allowed) => value.as_str().map_or(false, |s| allowed.contains(&s)),
    }
}

/// local@domain.tld with no whitespace
fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else { return false };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_every_failure_in_order() {
        let err = validate(WEATHER_RULES, &json!({"humidity": 40, "longitude": 200})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Device name is required. Longitude cannot exceed 180. \
             Temperature is required. Time of data collection is required"
        );
        assert_eq!(err.field_errors.get("longitude").map(String::as_str), Some("Longitude cannot exceed 180"));
    }

    #[test]
    fn accepts_complete_reading() {
        let doc = json!({
            "deviceName": "Woodford_Sensor",
            "time": "2021-05-07T03:44:04.000Z",
            "temperature": 22.5,
            "humidity": 71,
            "longitude": 152.77,
            "windDirection": 360
        });
        assert!(validate(WEATHER_RULES, &doc).is_ok());
    }

    #[test]
    fn user_and_password_rules() {
        assert!(validate(USER_RULES, &json!({"name": "Ann", "email": "ann@example.com"})).is_ok());
        assert!(validate(USER_RULES, &json!({"name": "Ann", "email": "ann@example"})).is_err());
        assert!(validate(USER_RULES, &json!({"name": "Ann", "email": "a@b.co", "role": "admin"})).is_err());

        let err = validate(PASSWORD_RULES, &json!({"password": "pass1234", "passwordConfirm": "pass12345"})).unwrap_err();
        assert_eq!(err.messages, vec!["Password are not the same!".to_string()]);
    }
}
