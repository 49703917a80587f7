use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::validation::{self, ValidationErrors, PASSWORD_RULES, USER_RULES};
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub last_logged_in: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: &str, role: Role, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            role,
            password_hash,
            password_changed_at: None,
            last_logged_in: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the token was issued before the last password change
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .map(|changed| issued_at < changed.timestamp())
            .unwrap_or(false)
    }

    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Body of signup and teacher-side user creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl NewUserInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let doc = serde_json::to_value(self).unwrap_or(Value::Null);
        let profile = validation::validate(USER_RULES, &doc);
        let password = validation::validate(PASSWORD_RULES, &doc);
        match (profile, password) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(mut a), Err(b)) => {
                a.messages.extend(b.messages);
                for (field, message) in b.field_errors {
                    a.field_errors.entry(field).or_insert(message);
                }
                Err(a)
            }
        }
    }
}

/// Body of PATCH /updateMe and the teacher update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Column-level change to a stored user; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    /// Validate the fields that are present against `current` and keep only those
    pub fn resolve(&self, current: &User, allow_role: bool) -> Result<ProfileUpdate, ValidationErrors> {
        let role = self.role.as_deref().filter(|_| allow_role);

        let mut merged = serde_json::json!({ "name": current.name, "email": current.email });
        if let Some(name) = &self.name {
            merged["name"] = Value::from(name.as_str());
        }
        if let Some(email) = &self.email {
            merged["email"] = Value::from(email.as_str());
        }
        if let Some(role) = role {
            merged["role"] = Value::from(role);
        }
        validation::validate(USER_RULES, &merged)?;

        Ok(ProfileUpdate {
            name: self.name.clone(),
            email: self.email.as_deref().map(normalize_email),
            role: role.and_then(|r| r.parse().ok()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub password_current: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let doc = serde_json::to_value(self).unwrap_or(Value::Null);
        validation::validate(PASSWORD_RULES, &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User::new("Ann".into(), " Ann@Example.COM ", Role::Student, "hash".into())
    }

    #[test]
    fn serialization_hides_password_hash() {
        let doc = user().to_document();
        assert!(doc.get("passwordHash").is_none());
        assert_eq!(doc["email"], "ann@example.com");
        assert_eq!(doc["role"], "student");
        assert!(doc.get("_id").is_some());
    }

    #[test]
    fn detects_password_change_after_issue() {
        let mut u = user();
        let issued = Utc::now();
        assert!(!u.changed_password_after(issued.timestamp()));

        u.password_changed_at = Some(issued + Duration::seconds(1));
        assert!(u.changed_password_after(issued.timestamp()));

        u.password_changed_at = Some(issued - Duration::seconds(1));
        assert!(!u.changed_password_after(issued.timestamp()));
    }

    #[test]
    fn new_user_input_collects_all_messages() {
        let input = NewUserInput {
            name: Some("Ann".into()),
            email: Some("nope".into()),
            password: Some("short".into()),
            password_confirm: Some("short".into()),
            ..Default::default()
        };
        let err = input.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Please provide a valid email. Password must have at least 8 characters"
        );
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let u = user();
        let patch = UserPatch { name: Some("Bea".into()), email: None, role: Some("teacher".into()) };
        assert_eq!(
            patch.resolve(&u, false).unwrap(),
            ProfileUpdate { name: Some("Bea".into()), email: None, role: None }
        );
        assert_eq!(patch.resolve(&u, true).unwrap().role, Some(Role::Teacher));

        let email = UserPatch { email: Some(" Bea@Example.com".into()), ..Default::default() };
        assert_eq!(email.resolve(&u, false).unwrap().email.as_deref(), Some("bea@example.com"));

        let bad = UserPatch { role: Some("admin".into()), ..Default::default() };
        assert!(bad.resolve(&u, true).is_err());
        assert!(bad.resolve(&u, false).is_ok());
    }
}
