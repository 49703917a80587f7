// services/user_service.rs - Accounts, sessions and bulk user administration

use argon2::password_hash;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::PasswordHasher;
use crate::config::FilterConfig;
use crate::database::models::{NewUserInput, PasswordChange, ProfileUpdate, User, UserPatch};
use crate::database::schema::USERS;
use crate::database::validation::ValidationErrors;
use crate::filter::{Filter, FilterError, FilterOp, FilterValue, QueryFeatures};
use crate::store::{StoreError, UserStore};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Please provide email and password!")]
    MissingCredentials,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Your current password is wrong.")]
    WrongCurrentPassword,

    #[error("{0}")]
    NotFound(String),

    #[error("This page does not exist")]
    PageNotFound,

    #[error("Password hashing failed: {0}")]
    Hashing(password_hash::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl From<password_hash::Error> for UserError {
    fn from(err: password_hash::Error) -> Self {
        UserError::Hashing(err)
    }
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    passwords: Arc<PasswordHasher>,
    filter_config: FilterConfig,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, passwords: Arc<PasswordHasher>, filter_config: FilterConfig) -> Self {
        Self { store, passwords, filter_config }
    }

    /// Validate, hash and store a new account; `default_role` applies when none is given
    pub async fn register(&self, input: NewUserInput, default_role: Role) -> Result<User, UserError> {
        input.validate()?;

        let role = match input.role.as_deref() {
            Some(role) => role.parse().unwrap_or(default_role),
            None => default_role,
        };
        let (Some(name), Some(email), Some(password)) = (input.name, input.email, input.password) else {
            return Err(UserError::MissingCredentials);
        };

        let hash = self.passwords.hash(&password)?;
        let user = User::new(name, &email, role, hash);
        self.store.insert(&user).await?;
        info!("Registered {} account {}", user.role, user.email);
        Ok(user)
    }

    /// Check credentials and stamp `lastLoggedIn`
    pub async fn authenticate(&self, email: Option<&str>, password: Option<&str>) -> Result<User, UserError> {
        let (Some(email), Some(password)) = (
            email.filter(|e| !e.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(UserError::MissingCredentials);
        };

        let user = self.store.find_by_email(&email.trim().to_lowercase()).await?;
        let Some(mut user) = user.filter(|u| self.passwords.verify(password, &u.password_hash)) else {
            warn!("Failed login for {}", email);
            return Err(UserError::InvalidCredentials);
        };

        let now = Utc::now();
        if !self.store.touch_last_login(user.id, now).await? {
            return Err(UserError::InvalidCredentials);
        }
        user.last_logged_in = now;
        Ok(user)
    }

    /// Name and email only; `user` may be the snapshot taken at authentication
    pub async fn update_profile(&self, user: &User, patch: &UserPatch) -> Result<User, UserError> {
        let update = patch.resolve(user, false)?;
        self.apply(user.id, &update).await
    }

    /// Tokens issued before this call stop working
    pub async fn change_password(&self, user: &User, change: &PasswordChange) -> Result<User, UserError> {
        // Checked against the stored hash, not the caller's snapshot
        let mut stored = self.get(user.id).await?;
        let current = change.password_current.as_deref().unwrap_or_default();
        if !self.passwords.verify(current, &stored.password_hash) {
            return Err(UserError::WrongCurrentPassword);
        }
        change.validate()?;

        let password = change.password.as_deref().unwrap_or_default();
        let hash = self.passwords.hash(password)?;
        // Backdated so a token issued in the same second stays valid
        let changed_at = Utc::now() - Duration::seconds(1);
        if !self.store.set_password(stored.id, &hash, changed_at).await? {
            return Err(UserError::NotFound("No user found with that ID".to_string()));
        }
        stored.password_hash = hash;
        stored.password_changed_at = Some(changed_at);
        info!("Password changed for {}", stored.email);
        Ok(stored)
    }

    pub async fn list(&self, params: &[(String, String)]) -> Result<Vec<Value>, UserError> {
        let filter = QueryFeatures::apply(&USERS, params, &self.filter_config)?;
        if filter.page_requested() {
            let total = self.store.count(&filter).await?;
            if filter.page_out_of_range(total) {
                return Err(UserError::PageNotFound);
            }
        }
        Ok(self.store.find(&filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, UserError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound("No user found with that ID".to_string()))
    }

    pub async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<User, UserError> {
        let current = self.get(id).await?;
        let update = patch.resolve(&current, true)?;
        self.apply(id, &update).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), UserError> {
        if !self.store.delete(id).await? {
            return Err(UserError::NotFound("No user found with that ID".to_string()));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    /// Move every user created in `[start, end)` to `role`; returns how many changed
    pub async fn update_roles_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        role: Role,
    ) -> Result<u64, UserError> {
        let filter = Filter::new(&USERS)
            .where_op("createdAt", FilterOp::Gte, FilterValue::Timestamp(start))
            .where_op("createdAt", FilterOp::Lt, FilterValue::Timestamp(end))
            .where_op("role", FilterOp::Ne, FilterValue::Text(role.to_string()));

        let modified = self.store.update_role_where(&filter, role).await?;
        if modified == 0 {
            return Err(UserError::NotFound(
                "No users found with creation dates within the specified range".to_string(),
            ));
        }
        info!("Moved {} users to role {}", modified, role);
        Ok(modified)
    }

    /// Remove students whose last login falls in `[start, end)`, never `caller`
    pub async fn delete_students_last_seen_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        caller: Uuid,
    ) -> Result<u64, UserError> {
        let filter = Filter::new(&USERS)
            .where_eq("role", FilterValue::Text(Role::Student.to_string()))
            .where_op("lastLoggedIn", FilterOp::Gte, FilterValue::Timestamp(start))
            .where_op("lastLoggedIn", FilterOp::Lt, FilterValue::Timestamp(end))
            .where_op("_id", FilterOp::Ne, FilterValue::Id(caller));

        let deleted = self.store.delete_where(&filter).await?;
        if deleted == 0 {
            return Err(UserError::NotFound(
                "No users found with the specified role and date range.".to_string(),
            ));
        }
        info!("Deleted {} inactive students", deleted);
        Ok(deleted)
    }

    async fn apply(&self, id: Uuid, update: &ProfileUpdate) -> Result<User, UserError> {
        self.store
            .update_profile(id, update)
            .await?
            .ok_or_else(|| UserError::NotFound("No user found with that ID".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::utc_day_range;
    use chrono::TimeZone;

    fn service() -> UserService {
        let config = FilterConfig { default_limit: 100, max_limit: Some(1000) };
        UserService::new(Arc::new(MemoryStore::default()), Arc::new(PasswordHasher::default()), config)
    }

    fn signup(name: &str, email: &str, role: Option<&str>) -> NewUserInput {
        NewUserInput {
            name: Some(name.into()),
            email: Some(email.into()),
            role: role.map(Into::into),
            password: Some("pass1234".into()),
            password_confirm: Some("pass1234".into()),
        }
    }

    #[tokio::test]
    async fn register_defaults_role_and_rejects_duplicates() {
        let service = service();
        let user = service.register(signup("Ann", "ann@example.com", None), Role::Teacher).await.unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_ne!(user.password_hash, "pass1234");

        let err = service
            .register(signup("Ann Again", "ANN@example.com", Some("student")), Role::Teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::Store(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let service = service();
        service.register(signup("Ann", "ann@example.com", Some("student")), Role::Teacher).await.unwrap();

        assert!(matches!(
            service.authenticate(Some("ann@example.com"), None).await,
            Err(UserError::MissingCredentials)
        ));
        assert!(matches!(
            service.authenticate(Some("ann@example.com"), Some("wrong-pass")).await,
            Err(UserError::InvalidCredentials)
        ));
        let user = service.authenticate(Some("Ann@Example.com"), Some("pass1234")).await.unwrap();
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn change_password_backdates_the_stamp() {
        let service = service();
        let user = service.register(signup("Ann", "ann@example.com", None), Role::Teacher).await.unwrap();

        let wrong = PasswordChange {
            password_current: Some("nope".into()),
            password: Some("newpass123".into()),
            password_confirm: Some("newpass123".into()),
        };
        assert!(matches!(
            service.change_password(&user, &wrong).await,
            Err(UserError::WrongCurrentPassword)
        ));

        let change = PasswordChange { password_current: Some("pass1234".into()), ..wrong };
        let before = Utc::now();
        let updated = service.change_password(&user, &change).await.unwrap();
        let changed_at = updated.password_changed_at.unwrap();
        assert!(changed_at < before);
        assert!(service.authenticate(Some("ann@example.com"), Some("newpass123")).await.is_ok());
    }

    #[tokio::test]
    async fn bulk_delete_spares_the_caller() {
        let service = service();
        let caller = service.register(signup("Tess", "tess@example.com", Some("student")), Role::Teacher).await.unwrap();
        service.register(signup("Sam", "sam@example.com", Some("student")), Role::Teacher).await.unwrap();
        service.register(signup("Tom", "tom@example.com", Some("teacher")), Role::Teacher).await.unwrap();

        let start = Utc::now() - Duration::days(1);
        let end = Utc::now() + Duration::days(1);
        let deleted = service.delete_students_last_seen_between(start, end, caller.id).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(service.get(caller.id).await.is_ok());

        assert!(matches!(
            service.delete_students_last_seen_between(start, end, caller.id).await,
            Err(UserError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn day_range_includes_the_last_microseconds_of_the_end_day() {
        let store = Arc::new(MemoryStore::default());
        let config = FilterConfig { default_limit: 100, max_limit: Some(1000) };
        let service = UserService::new(store.clone(), Arc::new(PasswordHasher::default()), config);

        let day = Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap();
        let mut late = User::new("Late".into(), "late@example.com", Role::Student, "hash".into());
        late.created_at = Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap() + Duration::microseconds(999_500);
        late.last_logged_in = late.created_at;
        let mut next_day = User::new("Next".into(), "next@example.com", Role::Student, "hash".into());
        next_day.created_at = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        next_day.last_logged_in = next_day.created_at;
        UserStore::insert(store.as_ref(), &late).await.unwrap();
        UserStore::insert(store.as_ref(), &next_day).await.unwrap();

        let (start, end) = utc_day_range(day, day);
        assert_eq!(service.update_roles_created_between(start, end, Role::Sensor).await.unwrap(), 1);
        assert_eq!(service.get(late.id).await.unwrap().role, Role::Sensor);
        assert_eq!(service.get(next_day.id).await.unwrap().role, Role::Student);

        let caller = Uuid::new_v4();
        assert_eq!(service.update_roles_created_between(start, end, Role::Student).await.unwrap(), 1);
        assert_eq!(service.delete_students_last_seen_between(start, end, caller).await.unwrap(), 1);
        assert!(service.get(late.id).await.is_err());
        assert!(service.get(next_day.id).await.is_ok());
    }

    #[tokio::test]
    async fn stale_profile_update_keeps_newer_password() {
        let service = service();
        let snapshot = service.register(signup("Ann", "ann@example.com", Some("student")), Role::Teacher).await.unwrap();

        let change = PasswordChange {
            password_current: Some("pass1234".into()),
            password: Some("newpass123".into()),
            password_confirm: Some("newpass123".into()),
        };
        let changed = service.change_password(&snapshot, &change).await.unwrap();

        let patch = UserPatch { name: Some("Annie".into()), ..Default::default() };
        let updated = service.update_profile(&snapshot, &patch).await.unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.password_changed_at, changed.password_changed_at);

        assert!(matches!(
            service.authenticate(Some("ann@example.com"), Some("pass1234")).await,
            Err(UserError::InvalidCredentials)
        ));
        assert!(service.authenticate(Some("ann@example.com"), Some("newpass123")).await.is_ok());

        let issued_before = changed.password_changed_at.unwrap().timestamp() - 1;
        assert!(service.get(snapshot.id).await.unwrap().changed_password_after(issued_before));
    }

    #[tokio::test]
    async fn stale_profile_update_keeps_bulk_role_change() {
        let service = service();
        let snapshot = service.register(signup("Ann", "ann@example.com", Some("student")), Role::Teacher).await.unwrap();

        let start = Utc::now() - Duration::days(1);
        let end = Utc::now() + Duration::days(1);
        assert_eq!(service.update_roles_created_between(start, end, Role::Sensor).await.unwrap(), 1);

        let patch = UserPatch { name: Some("Annie".into()), ..Default::default() };
        service.update_profile(&snapshot, &patch).await.unwrap();
        assert_eq!(service.get(snapshot.id).await.unwrap().role, Role::Sensor);

        // Logging in does not rewrite the profile either
        service.authenticate(Some("ann@example.com"), Some("pass1234")).await.unwrap();
        let stored = service.get(snapshot.id).await.unwrap();
        assert_eq!((stored.name.as_str(), stored.role), ("Annie", Role::Sensor));
    }
}
