//! Authentication and account service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{user::CAN_MARK_RETURNED, User, UserClaims},
    repository::{users::NewUser, UsersStore},
};

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UsersStore>,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(users: Arc<dyn UsersStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Authenticate user by username and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::warn!("Failed login for {}", user.username);
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!("User {} logged in", user.username);
        Ok((token, user))
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let ttl = self.config.jwt_expiration_hours as i64 * 3600;
        UserClaims::for_user(user, Utc::now().timestamp(), ttl)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.users.get_by_id(id).await
    }

    /// Create the configured staff account when no account exists yet.
    /// Returns true when an account was created.
    pub async fn ensure_bootstrap_user(&self, extra_permissions: &[&str]) -> AppResult<bool> {
        let (Some(username), Some(password)) = (
            self.config.bootstrap_username.as_deref(),
            self.config.bootstrap_password.as_deref(),
        ) else {
            return Ok(false);
        };

        if self.users.count().await? > 0 {
            return Ok(false);
        }

        let mut permissions = vec![CAN_MARK_RETURNED.to_string()];
        for permission in extra_permissions {
            if !permissions.iter().any(|p| p == permission) {
                permissions.push(permission.to_string());
            }
        }

        let user = self
            .users
            .create(&NewUser {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                first_name: String::new(),
                last_name: String::new(),
                is_staff: true,
                permissions,
            })
            .await?;

        tracing::info!("Created bootstrap staff account {}", user.username);
        Ok(true)
    }
}

/// Verify user password
fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::users::MockUsersStore;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            ..AuthConfig::default()
        }
    }

    fn user(password: &str) -> User {
        User {
            id: 4,
            username: "reader".into(),
            password: hash_password(password).unwrap(),
            first_name: "Ada".into(),
            last_name: "Reader".into(),
            email: None,
            is_staff: false,
            permissions: vec![],
            date_joined: Utc::now(),
        }
    }

    #[tokio::test]
    async fn login_issues_token_for_the_account() {
        let stored = user("hunter22");
        let mut users = MockUsersStore::new();
        users
            .expect_get_by_username()
            .returning(move |_| Ok(Some(stored.clone())));

        let service = UsersService::new(Arc::new(users), config());
        let (token, user) = service.authenticate("reader", "hunter22").await.unwrap();
        let claims = UserClaims::from_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.sub, "reader");
        assert!(!claims.is_staff);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let stored = user("hunter22");
        let mut users = MockUsersStore::new();
        users.expect_get_by_username().returning(move |name| {
            Ok((name == "reader").then(|| stored.clone()))
        });
        let service = UsersService::new(Arc::new(users), config());

        let wrong = service.authenticate("reader", "nope").await.unwrap_err();
        let unknown = service.authenticate("ghost", "hunter22").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn bootstrap_only_runs_on_an_empty_table() {
        let mut cfg = config();
        cfg.bootstrap_username = Some("admin".into());
        cfg.bootstrap_password = Some("changeme".into());

        let mut users = MockUsersStore::new();
        users.expect_count().times(1).returning(|| Ok(0));
        users
            .expect_create()
            .withf(|u| {
                u.username == "admin"
                    && u.is_staff
                    && u.permissions == vec![CAN_MARK_RETURNED.to_string(), "can_edit_catalog".to_string()]
                    && u.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|u| {
                Ok(User {
                    id: 1,
                    username: u.username.clone(),
                    password: u.password_hash.clone(),
                    first_name: String::new(),
                    last_name: String::new(),
                    email: None,
                    is_staff: true,
                    permissions: u.permissions.clone(),
                    date_joined: Utc::now(),
                })
            });
        let service = UsersService::new(Arc::new(users), cfg.clone());
        assert!(service
            .ensure_bootstrap_user(&["can_edit_catalog", CAN_MARK_RETURNED])
            .await
            .unwrap());

        let mut populated = MockUsersStore::new();
        populated.expect_count().returning(|| Ok(3));
        populated.expect_create().never();
        let service = UsersService::new(Arc::new(populated), cfg);
        assert!(!service.ensure_bootstrap_user(&[]).await.unwrap());
    }

    #[tokio::test]
    async fn bootstrap_needs_credentials() {
        let mut users = MockUsersStore::new();
        users.expect_count().never();
        let service = UsersService::new(Arc::new(users), config());
        assert!(!service.ensure_bootstrap_user(&[]).await.unwrap());
    }
}
