//! User accounts, permissions and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Permission that lets staff see every loan and renew it
pub const CAN_MARK_RETURNED: &str = "can_mark_returned";

/// Library account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub is_staff: bool,
    /// Granted permission names
    pub permissions: Vec<String>,
    pub date_joined: DateTime<Utc>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, issued_at: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            permissions: user.permissions.clone(),
            exp: issued_at + ttl_seconds,
            iat: issued_at,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Permission '{}' required",
                permission
            )))
        }
    }

    /// Require access to the operator console
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff account required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(permissions: &[&str], is_staff: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "librarian".into(),
            user_id: 3,
            is_staff,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn token_round_trip_keeps_grants() {
        let original = claims(&[CAN_MARK_RETURNED], true);
        let token = original.create_token("secret").unwrap();
        assert_eq!(UserClaims::from_token(&token, "secret").unwrap(), original);
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn permission_checks() {
        let staff = claims(&[CAN_MARK_RETURNED], true);
        assert!(staff.require_permission(CAN_MARK_RETURNED).is_ok());
        assert!(staff.require_staff().is_ok());

        let reader = claims(&[], false);
        assert!(matches!(
            reader.require_permission(CAN_MARK_RETURNED),
            Err(AppError::Authorization(_))
        ));
        assert!(reader.require_staff().is_err());
    }
}
