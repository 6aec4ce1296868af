//! API handlers for the Local Library endpoints

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod genres;
pub mod health;
pub mod home;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::{
        header::{AUTHORIZATION, LOCATION},
        request::Parts,
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{config::AppConfig, error::AppError, models::user::UserClaims, AppState};

/// Mount point of every route below
pub const API_PREFIX: &str = "/api/v1";

/// Absolute path of an API route, for redirects
pub fn location(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Claims from the bearer token, `None` when no Authorization header is sent
fn bearer_claims(parts: &Parts, config: &AppConfig) -> Option<Result<UserClaims, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;

    let result = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))
        .and_then(|token| {
            UserClaims::from_token(token, &config.auth.jwt_secret)
                .map_err(|e| AppError::Authentication(e.to_string()))
        });
    Some(result)
}

/// Redirect to the login page, coming back to the requested path afterwards
fn login_required(parts: &Parts, config: &AppConfig) -> AppError {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    AppError::LoginRequired {
        login_url: config.auth.login_url.clone(),
        next,
    }
}

/// Extractor for authenticated user from JWT token (401 without one)
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, &state.config)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))??;
        Ok(AuthenticatedUser(claims))
    }
}

/// Authenticated user on pages that send anonymous visitors to the login
/// page instead of failing
pub struct LoginRequired(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for LoginRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        logged_in(parts, &state.config).map(LoginRequired)
    }
}

fn logged_in(parts: &Parts, config: &AppConfig) -> Result<UserClaims, AppError> {
    match bearer_claims(parts, config) {
        Some(claims) => claims,
        None => Err(login_required(parts, config)),
    }
}

/// Caller allowed to edit authors and books.
///
/// With `access.catalog_edit_permission` set the caller must log in and hold
/// that permission. With it empty anyone may edit; claims are still parsed
/// when sent.
pub struct CatalogEditor(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for CatalogEditor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        catalog_editor(parts, &state.config).map(CatalogEditor)
    }
}

fn catalog_editor(parts: &Parts, config: &AppConfig) -> Result<Option<UserClaims>, AppError> {
    match config.access.catalog_edit_permission() {
        Some(permission) => {
            let claims = logged_in(parts, config)?;
            claims.require_permission(permission)?;
            Ok(Some(claims))
        }
        None => bearer_claims(parts, config).transpose(),
    }
}

/// Response of a form submission
pub enum FormResponse<T> {
    /// Saved: 303 to the given location
    Redirect(String),
    /// Rejected: the form page again, with its errors
    Invalid(T),
}

impl<T: Serialize> IntoResponse for FormResponse<T> {
    fn into_response(self) -> Response {
        match self {
            FormResponse::Redirect(target) => {
                (StatusCode::SEE_OTHER, [(LOCATION, target)]).into_response()
            }
            FormResponse::Invalid(page) => (StatusCode::OK, Json(page)).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CAN_MARK_RETURNED;
    use axum::http::Request;

    fn token(permissions: &[&str]) -> String {
        let now = chrono::Utc::now().timestamp();
        UserClaims {
            sub: "reader".into(),
            user_id: 7,
            is_staff: false,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: now + 600,
            iat: now,
        }
        .create_token("change-this-secret-in-production")
        .unwrap()
    }

    fn parts(uri: &str, bearer: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn form_redirect_is_see_other() {
        let response = FormResponse::<()>::Redirect(location("/loans")).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/api/v1/loans");

        let response = FormResponse::Invalid(serde_json::json!({"errors": {}})).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn bearer_claims_distinguish_missing_and_invalid() {
        let config = AppConfig::default();
        assert!(bearer_claims(&parts("/loans", None), &config).is_none());
        assert!(matches!(
            bearer_claims(&parts("/loans", Some("garbage")), &config),
            Some(Err(AppError::Authentication(_)))
        ));
        let claims = bearer_claims(&parts("/loans", Some(&token(&[CAN_MARK_RETURNED]))), &config)
            .unwrap()
            .unwrap();
        assert!(claims.has_permission(CAN_MARK_RETURNED));
    }

    #[test]
    fn anonymous_visitor_is_sent_to_login_with_next() {
        let config = AppConfig::default();
        let rejection = logged_in(&parts("/loans/mine?page=2", None), &config).unwrap_err();
        match rejection {
            AppError::LoginRequired { login_url, next } => {
                assert_eq!(login_url, "/api/v1/auth/login");
                assert_eq!(next, "/loans/mine?page=2");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn catalog_editing_needs_the_configured_permission() {
        let config = AppConfig::default();

        assert!(matches!(
            catalog_editor(&parts("/authors/create", None), &config),
            Err(AppError::LoginRequired { .. })
        ));

        assert!(matches!(
            catalog_editor(&parts("/authors/create", Some(&token(&[]))), &config),
            Err(AppError::Authorization(_))
        ));

        let editor = parts("/authors/create", Some(&token(&["can_edit_catalog"])));
        assert!(catalog_editor(&editor, &config).unwrap().is_some());

        let open = AppConfig {
            access: crate::config::AccessConfig {
                catalog_edit_permission: String::new(),
            },
            ..AppConfig::default()
        };
        assert_eq!(catalog_editor(&parts("/authors/create", None), &open).unwrap(), None);
    }
}
