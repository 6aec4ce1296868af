//! Home page endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::{error::AppResult, services::home::HomePage, AppState};

/// Session id from the cookie jar, issuing a new cookie when absent
fn session_id(jar: CookieJar, cookie_name: &str) -> (CookieJar, String) {
    if let Some(id) = jar
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
    {
        return (jar, id);
    }

    let id = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((cookie_name.to_string(), id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

/// Catalog counts and the number of previous visits of this session
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page", body = HomePage),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<HomePage>)> {
    let (jar, session_id) = session_id(jar, &state.config.session.cookie_name);
    let page = state.services.home.dashboard(&session_id).await?;
    Ok((jar, Json(page)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_session_cookie_is_reused() {
        let jar = CookieJar::new().add(Cookie::new("sessionid", "abc123"));
        let (jar, id) = session_id(jar, "sessionid");
        assert_eq!(id, "abc123");
        assert_eq!(jar.iter().count(), 1);
    }

    #[test]
    fn missing_session_cookie_is_issued() {
        let (jar, id) = session_id(CookieJar::new(), "sessionid");
        assert_eq!(id.len(), 32);
        assert_eq!(jar.get("sessionid").map(|c| c.value().to_string()), Some(id));
    }
}
