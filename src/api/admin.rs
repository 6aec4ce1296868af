//! Operator console endpoints (staff only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        author::AdminAuthorRow,
        book::AdminBookRow,
        book_instance::{AdminInstanceDetail, AdminInstanceRow, BookInstanceInput, InstanceFilter},
        genre::{CreateGenre, CreateLanguage},
        BookInstance, Genre, Language, Page, PageQuery,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Console list of authors
#[utoipa::path(
    get,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Author rows", body = Page<AdminAuthorRow>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff account required")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<AdminAuthorRow>>> {
    claims.require_staff()?;

    let page = state.services.admin.authors(query.page).await?;
    Ok(Json(page))
}

/// Console list of books
#[utoipa::path(
    get,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Book rows", body = Page<AdminBookRow>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff account required")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<AdminBookRow>>> {
    claims.require_staff()?;

    let page = state.services.admin.books(query.page).await?;
    Ok(Json(page))
}

/// Console list of copies, filtered by status and due date
#[utoipa::path(
    get,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(InstanceFilter),
    responses(
        (status = 200, description = "Copy rows", body = Page<AdminInstanceRow>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff account required")
    )
)]
pub async fn list_instances(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(filter): Query<InstanceFilter>,
) -> AppResult<Json<Page<AdminInstanceRow>>> {
    claims.require_staff()?;

    let page = state.services.admin.instances(filter).await?;
    Ok(Json(page))
}

/// Console view of one copy
#[utoipa::path(
    get,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Identification and availability", body = AdminInstanceDetail),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminInstanceDetail>> {
    claims.require_staff()?;

    let detail = state.services.admin.instance_detail(id).await?;
    Ok(Json(detail))
}

/// Add a copy
#[utoipa::path(
    post,
    path = "/admin/bookinstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = BookInstanceInput,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<BookInstanceInput>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_staff()?;

    let created = state.services.admin.create_instance(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a copy's fields
#[utoipa::path(
    put,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = BookInstanceInput,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<BookInstanceInput>,
) -> AppResult<Json<BookInstance>> {
    claims.require_staff()?;

    let updated = state.services.admin.update_instance(id, input).await?;
    Ok(Json(updated))
}

/// Remove a copy
#[utoipa::path(
    delete,
    path = "/admin/bookinstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.admin.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a genre
#[utoipa::path(
    post,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateGenre,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Genre already exists")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<CreateGenre>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_staff()?;

    let created = state.services.admin.create_genre(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove a genre and its book links
#[utoipa::path(
    delete,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.admin.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a language
#[utoipa::path(
    post,
    path = "/admin/languages",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateLanguage,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Invalid name"),
        (status = 409, description = "Language already exists")
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<CreateLanguage>,
) -> AppResult<(StatusCode, Json<Language>)> {
    claims.require_staff()?;

    let created = state.services.admin.create_language(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Remove a language
#[utoipa::path(
    delete,
    path = "/admin/languages/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Language ID")
    ),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Language not found")
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.admin.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
