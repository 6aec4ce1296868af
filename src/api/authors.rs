//! Author endpoints: listing, detail and edit forms

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{AuthorDeletePage, AuthorDetail, AuthorFormPage},
        Author, AuthorForm, FormOutcome, Page, PageQuery,
    },
    AppState,
};

use super::{location, CatalogEditor, FormResponse};

/// List authors by last then first name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = Page<Author>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let page = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(page))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let today = chrono::Local::now().date_naive();
    let detail = state.services.catalog.author_detail(id, today).await?;
    Ok(Json(detail))
}

/// Blank author form
#[utoipa::path(
    get,
    path = "/authors/create",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Blank form", body = AuthorFormPage),
        (status = 303, description = "Login required"),
        (status = 403, description = "Missing catalog edit permission")
    )
)]
pub async fn create_author_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
) -> Json<AuthorFormPage> {
    Json(state.services.catalog.blank_author_form())
}

/// Create an author
#[utoipa::path(
    post,
    path = "/authors/create",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Created, redirect to the author page"),
        (status = 200, description = "Form with field errors", body = AuthorFormPage),
        (status = 403, description = "Missing catalog edit permission")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Json(form): Json<AuthorForm>,
) -> AppResult<FormResponse<AuthorFormPage>> {
    match state.services.catalog.create_author(&form).await? {
        FormOutcome::Saved(author) => {
            Ok(FormResponse::Redirect(location(&format!("/authors/{}", author.id))))
        }
        FormOutcome::Invalid(errors) => Ok(FormResponse::Invalid(AuthorFormPage {
            author_id: None,
            form,
            errors,
        })),
    }
}

/// Author form pre-filled with the stored values
#[utoipa::path(
    get,
    path = "/authors/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Pre-filled form", body = AuthorFormPage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorFormPage>> {
    let page = state.services.catalog.author_update_form(id).await?;
    Ok(Json(page))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/authors/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Updated, redirect to the author page"),
        (status = 200, description = "Form with field errors", body = AuthorFormPage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
    Json(form): Json<AuthorForm>,
) -> AppResult<FormResponse<AuthorFormPage>> {
    match state.services.catalog.update_author(id, &form).await? {
        FormOutcome::Saved(_) => Ok(FormResponse::Redirect(location(&format!("/authors/{}", id)))),
        FormOutcome::Invalid(errors) => Ok(FormResponse::Invalid(AuthorFormPage {
            author_id: Some(id),
            form,
            errors,
        })),
    }
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/authors/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author and number of books", body = AuthorDeletePage),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDeletePage>> {
    let page = state.services.catalog.author_delete_page(id).await?;
    Ok(Json(page))
}

/// Delete an author; their books are kept without author
#[utoipa::path(
    post,
    path = "/authors/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 303, description = "Deleted, redirect to the author list"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<FormResponse<()>> {
    state.services.catalog.delete_author(id).await?;
    Ok(FormResponse::Redirect(location("/authors")))
}
