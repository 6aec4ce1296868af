//! Book endpoints: listing, detail and edit forms

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDeletePage, BookDetail, BookFormPage},
        BookForm, BookSummary, FieldErrors, FormOutcome, Page, PageQuery,
    },
    AppState,
};

use super::{location, CatalogEditor, FormResponse};

/// List books by title
#[utoipa::path(
    get,
    path = "/books",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = Page<BookSummary>),
        (status = 404, description = "Page out of range")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page).await?;
    Ok(Json(page))
}

/// Book details with the availability of every copy
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let detail = state.services.catalog.book_detail(id).await?;
    Ok(Json(detail))
}

/// Blank book form
#[utoipa::path(
    get,
    path = "/books/create",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Blank form", body = BookFormPage),
        (status = 303, description = "Login required"),
        (status = 403, description = "Missing catalog edit permission")
    )
)]
pub async fn create_book_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
) -> Json<BookFormPage> {
    Json(state.services.catalog.blank_book_form())
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books/create",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Created, redirect to the book page"),
        (status = 200, description = "Form with field errors", body = BookFormPage),
        (status = 403, description = "Missing catalog edit permission")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Json(form): Json<BookForm>,
) -> AppResult<FormResponse<BookFormPage>> {
    match state.services.catalog.create_book(&form).await? {
        FormOutcome::Saved(book) => Ok(FormResponse::Redirect(location(&format!("/books/{}", book.id)))),
        FormOutcome::Invalid(errors) => Ok(FormResponse::Invalid(rejected_form(None, form, errors))),
    }
}

/// Book form pre-filled with the stored values
#[utoipa::path(
    get,
    path = "/books/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Pre-filled form", body = BookFormPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<Json<BookFormPage>> {
    let page = state.services.catalog.book_update_form(id).await?;
    Ok(Json(page))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/books/{id}/update",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookForm,
    responses(
        (status = 303, description = "Updated, redirect to the book page"),
        (status = 200, description = "Form with field errors", body = BookFormPage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
    Json(form): Json<BookForm>,
) -> AppResult<FormResponse<BookFormPage>> {
    match state.services.catalog.update_book(id, &form).await? {
        FormOutcome::Saved(_) => Ok(FormResponse::Redirect(location(&format!("/books/{}", id)))),
        FormOutcome::Invalid(errors) => {
            Ok(FormResponse::Invalid(rejected_form(Some(id), form, errors)))
        }
    }
}

/// Delete confirmation
#[utoipa::path(
    get,
    path = "/books/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book and number of copies", body = BookDeletePage),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book_form(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDeletePage>> {
    let page = state.services.catalog.book_delete_page(id).await?;
    Ok(Json(page))
}

/// Delete a book without copies
#[utoipa::path(
    post,
    path = "/books/{id}/delete",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 303, description = "Deleted, redirect to the book list"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _editor: CatalogEditor,
    Path(id): Path<i32>,
) -> AppResult<FormResponse<()>> {
    state.services.catalog.delete_book(id).await?;
    Ok(FormResponse::Redirect(location("/books")))
}

fn rejected_form(book_id: Option<i32>, form: BookForm, errors: FieldErrors) -> BookFormPage {
    BookFormPage {
        book_id,
        form,
        errors,
    }
}
