//! Genre and language endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{genre::GenreDetail, Genre, Language, Page, PageQuery},
    AppState,
};

/// List genres by name
#[utoipa::path(
    get,
    path = "/genres",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of genres", body = Page<Genre>)
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Genre>>> {
    let page = state.services.catalog.list_genres(query.page).await?;
    Ok(Json(page))
}

/// Genre with its books
#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre details", body = GenreDetail),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<GenreDetail>> {
    let detail = state.services.catalog.genre_detail(id).await?;
    Ok(Json(detail))
}

/// List languages by name
#[utoipa::path(
    get,
    path = "/languages",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of languages", body = Page<Language>)
    )
)]
pub async fn list_languages(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Language>>> {
    let page = state.services.catalog.list_languages(query.page).await?;
    Ok(Json(page))
}
