//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, authors, books, genres, health, home, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Library catalog: books, authors, copies and loans"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login_form,
        auth::login,
        auth::me,
        // Catalog
        home::index,
        books::list_books,
        books::get_book,
        books::create_book_form,
        books::create_book,
        books::update_book_form,
        books::update_book,
        books::delete_book_form,
        books::delete_book,
        authors::list_authors,
        authors::get_author,
        authors::create_author_form,
        authors::create_author,
        authors::update_author_form,
        authors::update_author,
        authors::delete_author_form,
        authors::delete_author,
        genres::list_genres,
        genres::get_genre,
        genres::list_languages,
        // Loans
        loans::my_loans,
        loans::all_loans,
        loans::renew_form,
        loans::renew,
        // Console
        admin::list_authors,
        admin::list_books,
        admin::list_instances,
        admin::get_instance,
        admin::create_instance,
        admin::update_instance,
        admin::delete_instance,
        admin::create_genre,
        admin::delete_genre,
        admin::create_language,
        admin::delete_language,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::LoginPage,
            auth::UserInfo,
            // Catalog
            crate::services::home::HomePage,
            crate::models::Book,
            crate::models::BookSummary,
            crate::models::BookForm,
            crate::models::book::BookDetail,
            crate::models::book::BookFormPage,
            crate::models::book::BookDeletePage,
            crate::models::Author,
            crate::models::AuthorForm,
            crate::models::author::AuthorDetail,
            crate::models::author::AuthorFormPage,
            crate::models::author::AuthorDeletePage,
            crate::models::Genre,
            crate::models::genre::GenreDetail,
            crate::models::Language,
            // Loans
            crate::models::BookInstance,
            crate::models::LoanStatus,
            crate::models::LoanedInstance,
            crate::models::book_instance::RenewForm,
            crate::models::book_instance::RenewFormPage,
            // Console
            crate::models::author::AdminAuthorRow,
            crate::models::book::AdminBookRow,
            crate::models::book_instance::AdminInstanceRow,
            crate::models::book_instance::AdminInstanceDetail,
            crate::models::book_instance::InstanceIdentification,
            crate::models::book_instance::InstanceAvailability,
            crate::models::book_instance::BookInstanceInput,
            crate::models::genre::CreateGenre,
            crate::models::genre::CreateLanguage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Books, authors, genres and languages"),
        (name = "loans", description = "Borrowed copies and renewals"),
        (name = "admin", description = "Operator console")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_renewal_and_secures_it() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/bookinstances/{id}/renew"));
        assert!(doc.paths.paths.contains_key("/admin/bookinstances/{id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
