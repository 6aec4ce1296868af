//! Local Library Server
//!
//! REST API server for the library catalog.

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locallibrary_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{redis::RedisService, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("locallibrary_server={},tower_http=debug", config.logging.level).into()
    });

    let json_logs = config.logging.format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(filter)
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting Local Library Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    // Initialize Redis connection
    let redis_service = RedisService::new(&config.redis.url, config.session.ttl_seconds).await?;

    tracing::info!("Connected to Redis");

    let catalog_edit_permission = config.access.catalog_edit_permission().map(str::to_string);
    if catalog_edit_permission.is_none() {
        tracing::warn!("access.catalog_edit_permission is empty: anyone may edit authors and books");
    }

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, redis_service, &config);

    let extra_permissions: Vec<&str> = catalog_edit_permission.as_deref().into_iter().collect();
    services.users.ensure_bootstrap_user(&extra_permissions).await?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", get(api::auth::login_form).post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Home
        .route("/", get(api::home::index))
        // Books
        .route("/books", get(api::books::list_books))
        .route(
            "/books/create",
            get(api::books::create_book_form).post(api::books::create_book),
        )
        .route("/books/:id", get(api::books::get_book))
        .route(
            "/books/:id/update",
            get(api::books::update_book_form).post(api::books::update_book),
        )
        .route(
            "/books/:id/delete",
            get(api::books::delete_book_form).post(api::books::delete_book),
        )
        // Authors
        .route("/authors", get(api::authors::list_authors))
        .route(
            "/authors/create",
            get(api::authors::create_author_form).post(api::authors::create_author),
        )
        .route("/authors/:id", get(api::authors::get_author))
        .route(
            "/authors/:id/update",
            get(api::authors::update_author_form).post(api::authors::update_author),
        )
        .route(
            "/authors/:id/delete",
            get(api::authors::delete_author_form).post(api::authors::delete_author),
        )
        // Genres and languages
        .route("/genres", get(api::genres::list_genres))
        .route("/genres/:id", get(api::genres::get_genre))
        .route("/languages", get(api::genres::list_languages))
        // Loans
        .route("/loans", get(api::loans::all_loans))
        .route("/loans/mine", get(api::loans::my_loans))
        .route(
            "/bookinstances/:id/renew",
            get(api::loans::renew_form).post(api::loans::renew),
        )
        // Operator console
        .route("/admin/authors", get(api::admin::list_authors))
        .route("/admin/books", get(api::admin::list_books))
        .route(
            "/admin/bookinstances",
            get(api::admin::list_instances).post(api::admin::create_instance),
        )
        .route(
            "/admin/bookinstances/:id",
            get(api::admin::get_instance)
                .put(api::admin::update_instance)
                .delete(api::admin::delete_instance),
        )
        .route("/admin/genres", post(api::admin::create_genre))
        .route("/admin/genres/:id", delete(api::admin::delete_genre))
        .route("/admin/languages", post(api::admin::create_language))
        .route("/admin/languages/:id", delete(api::admin::delete_language))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest(api::API_PREFIX, api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
