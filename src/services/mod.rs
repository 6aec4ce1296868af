//! Business logic services

pub mod admin;
pub mod catalog;
pub mod home;
pub mod loans;
pub mod redis;
pub mod users;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::AppResult,
    repository::{
        AuthorsStore, BookInstancesStore, BooksStore, GenresStore, LanguagesStore, Repository,
        UsersStore,
    },
};

use self::redis::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub admin: admin::AdminService,
    pub catalog: catalog::CatalogService,
    pub home: home::HomeService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    repository: Repository,
    sessions: Arc<dyn SessionStore>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, redis_service: redis::RedisService, config: &AppConfig) -> Self {
        let authors: Arc<dyn AuthorsStore> = Arc::new(repository.authors.clone());
        let books: Arc<dyn BooksStore> = Arc::new(repository.books.clone());
        let instances: Arc<dyn BookInstancesStore> = Arc::new(repository.book_instances.clone());
        let genres: Arc<dyn GenresStore> = Arc::new(repository.genres.clone());
        let languages: Arc<dyn LanguagesStore> = Arc::new(repository.languages.clone());
        let users: Arc<dyn UsersStore> = Arc::new(repository.users.clone());
        let sessions: Arc<dyn SessionStore> = Arc::new(redis_service);
        let page_size = config.catalog.page_size;

        Self {
            admin: admin::AdminService::new(
                authors.clone(),
                books.clone(),
                instances.clone(),
                genres.clone(),
                languages.clone(),
                users.clone(),
                page_size,
            ),
            catalog: catalog::CatalogService::new(
                authors.clone(),
                books.clone(),
                instances.clone(),
                genres.clone(),
                languages,
                config.catalog.clone(),
            ),
            home: home::HomeService::new(books, instances.clone(), authors, genres, sessions.clone()),
            loans: loans::LoansService::new(instances, config.loans.clone(), page_size),
            users: users::UsersService::new(users, config.auth.clone()),
            repository,
            sessions,
        }
    }

    /// Check that PostgreSQL and Redis both answer
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.ping().await?;
        self.sessions.ping().await?;
        Ok(())
    }
}
