//! Home dashboard: catalog counts and the per-session visit counter

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::LoanStatus,
    repository::{AuthorsStore, BookInstancesStore, BooksStore, GenresStore},
    services::redis::SessionStore,
};

/// Home page context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HomePage {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Visits of this session before the current one
    pub num_visits: i64,
}

#[derive(Clone)]
pub struct HomeService {
    books: Arc<dyn BooksStore>,
    instances: Arc<dyn BookInstancesStore>,
    authors: Arc<dyn AuthorsStore>,
    genres: Arc<dyn GenresStore>,
    sessions: Arc<dyn SessionStore>,
}

impl HomeService {
    pub fn new(
        books: Arc<dyn BooksStore>,
        instances: Arc<dyn BookInstancesStore>,
        authors: Arc<dyn AuthorsStore>,
        genres: Arc<dyn GenresStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            books,
            instances,
            authors,
            genres,
            sessions,
        }
    }

    pub async fn dashboard(&self, session_id: &str) -> AppResult<HomePage> {
        let num_books = self.books.count().await?;
        let num_instances = self.instances.count().await?;
        let num_instances_available = self.instances.count_by_status(LoanStatus::Available).await?;
        let num_authors = self.authors.count().await?;
        let num_genres = self.genres.count().await?;
        let num_visits = self.sessions.record_visit(session_id).await?;

        Ok(HomePage {
            num_books,
            num_instances,
            num_instances_available,
            num_authors,
            num_genres,
            num_visits,
        })
    }
}
