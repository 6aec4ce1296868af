//! Operator console service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AdminAuthorRow,
        book::AdminBookRow,
        book_instance::{
            AdminInstanceDetail, AdminInstanceRow, BookInstanceInput, InstanceFilter,
        },
        form::{field_errors, push_error},
        genre::{CreateGenre, CreateLanguage},
        BookInstance, FieldErrors, Genre, Language, LoanStatus, Page, PageRequest,
    },
    repository::{
        book_instances::InstanceCriteria, AuthorsStore, BookInstancesStore, BooksStore,
        GenresStore, LanguagesStore, UsersStore,
    },
};

/// Flatten field errors into a single 400 message
fn rejected(errors: FieldErrors) -> AppError {
    let message = errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");
    AppError::Validation(message)
}

#[derive(Clone)]
pub struct AdminService {
    authors: Arc<dyn AuthorsStore>,
    books: Arc<dyn BooksStore>,
    instances: Arc<dyn BookInstancesStore>,
    genres: Arc<dyn GenresStore>,
    languages: Arc<dyn LanguagesStore>,
    users: Arc<dyn UsersStore>,
    page_size: i64,
}

impl AdminService {
    pub fn new(
        authors: Arc<dyn AuthorsStore>,
        books: Arc<dyn BooksStore>,
        instances: Arc<dyn BookInstancesStore>,
        genres: Arc<dyn GenresStore>,
        languages: Arc<dyn LanguagesStore>,
        users: Arc<dyn UsersStore>,
        page_size: i64,
    ) -> Self {
        Self {
            authors,
            books,
            instances,
            genres,
            languages,
            users,
            page_size,
        }
    }

    pub async fn authors(&self, page: Option<i64>) -> AppResult<Page<AdminAuthorRow>> {
        let request = PageRequest::new(page, self.page_size);
        let (authors, total) = self.authors.list(request).await?;
        let rows = authors.into_iter().map(AdminAuthorRow::from).collect();
        Page::build(rows, total, request)
    }

    pub async fn books(&self, page: Option<i64>) -> AppResult<Page<AdminBookRow>> {
        let request = PageRequest::new(page, self.page_size);
        let (records, total) = self.books.admin_rows(request).await?;
        let rows = records.into_iter().map(AdminBookRow::from).collect();
        Page::build(rows, total, request)
    }

    /// Copies filtered by status and due date
    pub async fn instances(&self, filter: InstanceFilter) -> AppResult<Page<AdminInstanceRow>> {
        let status = match filter.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<LoanStatus>().map_err(AppError::Validation)?),
        };
        let criteria = InstanceCriteria {
            status,
            due_back: filter.due_back,
        };

        let request = PageRequest::new(filter.page, self.page_size);
        let (rows, total) = self.instances.admin_rows(criteria, request).await?;
        Page::build(rows, total, request)
    }

    pub async fn instance_detail(&self, id: Uuid) -> AppResult<AdminInstanceDetail> {
        let instance = self.instances.get_loaned(id).await?;
        if (instance.status == LoanStatus::OnLoan) != instance.borrower_id.is_some() {
            // Reported as stored
            tracing::warn!("Book instance {} has an inconsistent loan state", id);
        }
        Ok(AdminInstanceDetail::from(instance))
    }

    /// Store checks shared by create and update
    async fn check_instance(&self, input: &BookInstanceInput) -> AppResult<()> {
        let mut errors = input.check();

        match self.books.get_by_id(input.book_id).await {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => push_error(
                &mut errors,
                "book_id",
                format!("Book {} does not exist", input.book_id),
            ),
            Err(e) => return Err(e),
        }
        if let Some(borrower_id) = input.borrower_id {
            if !self.users.exists(borrower_id).await? {
                push_error(&mut errors, "borrower_id", format!("User {} does not exist", borrower_id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(rejected(errors))
        }
    }

    pub async fn create_instance(&self, input: BookInstanceInput) -> AppResult<BookInstance> {
        self.check_instance(&input).await?;
        let instance = self.instances.create(&input).await?;
        tracing::info!("Created book instance {} of book {}", instance.id, instance.book_id);
        Ok(instance)
    }

    pub async fn update_instance(&self, id: Uuid, input: BookInstanceInput) -> AppResult<BookInstance> {
        self.instances.get_by_id(id).await?;
        self.check_instance(&input).await?;
        let instance = self.instances.update(id, &input).await?;
        tracing::info!("Updated book instance {} ({})", id, instance.status);
        Ok(instance)
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.instances.delete(id).await?;
        tracing::info!("Deleted book instance {}", id);
        Ok(())
    }

    pub async fn create_genre(&self, input: CreateGenre) -> AppResult<Genre> {
        if let Err(e) = input.validate() {
            return Err(rejected(field_errors(&e)));
        }
        let genre = self.genres.create(input.name.trim()).await?;
        tracing::info!("Created genre {} ({})", genre.name, genre.id);
        Ok(genre)
    }

    /// Delete a genre; its book links go with it
    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.genres.delete(id).await?;
        tracing::info!("Deleted genre {}", id);
        Ok(())
    }

    pub async fn create_language(&self, input: CreateLanguage) -> AppResult<Language> {
        if let Err(e) = input.validate() {
            return Err(rejected(field_errors(&e)));
        }
        let language = self.languages.create(input.name.trim()).await?;
        tracing::info!("Created language {} ({})", language.name, language.id);
        Ok(language)
    }

    /// Delete a language; books written in it keep no language
    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.languages.delete(id).await?;
        tracing::info!("Deleted language {}", id);
        Ok(())
    }
}
