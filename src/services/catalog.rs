//! Catalog service: books, authors, genres and languages

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        author::{AuthorDeletePage, AuthorDetail, AuthorFormPage},
        book::{display_genre, BookDeletePage, BookDetail, BookFormPage},
        form::push_error,
        genre::GenreDetail,
        Author, AuthorForm, Book, BookForm, BookSummary, FieldErrors, FormOutcome, Genre,
        Language, Page, PageRequest,
    },
    repository::{AuthorsStore, BookInstancesStore, BooksStore, GenresStore, LanguagesStore},
};

#[derive(Clone)]
pub struct CatalogService {
    authors: Arc<dyn AuthorsStore>,
    books: Arc<dyn BooksStore>,
    instances: Arc<dyn BookInstancesStore>,
    genres: Arc<dyn GenresStore>,
    languages: Arc<dyn LanguagesStore>,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(
        authors: Arc<dyn AuthorsStore>,
        books: Arc<dyn BooksStore>,
        instances: Arc<dyn BookInstancesStore>,
        genres: Arc<dyn GenresStore>,
        languages: Arc<dyn LanguagesStore>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            authors,
            books,
            instances,
            genres,
            languages,
            config,
        }
    }

    fn page_request(&self, page: Option<i64>) -> PageRequest {
        PageRequest::new(page, self.config.page_size)
    }

    // ---------------------------------------------------------------------
    // Books
    // ---------------------------------------------------------------------

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Page<BookSummary>> {
        let request = self.page_request(page);
        let (books, total) = self.books.list(request).await?;
        Page::build(books, total, request)
    }

    /// Book with author, language, genres and every copy
    pub async fn book_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.languages.get_by_id(language_id).await?),
            None => None,
        };
        let genres = self.books.genres_of(id).await?;
        let instances = self.instances.list_for_book(id).await?;

        let names = genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>();
        let display_genre = display_genre(&names);

        Ok(BookDetail {
            book,
            author,
            language,
            genres,
            display_genre,
            instances,
        })
    }

    pub fn blank_book_form(&self) -> BookFormPage {
        BookFormPage {
            book_id: None,
            form: BookForm::blank(),
            errors: FieldErrors::new(),
        }
    }

    pub async fn book_update_form(&self, id: i32) -> AppResult<BookFormPage> {
        let book = self.books.get_by_id(id).await?;
        let genres = self.books.genres_of(id).await?;
        Ok(BookFormPage {
            book_id: Some(id),
            form: BookForm::from_book(&book, &genres),
            errors: FieldErrors::new(),
        })
    }

    /// Field checks plus existence of every referenced author, language and genre
    async fn check_book_form(&self, form: &BookForm) -> AppResult<FieldErrors> {
        let mut errors = form.check();

        if let Some(author_id) = form.author_id {
            if !self.authors.exists(author_id).await? {
                push_error(&mut errors, "author_id", format!("Author {} does not exist", author_id));
            }
        }
        if let Some(language_id) = form.language_id {
            if !self.languages.exists(language_id).await? {
                push_error(
                    &mut errors,
                    "language_id",
                    format!("Language {} does not exist", language_id),
                );
            }
        }
        let genre_ids = form.unique_genre_ids();
        if !genre_ids.is_empty() {
            for missing in self.genres.missing(&genre_ids).await? {
                push_error(&mut errors, "genre_ids", format!("Genre {} does not exist", missing));
            }
        }
        Ok(errors)
    }

    pub async fn create_book(&self, form: &BookForm) -> AppResult<FormOutcome<Book>> {
        let errors = self.check_book_form(form).await?;
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }
        let book = self.books.create(form).await?;
        tracing::info!("Created book id={} title={:?}", book.id, book.title);
        Ok(FormOutcome::Saved(book))
    }

    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<FormOutcome<Book>> {
        self.books.get_by_id(id).await?;
        let errors = self.check_book_form(form).await?;
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }
        let book = self.books.update(id, form).await?;
        tracing::info!("Updated book id={}", id);
        Ok(FormOutcome::Saved(book))
    }

    pub async fn book_delete_page(&self, id: i32) -> AppResult<BookDeletePage> {
        let book = self.books.get_by_id(id).await?;
        let instance_count = self.instances.count_for_book(id).await?;
        Ok(BookDeletePage {
            book,
            instance_count,
        })
    }

    /// Delete a book; refused while copies of it exist
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.books.get_by_id(id).await?;
        let copies = self.instances.count_for_book(id).await?;
        if copies > 0 {
            tracing::warn!("Refusing to delete book id={} with {} copies", id, copies);
            return Err(AppError::Conflict(format!(
                "Book with id {} still has {} copies; delete them first",
                id, copies
            )));
        }
        self.books.delete(id).await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Authors
    // ---------------------------------------------------------------------

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Page<Author>> {
        let request = self.page_request(page);
        let (authors, total) = self.authors.list(request).await?;
        Page::build(authors, total, request)
    }

    pub async fn author_detail(&self, id: i32, today: NaiveDate) -> AppResult<AuthorDetail> {
        let author = self.authors.get_by_id(id).await?;
        let books = self.books.list_by_author(id).await?;
        Ok(AuthorDetail {
            author,
            books,
            today,
        })
    }

    pub fn blank_author_form(&self) -> AuthorFormPage {
        AuthorFormPage {
            author_id: None,
            form: AuthorForm::blank(self.config.default_date_of_death),
            errors: FieldErrors::new(),
        }
    }

    pub async fn author_update_form(&self, id: i32) -> AppResult<AuthorFormPage> {
        let author = self.authors.get_by_id(id).await?;
        Ok(AuthorFormPage {
            author_id: Some(id),
            form: AuthorForm::from(&author),
            errors: FieldErrors::new(),
        })
    }

    pub async fn create_author(&self, form: &AuthorForm) -> AppResult<FormOutcome<Author>> {
        let record = match form.clean() {
            Ok(record) => record,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };
        let author = self.authors.create(&record).await?;
        tracing::info!("Created author id={} ({})", author.id, author.display_name());
        Ok(FormOutcome::Saved(author))
    }

    pub async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<FormOutcome<Author>> {
        self.authors.get_by_id(id).await?;
        let record = match form.clean() {
            Ok(record) => record,
            Err(errors) => return Ok(FormOutcome::Invalid(errors)),
        };
        let author = self.authors.update(id, &record).await?;
        tracing::info!("Updated author id={}", id);
        Ok(FormOutcome::Saved(author))
    }

    pub async fn author_delete_page(&self, id: i32) -> AppResult<AuthorDeletePage> {
        let author = self.authors.get_by_id(id).await?;
        let book_count = self.authors.count_books(id).await?;
        Ok(AuthorDeletePage { author, book_count })
    }

    /// Delete an author; their books keep existing without an author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.authors.delete(id).await?;
        tracing::info!("Deleted author id={}", id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Genres and languages
    // ---------------------------------------------------------------------

    pub async fn list_genres(&self, page: Option<i64>) -> AppResult<Page<Genre>> {
        let request = self.page_request(page);
        let (genres, total) = self.genres.list(request).await?;
        Page::build(genres, total, request)
    }

    pub async fn genre_detail(&self, id: i32) -> AppResult<GenreDetail> {
        let genre = self.genres.get_by_id(id).await?;
        let books = self.books.list_by_genre(id).await?;
        Ok(GenreDetail { genre, books })
    }

    pub async fn list_languages(&self, page: Option<i64>) -> AppResult<Page<Language>> {
        let request = self.page_request(page);
        let (languages, total) = self.languages.list(request).await?;
        Page::build(languages, total, request)
    }
}
