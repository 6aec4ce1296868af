//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{AdminBookRecord, BookForm},
        Book, BookSummary, Genre, PageRequest,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id,
           (a.last_name || ', ' || a.first_name) AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

/// Book persistence, including the genre links
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksStore: Send + Sync {
    /// One page of books ordered by title
    async fn list(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)>;
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>>;
    async fn list_by_genre(&self, genre_id: i32) -> AppResult<Vec<BookSummary>>;
    /// Genres of a book ordered by name
    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>>;
    async fn create(&self, form: &BookForm) -> AppResult<Book>;
    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book>;
    async fn delete(&self, id: i32) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
    async fn admin_rows(&self, page: PageRequest) -> AppResult<(Vec<AdminBookRecord>, i64)>;
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn summaries_where(&self, condition: &str, id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE {} ORDER BY b.title, b.id", SUMMARY_SELECT, condition);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}

#[async_trait]
impl BooksStore for BooksRepository {
    async fn list(&self, page: PageRequest) -> AppResult<(Vec<BookSummary>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{} ORDER BY b.title, b.id LIMIT $1 OFFSET $2", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        self.summaries_where("b.author_id = $1", author_id).await
    }

    async fn list_by_genre(&self, genre_id: i32) -> AppResult<Vec<BookSummary>> {
        self.summaries_where(
            "EXISTS (SELECT 1 FROM book_genres bg WHERE bg.book_id = b.id AND bg.genre_id = $1)",
            genre_id,
        )
        .await
    }

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(book.id)
            .bind(form.unique_genre_ids())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(id)
            .bind(form.unique_genre_ids())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        // book_instances.book_id is ON DELETE RESTRICT
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let restricted = e
                    .as_database_error()
                    .and_then(|d| d.code())
                    .map(|code| code == "23503")
                    .unwrap_or(false);
                if restricted {
                    AppError::Conflict(format!("Book with id {} still has copies", id))
                } else {
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn admin_rows(&self, page: PageRequest) -> AppResult<(Vec<AdminBookRecord>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, AdminBookRecord>(
            r#"
            SELECT b.id, b.title,
                   (a.last_name || ', ' || a.first_name) AS author,
                   ARRAY(
                       SELECT g.name::text
                       FROM book_genres bg
                       JOIN genres g ON g.id = bg.genre_id
                       WHERE bg.book_id = b.id
                       ORDER BY g.name
                   ) AS genre_names
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            ORDER BY b.title, b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
