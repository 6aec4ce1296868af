//! Book model and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstance,
    form::{empty_if_null, field_errors, push_error, FieldErrors},
    genre::{Genre, Language},
};

/// Genre names shown in list columns before truncation
pub const GENRE_SUMMARY_LIMIT: usize = 3;

static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("valid ISBN pattern"));

/// Book (a title, not a physical copy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub language_id: Option<i32>,
}

/// Book row for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, if any
    pub author_name: Option<String>,
}

/// Comma separated names of the first genres, for list display
pub fn display_genre<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .take(GENRE_SUMMARY_LIMIT)
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Book page with availability of every copy
#[derive(Debug, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub instances: Vec<BookInstance>,
}

/// Create/update book form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Enter a title (at most 200 characters)"))]
    #[serde(default, deserialize_with = "empty_if_null")]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Summary is limited to 1000 characters"))]
    #[serde(default, deserialize_with = "empty_if_null")]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    #[serde(default, deserialize_with = "empty_if_null")]
    pub isbn: String,
    pub language_id: Option<i32>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            author_id: None,
            summary: String::new(),
            isbn: String::new(),
            language_id: None,
            genre_ids: Vec::new(),
        }
    }

    pub fn from_book(book: &Book, genres: &[Genre]) -> Self {
        Self {
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            language_id: book.language_id,
            genre_ids: genres.iter().map(|g| g.id).collect(),
        }
    }

    /// Field checks that need no store access
    pub fn check(&self) -> FieldErrors {
        let mut errors = self
            .validate()
            .err()
            .map(|e| field_errors(&e))
            .unwrap_or_default();

        if self.isbn.chars().count() == 13 && !ISBN_RE.is_match(&self.isbn) {
            push_error(&mut errors, "isbn", "ISBN may only contain digits");
        }
        errors
    }

    /// Genre ids without duplicates, in submission order
    pub fn unique_genre_ids(&self) -> Vec<i32> {
        let mut ids = Vec::with_capacity(self.genre_ids.len());
        for id in &self.genre_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// Book form page
#[derive(Debug, Serialize, ToSchema)]
pub struct BookFormPage {
    pub book_id: Option<i32>,
    pub form: BookForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Delete confirmation page
#[derive(Debug, Serialize, ToSchema)]
pub struct BookDeletePage {
    pub book: Book,
    /// Copies on record; a book with copies cannot be deleted
    pub instance_count: i64,
}

/// Operator console row
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminBookRow {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: String,
}

/// Raw console row before the genre summary is built
#[derive(Debug, FromRow)]
pub struct AdminBookRecord {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre_names: Vec<String>,
}

impl From<AdminBookRecord> for AdminBookRow {
    fn from(r: AdminBookRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            author: r.author,
            genre: display_genre(&r.genre_names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_summary_keeps_first_three() {
        assert_eq!(display_genre::<&str>(&[]), "");
        assert_eq!(display_genre(&["Fantasy"]), "Fantasy");
        assert_eq!(
            display_genre(&["Fantasy", "Horror", "Poetry", "Western"]),
            "Fantasy, Horror, Poetry"
        );
    }

    #[test]
    fn isbn_must_be_thirteen_digits() {
        let mut form = BookForm {
            title: "Dune".into(),
            isbn: "9780441013593".into(),
            ..BookForm::blank()
        };
        assert!(form.check().is_empty());

        form.isbn = "978044101359".into();
        assert!(form.check().contains_key("isbn"));

        form.isbn = "97804410135a3".into();
        assert_eq!(form.check()["isbn"].len(), 1);

        form.isbn = "978044101359X".into();
        assert_eq!(form.check()["isbn"], vec!["ISBN may only contain digits"]);
    }

    #[test]
    fn incomplete_submission_still_deserializes() {
        let form: BookForm = serde_json::from_value(serde_json::json!({
            "title": null,
            "genre_ids": [2]
        }))
        .unwrap();
        assert_eq!(form.genre_ids, vec![2]);
        let errors = form.check();
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("isbn"));
    }

    #[test]
    fn duplicate_genres_collapse() {
        let form = BookForm {
            genre_ids: vec![3, 1, 3, 2, 1],
            ..BookForm::blank()
        };
        assert_eq!(form.unique_genre_ids(), vec![3, 1, 2]);
    }

    #[test]
    fn console_row_summarises_genres() {
        let row: AdminBookRow = AdminBookRecord {
            id: 7,
            title: "Dune".into(),
            author: Some("Herbert, Frank".into()),
            genre_names: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        }
        .into();
        assert_eq!(row.genre, "A, B, C");
    }
}
