//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    book::BookSummary,
    form::{empty_if_null, field_errors, format_date, optional_date, push_error, FieldErrors},
};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First" as shown in listings
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author page: the author, their books, and today's date so the page can
/// flag overdue copies.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<BookSummary>,
    pub today: NaiveDate,
}

/// Create/update author form, as submitted.
///
/// Fields are kept as raw text so a bad value comes back next to the field
/// instead of failing the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "Enter a first name (at most 100 characters)"))]
    #[serde(default, deserialize_with = "empty_if_null")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Enter a last name (at most 100 characters)"))]
    #[serde(default, deserialize_with = "empty_if_null")]
    pub last_name: String,
    /// YYYY-MM-DD, blank for unknown
    #[serde(default)]
    pub date_of_birth: Option<String>,
    /// YYYY-MM-DD, blank for unknown
    #[serde(default)]
    pub date_of_death: Option<String>,
}

/// Author fields once the form has been validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Blank creation form
    pub fn blank(default_date_of_death: Option<NaiveDate>) -> Self {
        Self {
            date_of_death: default_date_of_death.map(format_date),
            ..Self::default()
        }
    }

    /// Validate the submitted fields into a record, or the errors per field
    pub fn clean(&self) -> Result<AuthorRecord, FieldErrors> {
        let mut errors = self
            .validate()
            .err()
            .map(|e| field_errors(&e))
            .unwrap_or_default();

        let date_of_birth = optional_date(&mut errors, "date_of_birth", self.date_of_birth.as_deref());
        let date_of_death = optional_date(&mut errors, "date_of_death", self.date_of_death.as_deref());

        if let (Some(born), Some(died)) = (date_of_birth, date_of_death) {
            if died < born {
                push_error(&mut errors, "date_of_death", "Date of death is before date of birth");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(AuthorRecord {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth,
            date_of_death,
        })
    }
}

impl From<&Author> for AuthorForm {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: author.date_of_birth.map(format_date),
            date_of_death: author.date_of_death.map(format_date),
        }
    }
}

/// Author form page (blank, pre-filled, or re-rendered with errors)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorFormPage {
    /// Set when editing an existing author
    pub author_id: Option<i32>,
    pub form: AuthorForm,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Delete confirmation page
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorDeletePage {
    pub author: Author,
    /// Books that will lose their author reference
    pub book_count: i64,
}

/// Operator console row
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAuthorRow {
    pub id: i32,
    pub last_name: String,
    pub first_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl From<Author> for AdminAuthorRow {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            last_name: a.last_name,
            first_name: a.first_name,
            date_of_birth: a.date_of_birth,
            date_of_death: a.date_of_death,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form(first: &str, last: &str, born: Option<&str>, died: Option<&str>) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: born.map(str::to_string),
            date_of_death: died.map(str::to_string),
        }
    }

    #[test]
    fn blank_form_prefills_date_of_death() {
        let form = AuthorForm::blank(Some(date(2018, 11, 11)));
        assert_eq!(form.date_of_death.as_deref(), Some("2018-11-11"));
        assert!(form.first_name.is_empty());
    }

    #[test]
    fn clean_reports_missing_names_and_reversed_dates() {
        let errors = form("", "Tolkien", Some("1892-01-03"), Some("1800-01-01"))
            .clean()
            .unwrap_err();
        assert!(errors.contains_key("first_name"));
        assert!(!errors.contains_key("last_name"));
        assert_eq!(errors["date_of_death"], vec!["Date of death is before date of birth"]);
    }

    #[test]
    fn valid_form_cleans_into_typed_dates() {
        let record = form("Ursula", "Le Guin", Some("1929-10-21"), Some(""))
            .clean()
            .unwrap();
        assert_eq!(record.date_of_birth, Some(date(1929, 10, 21)));
        assert_eq!(record.date_of_death, None);
    }

    #[test]
    fn garbled_date_is_reported_on_its_field() {
        let errors = form("Ada", "Lovelace", Some("10/12/1815"), None)
            .clean()
            .unwrap_err();
        assert_eq!(errors["date_of_birth"], vec!["Enter a valid date."]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn incomplete_submission_still_deserializes() {
        let form: AuthorForm = serde_json::from_value(serde_json::json!({
            "first_name": null,
            "date_of_birth": "10/12/1815"
        }))
        .unwrap();
        let errors = form.clean().unwrap_err();
        assert!(errors.contains_key("first_name"));
        assert!(errors.contains_key("last_name"));
        assert!(errors.contains_key("date_of_birth"));
    }

    #[test]
    fn display_name_is_last_comma_first() {
        let author = Author {
            id: 1,
            first_name: "Isaac".into(),
            last_name: "Asimov".into(),
            date_of_birth: Some(date(1920, 1, 2)),
            date_of_death: None,
        };
        assert_eq!(author.display_name(), "Asimov, Isaac");
        let form = AuthorForm::from(&author);
        assert_eq!(form.last_name, "Asimov");
        assert_eq!(form.date_of_birth.as_deref(), Some("1920-01-02"));
    }
}
