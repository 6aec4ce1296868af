//! Form handling shared by the mutation pages

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use validator::ValidationErrors;

/// Date format accepted by form fields and used when pre-filling them
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Message shown next to a date field that does not parse
pub const INVALID_DATE: &str = "Enter a valid date.";

/// Field-level error messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Result of submitting a form: either the saved entity or the errors to
/// show next to each field.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Saved(T),
    Invalid(FieldErrors),
}

impl<T> FormOutcome<T> {
    pub fn is_saved(&self) -> bool {
        matches!(self, FormOutcome::Saved(_))
    }
}

/// Flatten `validator` errors into per-field messages
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect::<Vec<_>>();
        out.entry(field.to_string()).or_default().extend(messages);
    }
    out
}

/// Append a message to a field
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Parse a `YYYY-MM-DD` form value
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Read an optional date field. Blank means no date; anything that does not
/// parse is reported against `field` and read as no date.
pub fn optional_date(errors: &mut FieldErrors, field: &str, input: Option<&str>) -> Option<NaiveDate> {
    let raw = input.map(str::trim).filter(|s| !s.is_empty())?;
    let date = parse_date(raw);
    if date.is_none() {
        push_error(errors, field, INVALID_DATE);
    }
    date
}

/// Text fields submitted as `null` read as empty, like a missing field
pub fn empty_if_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Required"))]
        name: String,
    }

    #[test]
    fn collects_messages_per_field() {
        let errors = Sample { name: String::new() }.validate().unwrap_err();
        let mut fields = field_errors(&errors);
        push_error(&mut fields, "name", "Another");
        assert_eq!(fields["name"], vec!["Required".to_string(), "Another".to_string()]);
    }

    #[test]
    fn optional_date_reads_blank_as_none_and_flags_garbage() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_date(&mut errors, "born", None), None);
        assert_eq!(optional_date(&mut errors, "born", Some("  ")), None);
        assert!(errors.is_empty());

        assert_eq!(
            optional_date(&mut errors, "born", Some("1815-12-10")),
            NaiveDate::from_ymd_opt(1815, 12, 10)
        );
        assert_eq!(optional_date(&mut errors, "born", Some("10/12/1815")), None);
        assert_eq!(errors["born"], vec![INVALID_DATE.to_string()]);
    }
}
