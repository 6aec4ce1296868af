//! Book instance (physical copy) model, loan status and renewal rules

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::form::{field_errors, parse_date, push_error, FieldErrors, INVALID_DATE};

/// Loan status of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    /// Database code
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    /// Accepts the code, the snake_case name or the label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        LoanStatus::ALL
            .into_iter()
            .find(|st| {
                st.code() == wanted
                    || st.label().to_lowercase() == wanted
                    || st.label().to_lowercase().replace(' ', "_") == wanted
            })
            .ok_or_else(|| format!("Invalid loan status: {}", s))
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.code().to_string(), buf)
    }
}

/// Physical copy of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_back.map(|d| d < today).unwrap_or(false)
    }

    /// A copy is on loan exactly when someone borrows it.
    ///
    /// The store does not enforce this; rows written outside the console
    /// may break it.
    pub fn loan_state_consistent(&self) -> bool {
        (self.status == LoanStatus::OnLoan) == self.borrower_id.is_some()
    }
}

/// Copy joined with its book title and borrower, as shown in loan lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanedInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    /// Set by the service from the date it serves the request on
    #[sqlx(default)]
    pub is_overdue: bool,
}

impl LoanedInstance {
    /// Flag the copy as overdue when it is on loan past its due date
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.is_overdue =
            self.status == LoanStatus::OnLoan && self.due_back.map(|d| d < today).unwrap_or(false);
        self
    }
}

/// Renewal date proposed on a fresh renewal form
pub fn proposed_renewal_date(today: NaiveDate, weeks: i64) -> NaiveDate {
    today + Duration::weeks(weeks)
}

/// Check a submitted renewal date: not in the past and not more than
/// `max_weeks` ahead of `today` (inclusive).
pub fn validate_renewal_date(
    input: Option<&str>,
    today: NaiveDate,
    max_weeks: i64,
) -> Result<NaiveDate, FieldErrors> {
    let mut errors = FieldErrors::new();

    let Some(date) = input.and_then(parse_date) else {
        push_error(&mut errors, "renewal_date", INVALID_DATE);
        return Err(errors);
    };

    if date < today {
        push_error(&mut errors, "renewal_date", "Invalid date - renewal in past");
    }
    if date > today + Duration::weeks(max_weeks) {
        push_error(
            &mut errors,
            "renewal_date",
            format!("Invalid date - renewal more than {} weeks ahead", max_weeks),
        );
    }

    if errors.is_empty() {
        Ok(date)
    } else {
        Err(errors)
    }
}

/// Renewal form submission
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RenewForm {
    /// New due date (YYYY-MM-DD)
    pub renewal_date: Option<String>,
}

/// Renewal form page
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewFormPage {
    pub instance: LoanedInstance,
    pub renewal_date: Option<String>,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// Console create/update request for a copy
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookInstanceInput {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Enter an imprint (at most 200 characters)"))]
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl BookInstanceInput {
    /// Field checks, including the borrower/status pairing
    pub fn check(&self) -> FieldErrors {
        let mut errors = self
            .validate()
            .err()
            .map(|e| field_errors(&e))
            .unwrap_or_default();

        if self.due_back.is_some() && self.status != LoanStatus::OnLoan {
            push_error(&mut errors, "due_back", "Only a copy on loan has a due date");
        }

        match (self.status, self.borrower_id) {
            (LoanStatus::OnLoan, None) => {
                push_error(&mut errors, "borrower_id", "A copy on loan needs a borrower");
            }
            (status, Some(_)) if status != LoanStatus::OnLoan => {
                push_error(&mut errors, "borrower_id", "Only a copy on loan can have a borrower");
            }
            _ => {}
        }
        errors
    }
}

/// Console filter for copies
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InstanceFilter {
    /// Status code or name (m, on_loan, Available, ...)
    pub status: Option<String>,
    /// Exact due date (YYYY-MM-DD)
    pub due_back: Option<NaiveDate>,
    pub page: Option<i64>,
}

/// Console row
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminInstanceRow {
    pub book: String,
    pub status: LoanStatus,
    pub borrower: Option<String>,
    pub due_back: Option<NaiveDate>,
    pub id: Uuid,
}

/// Console detail, grouped into identification and availability
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminInstanceDetail {
    pub identification: InstanceIdentification,
    pub availability: InstanceAvailability,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstanceIdentification {
    pub book: String,
    pub imprint: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstanceAvailability {
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower: Option<String>,
}

impl From<LoanedInstance> for AdminInstanceDetail {
    fn from(i: LoanedInstance) -> Self {
        Self {
            identification: InstanceIdentification {
                book: i.book_title,
                imprint: i.imprint,
                id: i.id,
            },
            availability: InstanceAvailability {
                status: i.status,
                due_back: i.due_back,
                borrower: i.borrower_username,
            },
        }
    }
}
