//! Loan endpoints: borrowed copies and renewals

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{RenewForm, RenewFormPage},
        user::CAN_MARK_RETURNED,
        FormOutcome, LoanedInstance, Page, PageQuery,
    },
    AppState,
};

use super::{location, FormResponse, LoginRequired};

/// Copies on loan to the current user, soonest due first
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's loans", body = Page<LoanedInstance>),
        (status = 303, description = "Login required")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    LoginRequired(claims): LoginRequired,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanedInstance>>> {
    let today = chrono::Local::now().date_naive();
    let page = state
        .services
        .loans
        .loans_for_user(claims.user_id, query.page, today)
        .await?;
    Ok(Json(page))
}

/// Every copy on loan, soonest due first
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans with borrowers", body = Page<LoanedInstance>),
        (status = 303, description = "Login required"),
        (status = 403, description = "Missing can_mark_returned permission")
    )
)]
pub async fn all_loans(
    State(state): State<AppState>,
    LoginRequired(claims): LoginRequired,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanedInstance>>> {
    claims.require_permission(CAN_MARK_RETURNED)?;

    let today = chrono::Local::now().date_naive();
    let page = state.services.loans.all_loans(query.page, today).await?;
    Ok(Json(page))
}

/// Renewal form with a proposed date three weeks out
#[utoipa::path(
    get,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewFormPage),
        (status = 303, description = "Login required"),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_form(
    State(state): State<AppState>,
    LoginRequired(claims): LoginRequired,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewFormPage>> {
    claims.require_permission(CAN_MARK_RETURNED)?;

    let today = chrono::Local::now().date_naive();
    let page = state.services.loans.renewal_form(id, today).await?;
    Ok(Json(page))
}

/// Set a new due date
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewForm,
    responses(
        (status = 303, description = "Renewed, redirect to all loans"),
        (status = 200, description = "Form with field errors", body = RenewFormPage),
        (status = 403, description = "Missing can_mark_returned permission"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    LoginRequired(claims): LoginRequired,
    Path(id): Path<Uuid>,
    Json(form): Json<RenewForm>,
) -> AppResult<FormResponse<RenewFormPage>> {
    claims.require_permission(CAN_MARK_RETURNED)?;

    let today = chrono::Local::now().date_naive();
    match state.services.loans.renew(id, &form, today).await? {
        FormOutcome::Saved(_) => Ok(FormResponse::Redirect(location("/loans"))),
        FormOutcome::Invalid(errors) => {
            let page = state
                .services
                .loans
                .rejected_renewal_form(id, form, errors, today)
                .await?;
            Ok(FormResponse::Invalid(page))
        }
    }
}
