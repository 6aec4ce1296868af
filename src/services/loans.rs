//! Loan desk service: borrowed copies and renewals

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::{
        book_instance::{proposed_renewal_date, validate_renewal_date, RenewForm, RenewFormPage},
        form::{format_date, push_error},
        FieldErrors, FormOutcome, LoanStatus, LoanedInstance, Page, PageRequest,
    },
    repository::BookInstancesStore,
};

#[derive(Clone)]
pub struct LoansService {
    instances: Arc<dyn BookInstancesStore>,
    config: LoansConfig,
    page_size: i64,
}

impl LoansService {
    pub fn new(instances: Arc<dyn BookInstancesStore>, config: LoansConfig, page_size: i64) -> Self {
        Self {
            instances,
            config,
            page_size,
        }
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn loans_for_user(
        &self,
        user_id: i32,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<LoanedInstance>> {
        self.on_loan(Some(user_id), page, today).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_loans(&self, page: Option<i64>, today: NaiveDate) -> AppResult<Page<LoanedInstance>> {
        self.on_loan(None, page, today).await
    }

    async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<LoanedInstance>> {
        let request = PageRequest::new(page, self.page_size);
        let (loans, total) = self.instances.list_on_loan(borrower_id, request).await?;
        let loans = loans.into_iter().map(|l| l.as_of(today)).collect();
        Page::build(loans, total, request)
    }

    /// Renewal form with the default proposal
    pub async fn renewal_form(&self, id: Uuid, today: NaiveDate) -> AppResult<RenewFormPage> {
        let instance = self.instances.get_loaned(id).await?.as_of(today);
        let proposal = proposed_renewal_date(today, self.config.renewal_weeks);
        Ok(RenewFormPage {
            instance,
            renewal_date: Some(format_date(proposal)),
            errors: FieldErrors::new(),
        })
    }

    /// Validate and store a new due date. Invalid dates leave the copy
    /// untouched and come back as field errors.
    pub async fn renew(
        &self,
        id: Uuid,
        form: &RenewForm,
        today: NaiveDate,
    ) -> AppResult<FormOutcome<NaiveDate>> {
        // 404 before validation, like the GET form
        let instance = self.instances.get_loaned(id).await?;

        if instance.status != LoanStatus::OnLoan {
            let mut errors = FieldErrors::new();
            push_error(&mut errors, "renewal_date", "Only a copy on loan can be renewed");
            tracing::warn!("Refusing to renew book instance {} with status {}", id, instance.status);
            return Ok(FormOutcome::Invalid(errors));
        }

        match validate_renewal_date(form.renewal_date.as_deref(), today, self.config.max_renewal_weeks) {
            Ok(due_back) => {
                self.instances.set_due_back(id, due_back).await?;
                tracing::info!(
                    "Renewed book instance {} ({}) until {}",
                    id,
                    instance.book_title,
                    due_back
                );
                Ok(FormOutcome::Saved(due_back))
            }
            Err(errors) => {
                tracing::debug!("Rejected renewal of {}: {:?}", id, errors);
                Ok(FormOutcome::Invalid(errors))
            }
        }
    }

    /// Form page re-rendered after a rejected submission
    pub async fn rejected_renewal_form(
        &self,
        id: Uuid,
        form: RenewForm,
        errors: FieldErrors,
        today: NaiveDate,
    ) -> AppResult<RenewFormPage> {
        let instance = self.instances.get_loaned(id).await?.as_of(today);
        Ok(RenewFormPage {
            instance,
            renewal_date: form.renewal_date,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, repository::book_instances::MockBookInstancesStore};
    use chrono::Duration;
    use mockall::predicate::eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn loaned(id: Uuid, due_back: NaiveDate, borrower_id: i32) -> LoanedInstance {
        LoanedInstance {
            id,
            book_id: 1,
            book_title: "The Left Hand of Darkness".into(),
            imprint: "Ace".into(),
            due_back: Some(due_back),
            status: LoanStatus::OnLoan,
            borrower_id: Some(borrower_id),
            borrower_username: Some("reader".into()),
            is_overdue: false,
        }
    }

    fn service(store: MockBookInstancesStore) -> LoansService {
        LoansService::new(Arc::new(store), LoansConfig::default(), 10)
    }

    #[tokio::test]
    async fn renewal_form_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstancesStore::new();
        store
            .expect_get_loaned()
            .with(eq(id))
            .returning(move |id| Ok(loaned(id, today(), 1)));

        let page = service(store).renewal_form(id, today()).await.unwrap();
        assert_eq!(page.renewal_date.as_deref(), Some("2024-05-22"));
        assert!(page.errors.is_empty());
    }

    #[tokio::test]
    async fn renewal_of_unknown_copy_is_not_found() {
        let mut store = MockBookInstancesStore::new();
        store
            .expect_get_loaned()
            .returning(|id| Err(AppError::NotFound(format!("Book instance {} not found", id))));
        store.expect_set_due_back().never();

        let form = RenewForm {
            renewal_date: Some("2024-05-10".into()),
        };
        let result = service(store).renew(Uuid::new_v4(), &form, today()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn copy_not_on_loan_cannot_be_renewed() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstancesStore::new();
        store.expect_get_loaned().returning(move |id| {
            Ok(LoanedInstance {
                status: LoanStatus::Available,
                borrower_id: None,
                borrower_username: None,
                due_back: None,
                ..loaned(id, today(), 1)
            })
        });
        store.expect_set_due_back().never();

        let form = RenewForm {
            renewal_date: Some("2024-05-10".into()),
        };
        match service(store).renew(id, &form, today()).await.unwrap() {
            FormOutcome::Invalid(errors) => {
                assert_eq!(errors["renewal_date"], vec!["Only a copy on loan can be renewed"]);
            }
            FormOutcome::Saved(_) => panic!("available copy must not be renewed"),
        }
    }

    #[tokio::test]
    async fn loan_lists_flag_overdue_against_today() {
        let mut store = MockBookInstancesStore::new();
        store.expect_list_on_loan().returning(|_, _| {
            Ok((
                vec![
                    loaned(Uuid::new_v4(), today() - Duration::days(1), 7),
                    loaned(Uuid::new_v4(), today(), 7),
                ],
                2,
            ))
        });

        let page = service(store).all_loans(None, today()).await.unwrap();
        let flags: Vec<bool> = page.items.iter().map(|l| l.is_overdue).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[tokio::test]
    async fn past_renewal_is_rejected_without_writing() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstancesStore::new();
        store.expect_get_loaned().returning(move |id| Ok(loaned(id, today(), 1)));
        store.expect_set_due_back().never();

        let form = RenewForm {
            renewal_date: Some("2024-04-30".into()),
        };
        match service(store).renew(id, &form, today()).await.unwrap() {
            FormOutcome::Invalid(errors) => {
                assert_eq!(errors["renewal_date"], vec!["Invalid date - renewal in past"]);
            }
            FormOutcome::Saved(_) => panic!("past date must be rejected"),
        }
    }

    #[tokio::test]
    async fn three_week_renewal_is_stored_exactly() {
        let id = Uuid::new_v4();
        let expected = today() + Duration::weeks(3);
        let mut store = MockBookInstancesStore::new();
        store.expect_get_loaned().returning(move |id| Ok(loaned(id, today(), 1)));
        store
            .expect_set_due_back()
            .with(eq(id), eq(expected))
            .times(1)
            .returning(|_, _| Ok(()));

        let form = RenewForm {
            renewal_date: Some(expected.format("%Y-%m-%d").to_string()),
        };
        let outcome = service(store).renew(id, &form, today()).await.unwrap();
        assert!(matches!(outcome, FormOutcome::Saved(d) if d == expected));
    }

    #[tokio::test]
    async fn renewal_beyond_four_weeks_is_rejected() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstancesStore::new();
        store.expect_get_loaned().returning(move |id| Ok(loaned(id, today(), 1)));
        store.expect_set_due_back().never();

        let form = RenewForm {
            renewal_date: Some((today() + Duration::weeks(4) + Duration::days(1)).to_string()),
        };
        let outcome = service(store).renew(id, &form, today()).await.unwrap();
        assert!(!outcome.is_saved());
    }

    #[tokio::test]
    async fn my_loans_filter_on_the_caller() {
        let mut store = MockBookInstancesStore::new();
        store
            .expect_list_on_loan()
            .withf(|borrower, page| *borrower == Some(7) && page.page == 1 && page.per_page == 10)
            .returning(|_, _| {
                let early = loaned(Uuid::new_v4(), today(), 7);
                let late = loaned(Uuid::new_v4(), today() + Duration::days(5), 7);
                Ok((vec![early, late], 2))
            });

        let page = service(store).loans_for_user(7, None, today()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page
            .items
            .iter()
            .all(|l| l.borrower_id == Some(7) && l.status == LoanStatus::OnLoan));
        assert!(page.items.windows(2).all(|w| w[0].due_back <= w[1].due_back));
    }

    #[tokio::test]
    async fn all_loans_do_not_filter_on_borrower() {
        let mut store = MockBookInstancesStore::new();
        store
            .expect_list_on_loan()
            .withf(|borrower, _| borrower.is_none())
            .times(1)
            .returning(|_, _| Ok((Vec::new(), 0)));

        let page = service(store).all_loans(Some(1), today()).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.num_pages, 1);
    }
}
