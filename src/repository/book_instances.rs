//! Book instances repository: copies, loans and renewals

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{AdminInstanceRow, BookInstanceInput},
        BookInstance, LoanStatus, LoanedInstance, PageRequest,
    },
};

const LOANED_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
           bi.status, bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// Filter for the console listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceCriteria {
    pub status: Option<LoanStatus>,
    pub due_back: Option<NaiveDate>,
}

/// Copy persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstancesStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;
    /// Copy joined with its title and borrower
    async fn get_loaned(&self, id: Uuid) -> AppResult<LoanedInstance>;
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    /// Copies on loan, soonest due first, optionally for a single borrower
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedInstance>, i64)>;
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
    async fn count(&self) -> AppResult<i64>;
    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64>;
    async fn count_for_book(&self, book_id: i32) -> AppResult<i64>;
    async fn create(&self, input: &BookInstanceInput) -> AppResult<BookInstance>;
    async fn update(&self, id: Uuid, input: &BookInstanceInput) -> AppResult<BookInstance>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn admin_rows(
        &self,
        criteria: InstanceCriteria,
        page: PageRequest,
    ) -> AppResult<(Vec<AdminInstanceRow>, i64)>;
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Book instance {} not found", id))
    }
}

#[async_trait]
impl BookInstancesStore for BookInstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn get_loaned(&self, id: Uuid) -> AppResult<LoanedInstance> {
        let query = format!("{} WHERE bi.id = $1", LOANED_SELECT);
        sqlx::query_as::<_, LoanedInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book_id = $1 ORDER BY due_back NULLS LAST, id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: PageRequest,
    ) -> AppResult<(Vec<LoanedInstance>, i64)> {
        // $2 IS NULL disables the borrower filter
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE status = $1 AND ($2::int4 IS NULL OR borrower_id = $2)",
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            r#"{}
            WHERE bi.status = $1 AND ($2::int4 IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT $3 OFFSET $4"#,
            LOANED_SELECT
        );
        let loans = sqlx::query_as::<_, LoanedInstance>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((loans, total))
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_for_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, input: &BookInstanceInput) -> AppResult<BookInstance> {
        let instance = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.book_id)
        .bind(&input.imprint)
        .bind(input.due_back)
        .bind(input.borrower_id)
        .bind(input.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(instance)
    }

    async fn update(&self, id: Uuid, input: &BookInstanceInput) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, borrower_id = $4, status = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(input.book_id)
        .bind(&input.imprint)
        .bind(input.due_back)
        .bind(input.borrower_id)
        .bind(input.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Self::not_found(id))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn admin_rows(
        &self,
        criteria: InstanceCriteria,
        page: PageRequest,
    ) -> AppResult<(Vec<AdminInstanceRow>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if criteria.status.is_some() {
            conditions.push(format!("bi.status = ${}", idx));
            idx += 1;
        }
        if criteria.due_back.is_some() {
            conditions.push(format!("bi.due_back = ${}", idx));
            idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM book_instances bi {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(status) = criteria.status {
            count_builder = count_builder.bind(status);
        }
        if let Some(due_back) = criteria.due_back {
            count_builder = count_builder.bind(due_back);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT b.title AS book, bi.status, u.username AS borrower, bi.due_back, bi.id
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            {}
            ORDER BY bi.due_back NULLS LAST, bi.id
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            idx,
            idx + 1
        );
        let mut builder = sqlx::query_as::<_, AdminInstanceRow>(&select_query);
        if let Some(status) = criteria.status {
            builder = builder.bind(status);
        }
        if let Some(due_back) = criteria.due_back {
            builder = builder.bind(due_back);
        }
        let rows = builder
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}
