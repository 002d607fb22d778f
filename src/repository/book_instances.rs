//! Book instances (physical copies) repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceRow, LoanStatus},
};

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back, bi.status,
           bi.borrower_id, u.login AS borrower_login,
           u.first_name AS borrower_first_name, u.last_name AS borrower_last_name
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a copy with its book title and borrower
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceRow> {
        let query = format!("{} WHERE bi.id = $1", INSTANCE_SELECT);
        sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Copies of a book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!("{} WHERE bi.book_id = $1 ORDER BY bi.imprint, bi.id", INSTANCE_SELECT);
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// All copies on loan, soonest due first
    pub async fn list_on_loan(&self) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!(
            "{} WHERE bi.status = $1 ORDER BY bi.due_back ASC, bi.id",
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(LoanStatus::OnLoan)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn list_on_loan_for_borrower(
        &self,
        borrower_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstanceRow>, i64)> {
        let query = format!(
            "{} WHERE bi.status = $1 AND bi.borrower_id = $2 ORDER BY bi.due_back ASC, bi.id LIMIT $3 OFFSET $4",
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE status = $1 AND borrower_id = $2",
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn create(
        &self,
        book_id: i32,
        imprint: &str,
        status: LoanStatus,
    ) -> AppResult<BookInstance> {
        let instance = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, book_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(imprint)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(instance)
    }

    /// Set the due-back date of a copy
    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Lend an available copy. Returns false if the copy was not available.
    pub async fn checkout(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET status = $1, borrower_id = $2, due_back = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(due_back)
        .bind(id)
        .bind(LoanStatus::Available)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Put a copy on loan back on the shelf. Returns false if it was not on loan.
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET status = $1, borrower_id = NULL, due_back = NULL
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(LoanStatus::Available)
        .bind(id)
        .bind(LoanStatus::OnLoan)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
