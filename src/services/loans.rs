//! Loan service: borrowed listings, renewal workflow, checkout and return

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstanceDetails, CheckoutRequest},
        renewal::{
            check_submitted_date, default_renewal_date, validate_renewal_date, RenewalForm,
            RenewalOutcome,
        },
        user::UserClaims,
        ListQuery,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to the caller, soonest due first
    pub async fn my_books(
        &self,
        caller: &UserClaims,
        query: &ListQuery,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let (rows, total) = self
            .repository
            .book_instances
            .list_on_loan_for_borrower(caller.user_id, query.offset(), query.per_page())
            .await?;

        let today = super::today();
        Ok((rows.into_iter().map(|r| r.into_details(today)).collect(), total))
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, caller: &UserClaims) -> AppResult<Vec<BookInstanceDetails>> {
        caller.require_can_mark_returned()?;

        let today = super::today();
        let rows = self.repository.book_instances.list_on_loan().await?;
        Ok(rows.into_iter().map(|r| r.into_details(today)).collect())
    }

    // =========================================================================
    // RENEWAL
    // =========================================================================

    /// Renewal form proposing the default date
    pub async fn get_renewal_form(
        &self,
        instance_id: Uuid,
        caller: &UserClaims,
    ) -> AppResult<RenewalForm> {
        caller.require_can_mark_returned()?;

        let today = super::today();
        let instance = self.repository.book_instances.get_by_id(instance_id).await?;
        Ok(RenewalForm::proposed(instance.into_details(today), today))
    }

    /// Validate and persist a new due-back date.
    ///
    /// Permission is checked before the copy is looked up. A missing,
    /// unparseable or out-of-range date is not an error: it yields
    /// [`RenewalOutcome::Rejected`] with the submitted value, and nothing is
    /// written.
    pub async fn submit_renewal(
        &self,
        instance_id: Uuid,
        caller: &UserClaims,
        submitted: Option<&str>,
    ) -> AppResult<RenewalOutcome> {
        caller.require_can_mark_returned()?;

        let today = super::today();
        let instance = self
            .repository
            .book_instances
            .get_by_id(instance_id)
            .await?
            .into_details(today);

        let due_back = match check_submitted_date(submitted, today) {
            Ok(date) => date,
            Err(reason) => {
                tracing::info!(%instance_id, ?submitted, %reason, "Renewal rejected");
                return Ok(RenewalOutcome::Rejected(RenewalForm::rejected(
                    instance,
                    submitted.unwrap_or_default(),
                    reason,
                )));
            }
        };

        self.repository
            .book_instances
            .set_due_back(instance_id, due_back)
            .await?;

        tracing::info!(
            %instance_id,
            user_id = caller.user_id,
            previous = ?instance.due_back,
            %due_back,
            "Loan renewed"
        );

        Ok(RenewalOutcome::Renewed(BookInstanceDetails {
            due_back: Some(due_back),
            is_overdue: false,
            ..instance
        }))
    }

    // =========================================================================
    // CHECKOUT / RETURN
    // =========================================================================

    /// Lend an available copy
    pub async fn checkout(
        &self,
        instance_id: Uuid,
        caller: &UserClaims,
        request: CheckoutRequest,
    ) -> AppResult<BookInstanceDetails> {
        caller.require_can_mark_returned()?;

        let current = self.repository.book_instances.get_by_id(instance_id).await?;
        if !self.repository.users.exists(request.borrower_id).await? {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                request.borrower_id
            )));
        }

        let today = super::today();
        let due_back = match request.due_back {
            Some(date) => validate_renewal_date(date, today)
                .map_err(|e| AppError::Validation(e.to_string()))?,
            None => default_renewal_date(today),
        };

        let lent = self
            .repository
            .book_instances
            .checkout(instance_id, request.borrower_id, due_back)
            .await?;
        if !lent {
            return Err(AppError::BusinessRule(format!(
                "Book instance is not available ({})",
                current.status
            )));
        }

        tracing::info!(%instance_id, borrower_id = request.borrower_id, %due_back, "Book instance lent");

        let row = self.repository.book_instances.get_by_id(instance_id).await?;
        Ok(row.into_details(today))
    }

    /// Mark a copy on loan as returned
    pub async fn mark_returned(
        &self,
        instance_id: Uuid,
        caller: &UserClaims,
    ) -> AppResult<BookInstanceDetails> {
        caller.require_can_mark_returned()?;

        let current = self.repository.book_instances.get_by_id(instance_id).await?;
        if !self.repository.book_instances.mark_returned(instance_id).await? {
            return Err(AppError::BusinessRule(format!(
                "Book instance is not on loan ({})",
                current.status
            )));
        }

        tracing::info!(%instance_id, user_id = caller.user_id, "Book instance returned");

        let row = self.repository.book_instances.get_by_id(instance_id).await?;
        Ok(row.into_details(super::today()))
    }
}
