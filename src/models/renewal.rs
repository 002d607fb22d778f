//! Loan renewal rule and form types
//!
//! A librarian may move a copy's due-back date to any day from today up to
//! four weeks ahead, both bounds included. The form proposes three weeks.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::book_instance::BookInstanceDetails;

pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;
pub const MAX_RENEWAL_WEEKS: i64 = 4;

/// Field name used for renewal date errors
pub const RENEWAL_DATE_FIELD: &str = "renewal_date";

/// Format accepted for submitted dates
pub const RENEWAL_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("This field is required.")]
    Missing,
    #[error("Enter a valid date.")]
    Malformed,
    #[error("invalid date - renewal in past")]
    InPast,
    #[error("invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Date proposed when the renewal form is first shown
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// Latest accepted renewal date
pub fn latest_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(MAX_RENEWAL_WEEKS)
}

pub fn validate_renewal_date(
    proposed: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if proposed < today {
        return Err(RenewalDateError::InPast);
    }
    if proposed > latest_renewal_date(today) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(proposed)
}

/// Parse a submitted form value, then apply the renewal window
pub fn check_submitted_date(
    submitted: Option<&str>,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    let raw = submitted
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(RenewalDateError::Missing)?;
    let proposed = NaiveDate::parse_from_str(raw, RENEWAL_DATE_FORMAT)
        .map_err(|_| RenewalDateError::Malformed)?;

    validate_renewal_date(proposed, today)
}

/// Renewal form, either freshly proposed or echoed back with errors
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: BookInstanceDetails,
    /// Proposed date, or the value as submitted when rejected
    pub renewal_date: String,
    /// Field name to messages; empty when the form is valid
    pub errors: BTreeMap<String, Vec<String>>,
}

impl RenewalForm {
    pub fn proposed(book_instance: BookInstanceDetails, today: NaiveDate) -> Self {
        Self {
            book_instance,
            renewal_date: default_renewal_date(today).format(RENEWAL_DATE_FORMAT).to_string(),
            errors: BTreeMap::new(),
        }
    }

    pub fn rejected(
        book_instance: BookInstanceDetails,
        submitted: &str,
        error: RenewalDateError,
    ) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(RENEWAL_DATE_FIELD.to_string(), vec![error.to_string()]);
        Self {
            book_instance,
            renewal_date: submitted.to_string(),
            errors,
        }
    }
}

/// Renewal form submission
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewBookRequest {
    /// New due-back date (YYYY-MM-DD); checked by the renewal workflow
    #[serde(default)]
    pub renewal_date: Option<String>,
}

/// Result of a renewal submission
#[derive(Debug, Clone)]
pub enum RenewalOutcome {
    /// Due-back date persisted
    Renewed(BookInstanceDetails),
    /// Nothing persisted; form to show again
    Rejected(RenewalForm),
}
