//! Book instance (physical, loanable copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::BorrowerShort;

/// Loan status of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion through the one-letter code
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
        s.trim().parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Book instance record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    /// Only meaningful while the copy is on loan
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

/// Internal row structure for instance queries joined with book and borrower
#[derive(Debug, Clone, FromRow)]
pub struct BookInstanceRow {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_login: Option<String>,
    pub borrower_first_name: Option<String>,
    pub borrower_last_name: Option<String>,
}

impl BookInstanceRow {
    pub fn into_details(self, today: NaiveDate) -> BookInstanceDetails {
        let is_overdue = self.due_back.map_or(false, |due| due < today);
        let borrower = match (self.borrower_id, self.borrower_login) {
            (Some(id), Some(login)) => Some(BorrowerShort {
                id,
                login,
                first_name: self.borrower_first_name,
                last_name: self.borrower_last_name,
            }),
            _ => None,
        };

        BookInstanceDetails {
            id: self.id,
            book_id: self.book_id,
            book_title: self.book_title,
            imprint: self.imprint,
            due_back: self.due_back,
            status: self.status,
            borrower,
            is_overdue,
        }
    }
}

/// Book instance with display data for listings and forms
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower: Option<BorrowerShort>,
    pub is_overdue: bool,
}

/// Acquire a new copy of a book
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookInstance {
    pub imprint: String,
    pub status: Option<LoanStatus>,
}

/// Lend a copy to a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub borrower_id: i32,
    /// Defaults to three weeks from today
    pub due_back: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(due_back: Option<NaiveDate>) -> BookInstanceRow {
        BookInstanceRow {
            id: Uuid::new_v4(),
            book_id: 7,
            book_title: "Solaris".into(),
            imprint: "Faber, 1970".into(),
            due_back,
            status: LoanStatus::OnLoan,
            borrower_id: Some(3),
            borrower_login: Some("patron".into()),
            borrower_first_name: None,
            borrower_last_name: None,
        }
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.code().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        assert_eq!(serde_json::to_value(LoanStatus::OnLoan).unwrap(), "on_loan");
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }

    #[test]
    fn overdue_only_when_due_date_has_passed() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let yesterday = today.pred_opt().unwrap();

        assert!(row(Some(yesterday)).into_details(today).is_overdue);
        assert!(!row(Some(today)).into_details(today).is_overdue);
        assert!(!row(None).into_details(today).is_overdue);
    }

    #[test]
    fn borrower_is_attached_when_joined() {
        let details = row(None).into_details(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let borrower = details.borrower.unwrap();
        assert_eq!(borrower.id, 3);
        assert_eq!(borrower.login, "patron");
    }
}
