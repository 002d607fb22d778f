//! Loan endpoints: borrowed listings, renewal, checkout and return

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstanceDetails, CheckoutRequest},
        renewal::{RenewBookRequest, RenewalForm, RenewalOutcome},
        ListQuery,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, API_PREFIX};

/// Listing shown after a successful renewal
pub const BORROWED_PATH: &str = "/borrowed";

/// Renewal confirmation
#[derive(Serialize, ToSchema)]
pub struct RenewalConfirmation {
    pub status: String,
    pub book_instance: BookInstanceDetails,
    pub redirect_to: String,
}

/// Copies on loan to the caller
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Caller's borrowed copies, soonest due first", body = PaginatedResponse<BookInstanceDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstanceDetails>>> {
    let (items, total) = state.services.loans.my_books(&claims, &query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// Every copy on loan
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All borrowed copies, soonest due first", body = Vec<BookInstanceDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn all_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookInstanceDetails>>> {
    let instances = state.services.loans.all_borrowed(&claims).await?;
    Ok(Json(instances))
}

/// Renewal form with the proposed date
#[utoipa::path(
    get,
    path = "/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    let form = state.services.loans.get_renewal_form(id, &claims).await?;
    Ok(Json(form))
}

/// Submit a new due-back date
#[utoipa::path(
    post,
    path = "/book/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewBookRequest,
    responses(
        (status = 200, description = "Loan renewed", body = RenewalConfirmation),
        (status = 400, description = "Body is not a JSON object"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Date missing, unparseable or outside the window; form returned with errors", body = RenewalForm)
    )
)]
pub async fn renew_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<RenewBookRequest>, JsonRejection>,
) -> AppResult<Response> {
    claims.require_can_mark_returned()?;
    let Json(request) = payload?;
    let outcome = state
        .services
        .loans
        .submit_renewal(id, &claims, request.renewal_date.as_deref())
        .await?;

    let response = match outcome {
        RenewalOutcome::Renewed(book_instance) => {
            let redirect_to = format!("{}{}", API_PREFIX, BORROWED_PATH);
            (
                StatusCode::OK,
                [(LOCATION, redirect_to.clone())],
                Json(RenewalConfirmation {
                    status: "renewed".to_string(),
                    book_instance,
                    redirect_to,
                }),
            )
                .into_response()
        }
        RenewalOutcome::Rejected(form) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(form)).into_response()
        }
    };

    Ok(response)
}

/// Lend an available copy
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/checkout",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Copy lent", body = BookInstanceDetails),
        (status = 400, description = "Unreadable body or due date outside the loan window"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Book instance or borrower not found"),
        (status = 422, description = "Copy not available")
    )
)]
pub async fn checkout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_can_mark_returned()?;
    let Json(request) = payload?;
    let instance = state.services.loans.checkout(id, &claims, request).await?;
    Ok(Json(instance))
}

/// Mark a copy as returned
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = BookInstanceDetails),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Book instance not found"),
        (status = 422, description = "Copy not on loan")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state.services.loans.mark_returned(id, &claims).await?;
    Ok(Json(instance))
}
