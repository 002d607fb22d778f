//! User account endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{error::AppResult, models::user::CreateUser};

use super::{auth::UserInfo, AuthenticatedUser};

/// Register a patron or staff account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Login already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    claims.require_can_mark_returned()?;
    let Json(input) = payload?;
    input.validate()?;

    let created = state.services.auth.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(UserInfo::from(created))))
}
