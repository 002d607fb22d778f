//! Dashboard endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::catalog::CatalogCounts};

/// Cookie holding the per-session visit counter
pub const VISITS_COOKIE: &str = "num_visits";

/// Dashboard counters
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits in this session before the current one
    pub num_visits: u64,
}

/// Visits recorded in the cookie; absent or garbled counts as zero
pub fn visits_from(jar: &CookieJar) -> u64 {
    jar.get(VISITS_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
        .unwrap_or(0)
}

/// Catalog dashboard
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counters", body = DashboardResponse)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<DashboardResponse>)> {
    let counts = state.services.catalog.counts().await?;
    let num_visits = visits_from(&jar);

    let visit = Cookie::build((VISITS_COOKIE, num_visits.saturating_add(1).to_string()))
        .path("/")
        .http_only(true);

    Ok((jar.add(visit), Json(DashboardResponse { counts, num_visits })))
}
