use axum::extract::State;

use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::dashboard_service::{self, DashboardStats};
use crate::AppState;

pub async fn stats(State(state): State<AppState>) -> AppResult<ApiResponse<DashboardStats>> {
    let mut conn = state.db.get()?;
    let stats = dashboard_service::stats(&mut conn)?;
    Ok(ApiResponse::ok("Dashboard stats retrieved successfully", stats))
}
