use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use super::{request, AppState};
use crate::models::investments::{EarningsReport, EarningsRunRequest};
use crate::services::{earnings::EarningsRequest, ServiceError};

/// Invoked by the external cron. The body is optional and may pin the accrual date.
pub async fn calculate_earnings(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EarningsReport>, ServiceError> {
    state.authorize_cron(&headers)?;

    let run: EarningsRunRequest = if body.iter().all(u8::is_ascii_whitespace) {
        EarningsRunRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ServiceError::Validation(format!("Invalid request body: {}", e)))?
    };
    let date = run
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let report = request(&state.channels.earnings, "EarningsService", |response| {
        EarningsRequest::CalculateEarnings { date, response }
    })
    .await?;

    Ok(Json(report))
}
