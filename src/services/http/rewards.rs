use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{request, AppState};
use crate::models::rewards::{DailyReward, RewardStatus};
use crate::services::{rewards::RewardRequest, ServiceError};

pub async fn claim_reward(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<DailyReward>), ServiceError> {
    let today = chrono::Utc::now().date_naive();
    let reward = request(&state.channels.rewards, "RewardService", |response| {
        RewardRequest::Claim {
            user_id,
            today,
            response,
        }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(reward)))
}

pub async fn reward_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<RewardStatus>, ServiceError> {
    let today = chrono::Utc::now().date_naive();
    let status = request(&state.channels.rewards, "RewardService", |response| {
        RewardRequest::Status {
            user_id,
            today,
            response,
        }
    })
    .await?;

    Ok(Json(status))
}
