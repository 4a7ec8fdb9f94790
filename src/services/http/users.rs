use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::{request, AppState};
use crate::models::{
    referrals::ReferralSummary,
    users::{NewUser, User},
};
use crate::services::{users::UserRequest, ServiceError};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let Json(user) = payload?;
    let user = request(&state.channels.users, "UserService", |response| {
        UserRequest::CreateUser { user, response }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ServiceError> {
    let user = request(&state.channels.users, "UserService", |response| {
        UserRequest::GetUser { id, response }
    })
    .await?;

    Ok(Json(user))
}

pub async fn get_referrals(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReferralSummary>, ServiceError> {
    let summary = request(&state.channels.users, "UserService", |response| {
        UserRequest::GetReferrals { id, response }
    })
    .await?;

    Ok(Json(summary))
}
