use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::{request, AppState};
use crate::models::investments::{InvestRequest, Investment, InvestmentReceipt};
use crate::services::{investments::InvestmentRequest, ServiceError};

pub async fn invest(
    State(state): State<AppState>,
    payload: Result<Json<InvestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InvestmentReceipt>), ServiceError> {
    let Json(req) = payload?;
    let receipt = request(&state.channels.investments, "InvestmentService", |response| {
        InvestmentRequest::Invest {
            request: req,
            response,
        }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_investments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Investment>>, ServiceError> {
    let investments = request(&state.channels.investments, "InvestmentService", |response| {
        InvestmentRequest::ListInvestments { user_id, response }
    })
    .await?;

    Ok(Json(investments))
}

pub async fn get_investment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Investment>, ServiceError> {
    let investment = request(&state.channels.investments, "InvestmentService", |response| {
        InvestmentRequest::GetInvestment { id, response }
    })
    .await?;

    Ok(Json(investment))
}
