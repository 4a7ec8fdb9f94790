use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use super::{request, AppState};
use crate::models::{
    transactions::{ReviewRequest, Transaction},
    wallets::{DepositRequest, Wallet, WithdrawalReceipt, WithdrawalRequest},
};
use crate::services::{wallets::WalletRequest, ServiceError};

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    limit: Option<i64>,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Wallet>, ServiceError> {
    let wallet = request(&state.channels.wallets, "WalletService", |response| {
        WalletRequest::GetWallet { user_id, response }
    })
    .await?;

    Ok(Json(wallet))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ServiceError> {
    let Query(query) = query?;
    let transactions = request(&state.channels.wallets, "WalletService", |response| {
        WalletRequest::ListTransactions {
            user_id,
            limit: query.limit,
            response,
        }
    })
    .await?;

    Ok(Json(transactions))
}

pub async fn deposit(
    State(state): State<AppState>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ServiceError> {
    let Json(req) = payload?;
    let transaction = request(&state.channels.wallets, "WalletService", |response| {
        WalletRequest::Deposit {
            request: req,
            response,
        }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn withdraw(
    State(state): State<AppState>,
    payload: Result<Json<WithdrawalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WithdrawalReceipt>), ServiceError> {
    let Json(req) = payload?;
    let receipt = request(&state.channels.wallets, "WalletService", |response| {
        WalletRequest::Withdraw {
            request: req,
            response,
        }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn review_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<Transaction>, ServiceError> {
    state.authorize_admin(&headers)?;
    let Json(review) = payload?;

    let transaction = request(&state.channels.wallets, "WalletService", |response| {
        WalletRequest::ReviewTransaction {
            transaction_id,
            approve: review.approve,
            response,
        }
    })
    .await?;

    Ok(Json(transaction))
}
