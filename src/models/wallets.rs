use serde::{Deserialize, Serialize};

use super::{apply_bps, transactions::Transaction};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Wallet {
    pub user_id: String,
    pub balance: i64,
    pub invested_amount: i64,
    pub pending_withdrawal: i64,
    pub total_earnings: i64,
    pub updated_at: chrono::NaiveDateTime,
}

impl Wallet {
    pub fn can_cover(&self, amount: i64) -> bool {
        amount > 0 && self.balance >= amount
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DepositRequest {
    pub user_id: String,
    pub amount: i64,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub user_id: String,
    pub amount: i64,
    pub payment_method_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalReceipt {
    pub transaction: Transaction,
    pub fee: i64,
    pub net_amount: i64,
}

/// Signed changes applied to a wallet row in a single UPDATE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletDelta {
    pub balance: i64,
    pub invested_amount: i64,
    pub pending_withdrawal: i64,
    pub total_earnings: i64,
}

impl WalletDelta {
    pub fn is_zero(&self) -> bool {
        *self == WalletDelta::default()
    }

    /// Money paid out to the user as income (earnings, commissions, rewards).
    pub fn income(amount: i64) -> Self {
        WalletDelta {
            balance: amount,
            total_earnings: amount,
            ..Default::default()
        }
    }

    pub fn investment(amount: i64) -> Self {
        WalletDelta {
            balance: -amount,
            invested_amount: amount,
            ..Default::default()
        }
    }

    pub fn principal_return(profit: i64, principal: i64) -> Self {
        WalletDelta {
            balance: profit + principal,
            invested_amount: -principal,
            total_earnings: profit,
            ..Default::default()
        }
    }

    pub fn withdrawal_hold(amount: i64) -> Self {
        WalletDelta {
            balance: -amount,
            pending_withdrawal: amount,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletRejection {
    #[error("Wallet not found for user {0}")]
    WalletNotFound(String),
    #[error("Insufficient balance: {available} cents available")]
    InsufficientFunds { available: i64 },
    #[error("Transaction {0} not found")]
    TransactionNotFound(String),
    #[error("Transaction was already reviewed (status: {0})")]
    AlreadyReviewed(String),
    #[error("Transactions of kind {0} cannot be reviewed")]
    NotReviewable(String),
}

pub fn withdrawal_fee(amount: i64, fee_bps: i64) -> i64 {
    apply_bps(amount, fee_bps)
}

pub fn withdrawal_net_amount(amount: i64, fee_bps: i64) -> i64 {
    amount - withdrawal_fee(amount, fee_bps)
}
