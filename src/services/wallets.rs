use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::{
        transactions::{ReviewDecision, Transaction},
        wallets::{
            withdrawal_fee, withdrawal_net_amount, DepositRequest, Wallet, WithdrawalReceipt,
            WithdrawalRequest,
        },
    },
    repositories::{transactions::TransactionRepository, wallets::WalletRepository},
    settings::Withdrawals,
};

pub const DEFAULT_TRANSACTION_LIMIT: i64 = 50;
pub const MAX_TRANSACTION_LIMIT: i64 = 100;

pub enum WalletRequest {
    GetWallet {
        user_id: String,
        response: oneshot::Sender<Result<Wallet, ServiceError>>,
    },
    Deposit {
        request: DepositRequest,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    Withdraw {
        request: WithdrawalRequest,
        response: oneshot::Sender<Result<WithdrawalReceipt, ServiceError>>,
    },
    ReviewTransaction {
        transaction_id: String,
        approve: bool,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    ListTransactions {
        user_id: String,
        limit: Option<i64>,
        response: oneshot::Sender<Result<Vec<Transaction>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct WalletRequestHandler {
    repository: WalletRepository,
    transactions: TransactionRepository,
    withdrawals: Withdrawals,
}

impl WalletRequestHandler {
    pub fn new(sql_conn: PgPool, withdrawals: Withdrawals) -> Self {
        WalletRequestHandler {
            repository: WalletRepository::new(sql_conn.clone()),
            transactions: TransactionRepository::new(sql_conn),
            withdrawals,
        }
    }

    async fn get_wallet(&self, user_id: &str) -> Result<Wallet, ServiceError> {
        self.repository
            .get_wallet(user_id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Wallet for user {}", user_id)))
    }

    async fn deposit(&self, request: DepositRequest) -> Result<Transaction, ServiceError> {
        if request.amount <= 0 {
            return Err(ServiceError::Validation(
                "Deposit amount must be positive".to_string(),
            ));
        }
        let wallet = self.get_wallet(&request.user_id).await?;

        let transaction = self
            .repository
            .request_deposit(&wallet.user_id, request.amount, request.reference.as_deref())
            .await
            .map_err(repository_error)?;

        log::info!(
            "Deposit {} of {} requested by {}.",
            transaction.id,
            transaction.amount,
            transaction.user_id
        );
        Ok(transaction)
    }

    async fn withdraw(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalReceipt, ServiceError> {
        if request.amount < self.withdrawals.min_amount {
            return Err(ServiceError::Validation(format!(
                "Minimum withdrawal is {} cents",
                self.withdrawals.min_amount
            )));
        }
        if request.payment_method_id.trim().is_empty() {
            return Err(ServiceError::Validation(
                "A payment method is required".to_string(),
            ));
        }

        let transaction = self
            .repository
            .request_withdrawal(&request.user_id, request.amount, &request.payment_method_id)
            .await
            .map_err(repository_error)?;

        log::info!(
            "Withdrawal {} of {} requested by {}.",
            transaction.id,
            transaction.amount,
            transaction.user_id
        );
        Ok(WithdrawalReceipt {
            fee: withdrawal_fee(transaction.amount, self.withdrawals.fee_bps),
            net_amount: withdrawal_net_amount(transaction.amount, self.withdrawals.fee_bps),
            transaction,
        })
    }

    async fn review_transaction(
        &self,
        transaction_id: &str,
        approve: bool,
    ) -> Result<Transaction, ServiceError> {
        let transaction = self
            .repository
            .review_transaction(transaction_id, ReviewDecision::from_approved(approve))
            .await
            .map_err(repository_error)?;

        log::info!(
            "Transaction {} ({}) reviewed: {}.",
            transaction.id,
            transaction.kind,
            transaction.status
        );
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Transaction>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT);

        self.transactions
            .list_for_user(user_id, limit)
            .await
            .map_err(repository_error)
    }
}

#[async_trait]
impl RequestHandler<WalletRequest> for WalletRequestHandler {
    async fn handle_request(&self, request: WalletRequest) {
        match request {
            WalletRequest::GetWallet { user_id, response } => {
                let wallet = self.get_wallet(&user_id).await;
                let _ = response.send(wallet);
            }
            WalletRequest::Deposit { request, response } => {
                let transaction = self.deposit(request).await;
                let _ = response.send(transaction);
            }
            WalletRequest::Withdraw { request, response } => {
                let receipt = self.withdraw(request).await;
                let _ = response.send(receipt);
            }
            WalletRequest::ReviewTransaction {
                transaction_id,
                approve,
                response,
            } => {
                let transaction = self.review_transaction(&transaction_id, approve).await;
                let _ = response.send(transaction);
            }
            WalletRequest::ListTransactions {
                user_id,
                limit,
                response,
            } => {
                let transactions = self.list_transactions(&user_id, limit).await;
                let _ = response.send(transactions);
            }
        }
    }
}

pub struct WalletService;

impl WalletService {
    pub fn new() -> Self {
        WalletService {}
    }
}

#[async_trait]
impl Service<WalletRequest, WalletRequestHandler> for WalletService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;

    fn handler(pool: &PgPool) -> WalletRequestHandler {
        WalletRequestHandler::new(pool.clone(), Withdrawals::default())
    }

    fn withdrawal(user_id: &str, amount: i64) -> WithdrawalRequest {
        WithdrawalRequest {
            user_id: user_id.to_string(),
            amount,
            payment_method_id: "bank-account-1".to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rejected_withdrawal_releases_the_hold(pool: PgPool) {
        let user = testing::user(&pool, "ana", None).await;
        testing::fund(&pool, &user.id, 50_000).await;
        let handler = handler(&pool);

        let receipt = handler
            .withdraw(withdrawal(&user.id, 20_000))
            .await
            .expect("withdraw");
        assert!(receipt.transaction.is_pending());

        let held = testing::wallet(&pool, &user.id).await;
        assert_eq!(held.balance, 30_000);
        assert_eq!(held.pending_withdrawal, 20_000);

        let reviewed = handler
            .review_transaction(&receipt.transaction.id, false)
            .await
            .expect("reject");
        assert_eq!(reviewed.status, "rejected");

        let released = testing::wallet(&pool, &user.id).await;
        assert_eq!(released.balance, 50_000);
        assert_eq!(released.pending_withdrawal, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn approved_withdrawal_settles_the_hold_once(pool: PgPool) {
        let user = testing::user(&pool, "ana", None).await;
        testing::fund(&pool, &user.id, 50_000).await;
        let handler = handler(&pool);

        let receipt = handler
            .withdraw(withdrawal(&user.id, 10_000))
            .await
            .expect("withdraw");
        handler
            .review_transaction(&receipt.transaction.id, true)
            .await
            .expect("approve");

        let settled = testing::wallet(&pool, &user.id).await;
        assert_eq!(settled.balance, 40_000);
        assert_eq!(settled.pending_withdrawal, 0);

        let again = handler.review_transaction(&receipt.transaction.id, false).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
        assert_eq!(testing::wallet(&pool, &user.id).await.balance, 40_000);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn withdrawal_beyond_balance_holds_nothing(pool: PgPool) {
        let user = testing::user(&pool, "ana", None).await;
        testing::fund(&pool, &user.id, 5_000).await;

        let result = handler(&pool).withdraw(withdrawal(&user.id, 6_000)).await;

        assert!(matches!(result, Err(ServiceError::InsufficientFunds(_))));
        let wallet = testing::wallet(&pool, &user.id).await;
        assert_eq!(wallet.balance, 5_000);
        assert_eq!(wallet.pending_withdrawal, 0);
    }
}
