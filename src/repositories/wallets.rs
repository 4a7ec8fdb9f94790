use anyhow::bail;
use sqlx::{PgConnection, PgPool};

use super::{notifications::insert_notification, transactions};
use crate::models::{
    notifications::NewNotification,
    transactions::{review_effect, NewTransaction, ReviewDecision, Transaction, TransactionKind},
    wallets::{Wallet, WalletDelta, WalletRejection},
};

#[derive(Clone)]
pub struct WalletRepository {
    conn: PgPool,
}

impl WalletRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn get_wallet(&self, user_id: &str) -> Result<Option<Wallet>, anyhow::Error> {
        let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(wallet)
    }

    pub async fn request_deposit(
        &self,
        user_id: &str,
        amount: i64,
        reference: Option<&str>,
    ) -> Result<Transaction, anyhow::Error> {
        let mut conn = self.conn.acquire().await?;
        let transaction = transactions::insert_transaction(
            &mut conn,
            &NewTransaction::pending(user_id, TransactionKind::Deposit, amount, reference),
        )
        .await?;

        Ok(transaction)
    }

    pub async fn request_withdrawal(
        &self,
        user_id: &str,
        amount: i64,
        payment_method_id: &str,
    ) -> Result<Transaction, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let wallet = match fetch_wallet_for_update(&mut tx, user_id).await? {
            Some(wallet) => wallet,
            None => bail!(WalletRejection::WalletNotFound(user_id.to_string())),
        };
        if !wallet.can_cover(amount) {
            bail!(WalletRejection::InsufficientFunds {
                available: wallet.balance
            });
        }

        adjust_wallet(&mut tx, user_id, WalletDelta::withdrawal_hold(amount)).await?;
        let transaction = transactions::insert_transaction(
            &mut tx,
            &NewTransaction::pending(
                user_id,
                TransactionKind::Withdrawal,
                amount,
                Some(payment_method_id),
            ),
        )
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    pub async fn review_transaction(
        &self,
        transaction_id: &str,
        decision: ReviewDecision,
    ) -> Result<Transaction, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let transaction =
            match transactions::fetch_transaction_for_update(&mut tx, transaction_id).await? {
                Some(transaction) => transaction,
                None => bail!(WalletRejection::TransactionNotFound(
                    transaction_id.to_string()
                )),
            };
        if !transaction.is_pending() {
            bail!(WalletRejection::AlreadyReviewed(transaction.status));
        }

        let delta = transaction
            .kind()
            .and_then(|kind| review_effect(kind, transaction.amount, decision));
        let delta = match delta {
            Some(delta) => delta,
            None => bail!(WalletRejection::NotReviewable(transaction.kind)),
        };

        if !delta.is_zero() {
            adjust_wallet(&mut tx, &transaction.user_id, delta).await?;
        }
        let reviewed = transactions::update_transaction_status(
            &mut tx,
            transaction_id,
            decision.resulting_status(),
        )
        .await?;
        insert_notification(
            &mut tx,
            &NewNotification::transaction_reviewed(
                &reviewed.user_id,
                &reviewed.kind,
                reviewed.amount,
                decision == ReviewDecision::Approve,
            ),
        )
        .await?;

        tx.commit().await?;

        Ok(reviewed)
    }
}

pub async fn insert_wallet(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Wallet, anyhow::Error> {
    let wallet = sqlx::query_as::<_, Wallet>("INSERT INTO wallets (user_id) VALUES ($1) RETURNING *")
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    Ok(wallet)
}

pub async fn fetch_wallet_for_update(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Option<Wallet>, anyhow::Error> {
    let wallet =
        sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

    Ok(wallet)
}

pub async fn adjust_wallet(
    conn: &mut PgConnection,
    user_id: &str,
    delta: WalletDelta,
) -> Result<Wallet, anyhow::Error> {
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"UPDATE wallets SET
            balance = balance + $2,
            invested_amount = invested_amount + $3,
            pending_withdrawal = pending_withdrawal + $4,
            total_earnings = total_earnings + $5,
            updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $1
        RETURNING *"#,
    )
    .bind(user_id)
    .bind(delta.balance)
    .bind(delta.invested_amount)
    .bind(delta.pending_withdrawal)
    .bind(delta.total_earnings)
    .fetch_optional(conn)
    .await?;

    match wallet {
        Some(wallet) => Ok(wallet),
        None => bail!(WalletRejection::WalletNotFound(user_id.to_string())),
    }
}
