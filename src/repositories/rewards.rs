use chrono::NaiveDate;
use sqlx::PgPool;

use super::{
    notifications::insert_notification, transactions::insert_transaction, wallets::adjust_wallet,
};
use crate::models::{
    new_id,
    notifications::NewNotification,
    rewards::DailyReward,
    transactions::{NewTransaction, TransactionKind},
    wallets::WalletDelta,
};

#[derive(Clone)]
pub struct RewardRepository {
    conn: PgPool,
}

impl RewardRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn last_claim(&self, user_id: &str) -> Result<Option<DailyReward>, anyhow::Error> {
        let reward = sqlx::query_as::<_, DailyReward>(
            "SELECT * FROM daily_rewards WHERE user_id = $1 ORDER BY reward_date DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(reward)
    }

    /// Records the claim and pays it out. The `(user_id, reward_date)` unique
    /// key turns a concurrent second claim into a unique violation.
    pub async fn claim(
        &self,
        user_id: &str,
        today: NaiveDate,
        streak: u32,
        amount: i64,
    ) -> Result<DailyReward, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let reward = sqlx::query_as::<_, DailyReward>(
            r#"INSERT INTO daily_rewards (id, user_id, reward_date, streak, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(today)
        .bind(streak as i32)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await?;

        if amount > 0 {
            adjust_wallet(&mut tx, user_id, WalletDelta::income(amount)).await?;
            insert_transaction(
                &mut tx,
                &NewTransaction::completed(
                    user_id,
                    TransactionKind::DailyReward,
                    amount,
                    Some(&reward.id),
                ),
            )
            .await?;
        }
        insert_notification(
            &mut tx,
            &NewNotification::daily_reward(user_id, streak, amount),
        )
        .await?;

        tx.commit().await?;

        Ok(reward)
    }
}
