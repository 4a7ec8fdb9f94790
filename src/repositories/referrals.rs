use sqlx::{PgConnection, PgPool};

use super::{
    notifications::insert_notification, transactions::insert_transaction, wallets::adjust_wallet,
};
use crate::models::{
    new_id,
    notifications::NewNotification,
    referrals::{Referral, ReferredUser, MAX_REFERRAL_LEVEL},
    transactions::{NewTransaction, TransactionKind},
    wallets::WalletDelta,
};

#[derive(Clone)]
pub struct ReferralRepository {
    conn: PgPool,
}

impl ReferralRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    /// Everyone earning commissions on `user_id`'s investments, closest level first.
    pub async fn referrers_of(&self, user_id: &str) -> Result<Vec<Referral>, anyhow::Error> {
        let mut conn = self.conn.acquire().await?;
        upstream_referrals(&mut conn, user_id).await
    }

    pub async fn list_referred(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<ReferredUser>, anyhow::Error> {
        let referred = sqlx::query_as::<_, ReferredUser>(
            r#"SELECT u.id AS user_id, u.full_name, r.level, r.created_at
            FROM referrals r
            JOIN users u ON u.id = r.referred_id
            WHERE r.referrer_id = $1
            ORDER BY r.level, r.created_at DESC"#,
        )
        .bind(referrer_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(referred)
    }

    /// Credits one referral commission. Each payout commits on its own.
    pub async fn pay_commission(
        &self,
        referrer_id: &str,
        level: i32,
        amount: i64,
        investment_id: &str,
    ) -> Result<(), anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        adjust_wallet(&mut tx, referrer_id, WalletDelta::income(amount)).await?;
        insert_transaction(
            &mut tx,
            &NewTransaction::completed(
                referrer_id,
                TransactionKind::ReferralCommission,
                amount,
                Some(investment_id),
            ),
        )
        .await?;
        insert_notification(
            &mut tx,
            &NewNotification::referral_commission(referrer_id, level, amount),
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

pub async fn upstream_referrals(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<Vec<Referral>, anyhow::Error> {
    let referrals = sqlx::query_as::<_, Referral>(
        r#"SELECT * FROM referrals
        WHERE referred_id = $1 AND level <= $2
        ORDER BY level"#,
    )
    .bind(user_id)
    .bind(MAX_REFERRAL_LEVEL)
    .fetch_all(conn)
    .await?;

    Ok(referrals)
}

pub async fn insert_referral(
    conn: &mut PgConnection,
    referrer_id: &str,
    referred_id: &str,
    level: i32,
) -> Result<Referral, anyhow::Error> {
    let referral = sqlx::query_as::<_, Referral>(
        r#"INSERT INTO referrals (id, referrer_id, referred_id, level)
        VALUES ($1, $2, $3, $4)
        RETURNING *"#,
    )
    .bind(new_id())
    .bind(referrer_id)
    .bind(referred_id)
    .bind(level)
    .fetch_one(conn)
    .await?;

    Ok(referral)
}
