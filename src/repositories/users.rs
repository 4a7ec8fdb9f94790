use crate::models::{
    new_id,
    notifications::NewNotification,
    referrals::referral_chain,
    users::{generate_referral_code, User},
};

use super::{notifications::insert_notification, referrals, wallets::insert_wallet};
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    /// Creates the user, their wallet and the referral chain above them.
    pub async fn insert_user(
        &self,
        email: &str,
        full_name: &str,
        referrer: Option<&User>,
    ) -> Result<User, anyhow::Error> {
        let user_id = new_id();
        let mut tx = self.conn.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
                INSERT INTO users (id, email, full_name, referral_code, referred_by)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(email)
        .bind(full_name.trim())
        .bind(generate_referral_code())
        .bind(referrer.map(|r| r.id.as_str()))
        .fetch_one(&mut *tx)
        .await?;

        insert_wallet(&mut tx, &user.id).await?;

        if let Some(referrer) = referrer {
            let ancestors = referrals::upstream_referrals(&mut tx, &referrer.id).await?;
            for (referrer_id, level) in referral_chain(&referrer.id, &ancestors) {
                referrals::insert_referral(&mut tx, &referrer_id, &user.id, level).await?;
            }
        }

        insert_notification(&mut tx, &NewNotification::welcome(&user.id, &user.full_name)).await?;

        tx.commit().await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }
}
