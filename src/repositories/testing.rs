//! Fixtures for tests that run against a migrated Postgres database.

use chrono::NaiveDate;
use sqlx::PgPool;

use super::{projects::ProjectRepository, users::UserRepository, wallets::WalletRepository};
use crate::models::{
    projects::{NewProject, Project},
    transactions::ReviewDecision,
    users::User,
    wallets::Wallet,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn user(pool: &PgPool, name: &str, referrer: Option<&User>) -> User {
    UserRepository::new(pool.clone())
        .insert_user(&format!("{}@example.com", name), name, referrer)
        .await
        .expect("insert user")
}

/// Credits `amount` through an approved deposit.
pub async fn fund(pool: &PgPool, user_id: &str, amount: i64) {
    let wallets = WalletRepository::new(pool.clone());
    let deposit = wallets
        .request_deposit(user_id, amount, None)
        .await
        .expect("request deposit");
    wallets
        .review_transaction(&deposit.id, ReviewDecision::Approve)
        .await
        .expect("approve deposit");
}

pub async fn project(pool: &PgPool, daily_roi_bps: i64, earnings_cap_bps: i64) -> Project {
    let new = NewProject {
        name: "Solar Farm".to_string(),
        description: String::new(),
        goal_amount: 10_000_000,
        min_investment: 1_000,
        daily_roi_bps,
        earnings_cap_bps: None,
        compounding: false,
    };

    ProjectRepository::new(pool.clone())
        .insert_project(&new, earnings_cap_bps)
        .await
        .expect("insert project")
}

pub async fn wallet(pool: &PgPool, user_id: &str) -> Wallet {
    WalletRepository::new(pool.clone())
        .get_wallet(user_id)
        .await
        .expect("load wallet")
        .expect("wallet exists")
}

/// Removes a wallet so that any later credit to it fails.
pub async fn drop_wallet(pool: &PgPool, user_id: &str) {
    sqlx::query("DELETE FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("delete wallet");
}
