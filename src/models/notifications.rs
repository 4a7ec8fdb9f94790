use serde::{Deserialize, Serialize};

use super::format_cents;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: &'static str,
}

impl NewNotification {
    fn new(user_id: &str, kind: &'static str, title: &str, message: String) -> Self {
        NewNotification {
            user_id: user_id.to_string(),
            title: title.to_string(),
            message,
            kind,
        }
    }

    pub fn welcome(user_id: &str, full_name: &str) -> Self {
        Self::new(
            user_id,
            "welcome",
            "Welcome!",
            format!("Hi {}, your account and wallet are ready.", full_name),
        )
    }

    pub fn investment_confirmed(user_id: &str, project_name: &str, amount: i64) -> Self {
        Self::new(
            user_id,
            "investment",
            "Investment confirmed",
            format!(
                "You invested {} in {}.",
                format_cents(amount),
                project_name
            ),
        )
    }

    pub fn referral_commission(user_id: &str, level: i32, amount: i64) -> Self {
        Self::new(
            user_id,
            "referral",
            "Referral commission",
            format!(
                "You earned {} from a level {} referral investment.",
                format_cents(amount),
                level
            ),
        )
    }

    pub fn daily_earning(user_id: &str, profit: i64) -> Self {
        Self::new(
            user_id,
            "earning",
            "Daily earnings",
            format!("Your investment earned {} today.", format_cents(profit)),
        )
    }

    pub fn investment_completed(user_id: &str, profit: i64, principal: i64) -> Self {
        Self::new(
            user_id,
            "investment_completed",
            "Investment completed",
            format!(
                "Your investment reached its earnings cap. {} principal and {} final profit were returned to your wallet.",
                format_cents(principal),
                format_cents(profit)
            ),
        )
    }

    pub fn transaction_reviewed(user_id: &str, kind: &str, amount: i64, approved: bool) -> Self {
        let verdict = if approved { "approved" } else { "rejected" };
        Self::new(
            user_id,
            "transaction",
            &format!("Transaction {}", verdict),
            format!("Your {} of {} was {}.", kind, format_cents(amount), verdict),
        )
    }

    pub fn daily_reward(user_id: &str, streak: u32, amount: i64) -> Self {
        Self::new(
            user_id,
            "reward",
            "Daily reward claimed",
            format!(
                "Day {} streak: {} added to your wallet.",
                streak,
                format_cents(amount)
            ),
        )
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread: bool,
}
