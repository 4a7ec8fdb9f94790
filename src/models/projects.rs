use serde::{Deserialize, Serialize};

use super::BPS_DENOMINATOR;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectStatus {
    Active,
    Funded,
    Closed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Funded => "funded",
            ProjectStatus::Closed => "closed",
        }
    }

    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "active" => Some(ProjectStatus::Active),
            "funded" => Some(ProjectStatus::Funded),
            "closed" => Some(ProjectStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub goal_amount: i64,
    pub funded_amount: i64,
    pub min_investment: i64,
    pub daily_roi_bps: i64,
    pub earnings_cap_bps: i64,
    pub compounding: bool,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvestmentRejection {
    #[error("Investment amount must be positive")]
    NonPositiveAmount,
    #[error("Project is not open for investment (status: {0})")]
    ProjectNotActive(String),
    #[error("Minimum investment for this project is {minimum} cents")]
    BelowMinimum { minimum: i64 },
    #[error("Investment exceeds the remaining funding room of {remaining} cents")]
    ExceedsGoal { remaining: i64 },
    #[error("Insufficient balance: {available} cents available")]
    InsufficientFunds { available: i64 },
}

impl Project {
    pub fn remaining(&self) -> i64 {
        (self.goal_amount - self.funded_amount).max(0)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active.as_str()
    }

    pub fn check_investment(&self, amount: i64) -> Result<(), InvestmentRejection> {
        if amount <= 0 {
            return Err(InvestmentRejection::NonPositiveAmount);
        }
        if !self.is_active() {
            return Err(InvestmentRejection::ProjectNotActive(self.status.clone()));
        }
        if amount < self.min_investment {
            return Err(InvestmentRejection::BelowMinimum {
                minimum: self.min_investment,
            });
        }
        if amount > self.remaining() {
            return Err(InvestmentRejection::ExceedsGoal {
                remaining: self.remaining(),
            });
        }

        Ok(())
    }

    /// Funded amount and status once `amount` has been credited.
    pub fn after_funding(&self, amount: i64) -> (i64, ProjectStatus) {
        let funded = self.funded_amount + amount;
        let status = if funded >= self.goal_amount {
            ProjectStatus::Funded
        } else {
            ProjectStatus::Active
        };

        (funded, status)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub goal_amount: i64,
    pub min_investment: i64,
    pub daily_roi_bps: i64,
    pub earnings_cap_bps: Option<i64>,
    #[serde(default)]
    pub compounding: bool,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Project name must not be empty".to_string());
        }
        if self.goal_amount <= 0 {
            return Err("Goal amount must be positive".to_string());
        }
        if self.min_investment <= 0 || self.min_investment > self.goal_amount {
            return Err("Minimum investment must be positive and not exceed the goal".to_string());
        }
        if !(1..=BPS_DENOMINATOR).contains(&self.daily_roi_bps) {
            return Err(format!(
                "Daily ROI must be between 1 and {} bps",
                BPS_DENOMINATOR
            ));
        }
        if matches!(self.earnings_cap_bps, Some(cap) if cap <= 0) {
            return Err("Earnings cap must be positive".to_string());
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<String>,
}
