use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{apply_bps, new_id, projects::Project};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvestmentStatus {
    Active,
    Completed,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub amount: i64,
    pub daily_roi_bps: i64,
    pub accumulated_earnings: i64,
    pub max_earnings_cap: i64,
    pub compounding: bool,
    pub status: String,
    pub last_accrual_date: Option<NaiveDate>,
    pub created_at: chrono::NaiveDateTime,
    pub completed_at: Option<chrono::NaiveDateTime>,
}

/// Result of running the daily accrual rule against one investment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accrual {
    Inactive,
    AlreadyAccrued,
    Earned { profit: i64 },
    Completed { profit: i64, principal: i64 },
}

impl Investment {
    /// Opens an investment on `today`. The first accrual is paid for the following day.
    pub fn new_for(user_id: &str, project: &Project, amount: i64, today: NaiveDate) -> Self {
        Investment {
            id: new_id(),
            user_id: user_id.to_string(),
            project_id: project.id.clone(),
            amount,
            daily_roi_bps: project.daily_roi_bps,
            accumulated_earnings: 0,
            max_earnings_cap: apply_bps(amount, project.earnings_cap_bps),
            compounding: project.compounding,
            status: InvestmentStatus::Active.as_str().to_string(),
            last_accrual_date: Some(today),
            created_at: chrono::Utc::now().naive_utc(),
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active.as_str()
    }

    pub fn remaining_cap(&self) -> i64 {
        (self.max_earnings_cap - self.accumulated_earnings).max(0)
    }

    pub fn accrue(&self, today: NaiveDate) -> Accrual {
        if !self.is_active() {
            return Accrual::Inactive;
        }
        if matches!(self.last_accrual_date, Some(last) if last >= today) {
            return Accrual::AlreadyAccrued;
        }

        let base = if self.compounding {
            self.amount + self.accumulated_earnings
        } else {
            self.amount
        };
        let profit = apply_bps(base, self.daily_roi_bps).max(0);

        if self.accumulated_earnings + profit >= self.max_earnings_cap {
            Accrual::Completed {
                profit: self.remaining_cap(),
                principal: self.amount,
            }
        } else {
            Accrual::Earned { profit }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InvestRequest {
    pub user_id: String,
    pub project_id: String,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommissionPayout {
    pub referrer_id: String,
    pub level: i32,
    pub amount: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct InvestmentReceipt {
    pub investment: Investment,
    pub commissions: Vec<CommissionPayout>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EarningsReport {
    pub date: Option<NaiveDate>,
    pub processed: u32,
    pub skipped: u32,
    pub completed: u32,
    pub failed: u32,
    pub total_profit: i64,
    pub total_principal_returned: i64,
}

impl EarningsReport {
    pub fn new(date: NaiveDate) -> Self {
        EarningsReport {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn record(&mut self, accrual: &Accrual) {
        match *accrual {
            Accrual::Inactive | Accrual::AlreadyAccrued => self.skipped += 1,
            Accrual::Earned { profit } => {
                self.processed += 1;
                self.total_profit += profit;
            }
            Accrual::Completed { profit, principal } => {
                self.processed += 1;
                self.completed += 1;
                self.total_profit += profit;
                self.total_principal_returned += principal;
            }
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EarningsRunRequest {
    pub date: Option<NaiveDate>,
}
