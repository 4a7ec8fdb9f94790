use anyhow::bail;
use chrono::NaiveDate;
use sqlx::PgPool;

use super::{
    notifications::insert_notification,
    projects::{fetch_project_for_update, update_funding},
    transactions::insert_transaction,
    wallets::{adjust_wallet, fetch_wallet_for_update},
};
use crate::models::{
    investments::{Accrual, Investment, InvestmentStatus},
    notifications::NewNotification,
    projects::InvestmentRejection,
    transactions::{NewTransaction, TransactionKind},
    wallets::{WalletDelta, WalletRejection},
};

#[derive(Clone)]
pub struct InvestmentRepository {
    conn: PgPool,
}

impl InvestmentRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    /// Writes the investment, debits the wallet and credits the project in one transaction.
    ///
    /// Funding room and balance are checked again under row locks, so a racing
    /// request surfaces as an [`InvestmentRejection`] instead of overfunding.
    pub async fn create_investment(
        &self,
        investment: &Investment,
    ) -> Result<Investment, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        let project = match fetch_project_for_update(&mut tx, &investment.project_id).await? {
            Some(project) => project,
            None => bail!("Project {} disappeared", investment.project_id),
        };
        project.check_investment(investment.amount)?;

        let wallet = match fetch_wallet_for_update(&mut tx, &investment.user_id).await? {
            Some(wallet) => wallet,
            None => bail!(WalletRejection::WalletNotFound(investment.user_id.clone())),
        };
        if !wallet.can_cover(investment.amount) {
            bail!(InvestmentRejection::InsufficientFunds {
                available: wallet.balance
            });
        }

        let created = sqlx::query_as::<_, Investment>(
            r#"INSERT INTO investments
            (id, user_id, project_id, amount, daily_roi_bps, accumulated_earnings, max_earnings_cap, compounding, status, last_accrual_date)
            VALUES ($1, $2, $3, $4, $5, 0, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(&investment.id)
        .bind(&investment.user_id)
        .bind(&investment.project_id)
        .bind(investment.amount)
        .bind(investment.daily_roi_bps)
        .bind(investment.max_earnings_cap)
        .bind(investment.compounding)
        .bind(InvestmentStatus::Active.as_str())
        .bind(investment.last_accrual_date)
        .fetch_one(&mut *tx)
        .await?;

        adjust_wallet(&mut tx, &created.user_id, WalletDelta::investment(created.amount)).await?;

        let (funded_amount, status) = project.after_funding(created.amount);
        update_funding(&mut tx, &project.id, funded_amount, status).await?;

        insert_transaction(
            &mut tx,
            &NewTransaction::completed(
                &created.user_id,
                TransactionKind::Investment,
                created.amount,
                Some(&created.id),
            ),
        )
        .await?;
        insert_notification(
            &mut tx,
            &NewNotification::investment_confirmed(&created.user_id, &project.name, created.amount),
        )
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    pub async fn get_investment(&self, id: &str) -> Result<Option<Investment>, anyhow::Error> {
        let investment = sqlx::query_as::<_, Investment>("SELECT * FROM investments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(investment)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Investment>, anyhow::Error> {
        let investments = sqlx::query_as::<_, Investment>(
            "SELECT * FROM investments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(investments)
    }

    pub async fn list_active(&self) -> Result<Vec<Investment>, anyhow::Error> {
        let investments = sqlx::query_as::<_, Investment>(
            "SELECT * FROM investments WHERE status = $1 ORDER BY created_at",
        )
        .bind(InvestmentStatus::Active.as_str())
        .fetch_all(&self.conn)
        .await?;

        Ok(investments)
    }

    /// Persists one day's accrual. Returns false when another run already
    /// accrued this investment for `today`, in which case nothing is written.
    pub async fn apply_accrual(
        &self,
        investment: &Investment,
        accrual: Accrual,
        today: NaiveDate,
    ) -> Result<bool, anyhow::Error> {
        let (profit, principal) = match accrual {
            Accrual::Earned { profit } => (profit, None),
            Accrual::Completed { profit, principal } => (profit, Some(principal)),
            Accrual::Inactive | Accrual::AlreadyAccrued => return Ok(false),
        };

        let mut tx = self.conn.begin().await?;

        let status = match principal {
            Some(_) => InvestmentStatus::Completed,
            None => InvestmentStatus::Active,
        };
        let updated = sqlx::query(
            r#"UPDATE investments SET
                accumulated_earnings = accumulated_earnings + $2,
                last_accrual_date = $3,
                status = $4,
                completed_at = CASE WHEN $4 = 'completed' THEN CURRENT_TIMESTAMP ELSE completed_at END
            WHERE id = $1
                AND status = 'active'
                AND (last_accrual_date IS NULL OR last_accrual_date < $3)"#,
        )
        .bind(&investment.id)
        .bind(profit)
        .bind(today)
        .bind(status.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let user_id = investment.user_id.as_str();
        match principal {
            None => {
                adjust_wallet(&mut tx, user_id, WalletDelta::income(profit)).await?;
                if profit > 0 {
                    insert_transaction(
                        &mut tx,
                        &NewTransaction::completed(
                            user_id,
                            TransactionKind::Earning,
                            profit,
                            Some(&investment.id),
                        ),
                    )
                    .await?;
                }
                insert_notification(&mut tx, &NewNotification::daily_earning(user_id, profit))
                    .await?;
            }
            Some(principal) => {
                adjust_wallet(
                    &mut tx,
                    user_id,
                    WalletDelta::principal_return(profit, principal),
                )
                .await?;
                if profit > 0 {
                    insert_transaction(
                        &mut tx,
                        &NewTransaction::completed(
                            user_id,
                            TransactionKind::Earning,
                            profit,
                            Some(&investment.id),
                        ),
                    )
                    .await?;
                }
                insert_transaction(
                    &mut tx,
                    &NewTransaction::completed(
                        user_id,
                        TransactionKind::PrincipalReturn,
                        principal,
                        Some(&investment.id),
                    ),
                )
                .await?;
                insert_notification(
                    &mut tx,
                    &NewNotification::investment_completed(user_id, profit, principal),
                )
                .await?;
            }
        }

        tx.commit().await?;

        Ok(true)
    }
}
