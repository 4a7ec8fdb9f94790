use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::investments::{Accrual, EarningsReport},
    repositories::investments::InvestmentRepository,
};

pub enum EarningsRequest {
    CalculateEarnings {
        date: NaiveDate,
        response: oneshot::Sender<Result<EarningsReport, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct EarningsRequestHandler {
    repository: InvestmentRepository,
}

impl EarningsRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        EarningsRequestHandler {
            repository: InvestmentRepository::new(sql_conn),
        }
    }

    /// Single pass over the active investments. One investment failing is
    /// counted in the report and does not stop the rest of the run.
    async fn calculate_earnings(&self, today: NaiveDate) -> Result<EarningsReport, ServiceError> {
        let investments = self
            .repository
            .list_active()
            .await
            .map_err(repository_error)?;

        log::info!(
            "Calculating earnings for {} over {} active investments.",
            today,
            investments.len()
        );

        let mut report = EarningsReport::new(today);
        for investment in investments {
            let accrual = investment.accrue(today);
            if matches!(accrual, Accrual::Inactive | Accrual::AlreadyAccrued) {
                report.record(&accrual);
                continue;
            }

            match self
                .repository
                .apply_accrual(&investment, accrual, today)
                .await
            {
                Ok(true) => {
                    if let Accrual::Completed { profit, principal } = accrual {
                        log::info!(
                            "Investment {} completed: final profit {}, principal {} returned.",
                            investment.id,
                            profit,
                            principal
                        );
                    }
                    report.record(&accrual);
                }
                Ok(false) => report.record(&Accrual::AlreadyAccrued),
                Err(e) => {
                    log::error!(
                        "Failed to accrue earnings for investment {}: {:#}",
                        investment.id,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Earnings run for {} done: processed={} completed={} skipped={} failed={} profit={}.",
            today,
            report.processed,
            report.completed,
            report.skipped,
            report.failed,
            report.total_profit
        );
        Ok(report)
    }
}

#[async_trait]
impl RequestHandler<EarningsRequest> for EarningsRequestHandler {
    async fn handle_request(&self, request: EarningsRequest) {
        match request {
            EarningsRequest::CalculateEarnings { date, response } => {
                let report = self.calculate_earnings(date).await;
                let _ = response.send(report);
            }
        }
    }
}

pub struct EarningsService;

impl EarningsService {
    pub fn new() -> Self {
        EarningsService {}
    }
}

#[async_trait]
impl Service<EarningsRequest, EarningsRequestHandler> for EarningsService {}
