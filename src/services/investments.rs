use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::{
        investments::{CommissionPayout, InvestRequest, Investment, InvestmentReceipt},
        projects::InvestmentRejection,
        referrals::ReferralRates,
    },
    repositories::{
        investments::InvestmentRepository, projects::ProjectRepository,
        referrals::ReferralRepository, wallets::WalletRepository,
    },
};

pub enum InvestmentRequest {
    Invest {
        request: InvestRequest,
        response: oneshot::Sender<Result<InvestmentReceipt, ServiceError>>,
    },
    ListInvestments {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Investment>, ServiceError>>,
    },
    GetInvestment {
        id: String,
        response: oneshot::Sender<Result<Investment, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct InvestmentRequestHandler {
    repository: InvestmentRepository,
    projects: ProjectRepository,
    wallets: WalletRepository,
    referrals: ReferralRepository,
    rates: ReferralRates,
}

impl InvestmentRequestHandler {
    pub fn new(sql_conn: PgPool, rates: ReferralRates) -> Self {
        InvestmentRequestHandler {
            repository: InvestmentRepository::new(sql_conn.clone()),
            projects: ProjectRepository::new(sql_conn.clone()),
            wallets: WalletRepository::new(sql_conn.clone()),
            referrals: ReferralRepository::new(sql_conn),
            rates,
        }
    }

    async fn invest(&self, request: InvestRequest) -> Result<InvestmentReceipt, ServiceError> {
        let project = self
            .projects
            .get_project(&request.project_id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Project {}", request.project_id)))?;
        project.check_investment(request.amount)?;

        let wallet = self
            .wallets
            .get_wallet(&request.user_id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Wallet for user {}", request.user_id)))?;
        if !wallet.can_cover(request.amount) {
            return Err(InvestmentRejection::InsufficientFunds {
                available: wallet.balance,
            }
            .into());
        }

        let today = chrono::Utc::now().date_naive();
        let investment = Investment::new_for(&request.user_id, &project, request.amount, today);
        let investment = self
            .repository
            .create_investment(&investment)
            .await
            .map_err(repository_error)?;

        log::info!(
            "User {} invested {} in project {} (investment {}).",
            investment.user_id,
            investment.amount,
            investment.project_id,
            investment.id
        );

        let commissions = self.distribute_commissions(&investment).await;

        Ok(InvestmentReceipt {
            investment,
            commissions,
        })
    }

    /// Pays every upstream referrer. Failures are logged and skipped; nothing
    /// already written for the investment or for other levels is undone.
    async fn distribute_commissions(&self, investment: &Investment) -> Vec<CommissionPayout> {
        let referrers = match self.referrals.referrers_of(&investment.user_id).await {
            Ok(referrers) => referrers,
            Err(e) => {
                log::error!(
                    "Could not load referrers for investment {}: {:#}",
                    investment.id,
                    e
                );
                return Vec::new();
            }
        };

        let mut payouts = Vec::with_capacity(referrers.len());
        for referral in referrers {
            let amount = self.rates.commission(referral.level, investment.amount);
            if amount <= 0 {
                continue;
            }

            match self
                .referrals
                .pay_commission(&referral.referrer_id, referral.level, amount, &investment.id)
                .await
            {
                Ok(()) => {
                    log::info!(
                        "Paid level {} commission of {} to {} for investment {}.",
                        referral.level,
                        amount,
                        referral.referrer_id,
                        investment.id
                    );
                    payouts.push(CommissionPayout {
                        referrer_id: referral.referrer_id,
                        level: referral.level,
                        amount,
                    });
                }
                Err(e) => {
                    log::error!(
                        "Failed to pay level {} commission to {} for investment {}: {:#}",
                        referral.level,
                        referral.referrer_id,
                        investment.id,
                        e
                    );
                }
            }
        }

        payouts
    }

    async fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>, ServiceError> {
        self.repository
            .list_for_user(user_id)
            .await
            .map_err(repository_error)
    }

    async fn get_investment(&self, id: &str) -> Result<Investment, ServiceError> {
        self.repository
            .get_investment(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Investment {}", id)))
    }
}

#[async_trait]
impl RequestHandler<InvestmentRequest> for InvestmentRequestHandler {
    async fn handle_request(&self, request: InvestmentRequest) {
        match request {
            InvestmentRequest::Invest { request, response } => {
                let receipt = self.invest(request).await;
                let _ = response.send(receipt);
            }
            InvestmentRequest::ListInvestments { user_id, response } => {
                let investments = self.list_investments(&user_id).await;
                let _ = response.send(investments);
            }
            InvestmentRequest::GetInvestment { id, response } => {
                let investment = self.get_investment(&id).await;
                let _ = response.send(investment);
            }
        }
    }
}

pub struct InvestmentService;

impl InvestmentService {
    pub fn new() -> Self {
        InvestmentService {}
    }
}

#[async_trait]
impl Service<InvestmentRequest, InvestmentRequestHandler> for InvestmentService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;

    /// Builds `top <- l3 <- l2 <- l1 <- investor`, so `top` sits four levels up.
    async fn referral_ladder(pool: &PgPool) -> Vec<String> {
        let top = testing::user(pool, "top", None).await;
        let l3 = testing::user(pool, "level3", Some(&top)).await;
        let l2 = testing::user(pool, "level2", Some(&l3)).await;
        let l1 = testing::user(pool, "level1", Some(&l2)).await;
        let investor = testing::user(pool, "investor", Some(&l1)).await;

        vec![investor.id, l1.id, l2.id, l3.id, top.id]
    }

    fn handler(pool: &PgPool) -> InvestmentRequestHandler {
        InvestmentRequestHandler::new(pool.clone(), ReferralRates::default())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn invest_pays_three_referral_levels(pool: PgPool) {
        let ids = referral_ladder(&pool).await;
        let project = testing::project(&pool, 100, 20_000).await;
        testing::fund(&pool, &ids[0], 100_000).await;

        let receipt = handler(&pool)
            .invest(InvestRequest {
                user_id: ids[0].clone(),
                project_id: project.id.clone(),
                amount: 10_000,
            })
            .await
            .expect("invest");

        let paid: Vec<(i32, i64)> = receipt
            .commissions
            .iter()
            .map(|c| (c.level, c.amount))
            .collect();
        assert_eq!(paid, vec![(1, 1_000), (2, 500), (3, 200)]);

        let investor = testing::wallet(&pool, &ids[0]).await;
        assert_eq!(investor.balance, 90_000);
        assert_eq!(investor.invested_amount, 10_000);

        assert_eq!(testing::wallet(&pool, &ids[1]).await.balance, 1_000);
        assert_eq!(testing::wallet(&pool, &ids[2]).await.balance, 500);
        assert_eq!(testing::wallet(&pool, &ids[3]).await.balance, 200);
        assert_eq!(testing::wallet(&pool, &ids[3]).await.total_earnings, 200);
        assert_eq!(testing::wallet(&pool, &ids[4]).await.balance, 0);

        let project = ProjectRepository::new(pool.clone())
            .get_project(&project.id)
            .await
            .expect("load project")
            .expect("project exists");
        assert_eq!(project.funded_amount, 10_000);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn failed_commission_keeps_other_levels_and_investment(pool: PgPool) {
        let ids = referral_ladder(&pool).await;
        let project = testing::project(&pool, 100, 20_000).await;
        testing::fund(&pool, &ids[0], 100_000).await;
        testing::drop_wallet(&pool, &ids[2]).await;

        let receipt = handler(&pool)
            .invest(InvestRequest {
                user_id: ids[0].clone(),
                project_id: project.id.clone(),
                amount: 10_000,
            })
            .await
            .expect("invest");

        let levels: Vec<i32> = receipt.commissions.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![1, 3]);
        assert_eq!(testing::wallet(&pool, &ids[1]).await.balance, 1_000);
        assert_eq!(testing::wallet(&pool, &ids[3]).await.balance, 200);

        let stored = InvestmentRepository::new(pool.clone())
            .get_investment(&receipt.investment.id)
            .await
            .expect("load investment");
        assert!(stored.is_some());
        assert_eq!(testing::wallet(&pool, &ids[0]).await.balance, 90_000);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn invest_without_funds_writes_nothing(pool: PgPool) {
        let investor = testing::user(&pool, "investor", None).await;
        let project = testing::project(&pool, 100, 20_000).await;
        testing::fund(&pool, &investor.id, 5_000).await;

        let result = handler(&pool)
            .invest(InvestRequest {
                user_id: investor.id.clone(),
                project_id: project.id.clone(),
                amount: 10_000,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InsufficientFunds(_))));
        assert_eq!(testing::wallet(&pool, &investor.id).await.balance, 5_000);
        let investments = InvestmentRepository::new(pool.clone())
            .list_for_user(&investor.id)
            .await
            .expect("list investments");
        assert!(investments.is_empty());
    }
}
