use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::rewards::{self, DailyReward, RewardStatus},
    repositories::{is_unique_violation, rewards::RewardRepository, users::UserRepository},
};

pub enum RewardRequest {
    Claim {
        user_id: String,
        today: NaiveDate,
        response: oneshot::Sender<Result<DailyReward, ServiceError>>,
    },
    Status {
        user_id: String,
        today: NaiveDate,
        response: oneshot::Sender<Result<RewardStatus, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct RewardRequestHandler {
    repository: RewardRepository,
    users: UserRepository,
    schedule: Vec<i64>,
}

impl RewardRequestHandler {
    pub fn new(sql_conn: PgPool, schedule: Vec<i64>) -> Self {
        RewardRequestHandler {
            repository: RewardRepository::new(sql_conn.clone()),
            users: UserRepository::new(sql_conn),
            schedule,
        }
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), ServiceError> {
        self.users
            .get_user_by_id(user_id)
            .await
            .map_err(repository_error)?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", user_id)))
    }

    async fn claim(&self, user_id: &str, today: NaiveDate) -> Result<DailyReward, ServiceError> {
        self.ensure_user(user_id).await?;

        let last = self
            .repository
            .last_claim(user_id)
            .await
            .map_err(repository_error)?;

        let last_claim = last.map(|r| (r.reward_date, r.streak.max(0) as u32));
        let streak = rewards::next_streak(last_claim, today).ok_or_else(|| {
            ServiceError::Conflict("Daily reward already claimed today".to_string())
        })?;
        let amount = rewards::reward_for_streak(&self.schedule, streak);

        let reward = self
            .repository
            .claim(user_id, today, streak, amount)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::Conflict("Daily reward already claimed today".to_string())
                } else {
                    repository_error(e)
                }
            })?;

        log::info!(
            "User {} claimed daily reward of {} (streak {}).",
            user_id,
            reward.amount,
            reward.streak
        );
        Ok(reward)
    }

    async fn status(&self, user_id: &str, today: NaiveDate) -> Result<RewardStatus, ServiceError> {
        self.ensure_user(user_id).await?;

        let last = self
            .repository
            .last_claim(user_id)
            .await
            .map_err(repository_error)?;

        Ok(rewards::reward_status(&self.schedule, last.as_ref(), today))
    }
}

#[async_trait]
impl RequestHandler<RewardRequest> for RewardRequestHandler {
    async fn handle_request(&self, request: RewardRequest) {
        match request {
            RewardRequest::Claim {
                user_id,
                today,
                response,
            } => {
                let reward = self.claim(&user_id, today).await;
                let _ = response.send(reward);
            }
            RewardRequest::Status {
                user_id,
                today,
                response,
            } => {
                let status = self.status(&user_id, today).await;
                let _ = response.send(status);
            }
        }
    }
}

pub struct RewardService;

impl RewardService {
    pub fn new() -> Self {
        RewardService {}
    }
}

#[async_trait]
impl Service<RewardRequest, RewardRequestHandler> for RewardService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::testing;

    const SCHEDULE: [i64; 3] = [100, 200, 500];

    fn handler(pool: &PgPool) -> RewardRequestHandler {
        RewardRequestHandler::new(pool.clone(), SCHEDULE.to_vec())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_user_is_not_found(pool: PgPool) {
        let handler = handler(&pool);
        let today = testing::date(2026, 5, 10);

        let claim = handler.claim("ghost", today).await;
        assert!(matches!(claim, Err(ServiceError::NotFound(_))));

        let status = handler.status("ghost", today).await;
        assert!(matches!(status, Err(ServiceError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn claims_pay_once_per_day_and_build_a_streak(pool: PgPool) {
        let user = testing::user(&pool, "ana", None).await;
        let handler = handler(&pool);
        let first_day = testing::date(2026, 5, 10);
        let second_day = testing::date(2026, 5, 11);

        let first = handler.claim(&user.id, first_day).await.expect("claim");
        assert_eq!((first.streak, first.amount), (1, 100));

        let repeat = handler.claim(&user.id, first_day).await;
        assert!(matches!(repeat, Err(ServiceError::Conflict(_))));

        let status = handler.status(&user.id, first_day).await.expect("status");
        assert!(!status.claimable);
        assert_eq!(status.current_streak, 1);

        let second = handler.claim(&user.id, second_day).await.expect("claim");
        assert_eq!((second.streak, second.amount), (2, 200));
        assert_eq!(testing::wallet(&pool, &user.id).await.balance, 300);
    }
}
