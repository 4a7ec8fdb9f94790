use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::models::{projects::InvestmentRejection, wallets::WalletRejection};
use crate::repositories::is_unique_violation;
use crate::settings::Settings;

pub mod earnings;
pub mod http;
pub mod investments;
pub mod notifications;
pub mod projects;
pub mod rewards;
pub mod users;
pub mod wallets;

const CHANNEL_CAPACITY: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

impl From<InvestmentRejection> for ServiceError {
    fn from(rejection: InvestmentRejection) -> Self {
        match rejection {
            InvestmentRejection::InsufficientFunds { .. } => {
                ServiceError::InsufficientFunds(rejection.to_string())
            }
            _ => ServiceError::Validation(rejection.to_string()),
        }
    }
}

impl From<WalletRejection> for ServiceError {
    fn from(rejection: WalletRejection) -> Self {
        match rejection {
            WalletRejection::WalletNotFound(_) | WalletRejection::TransactionNotFound(_) => {
                ServiceError::NotFound(rejection.to_string())
            }
            WalletRejection::InsufficientFunds { .. } => {
                ServiceError::InsufficientFunds(rejection.to_string())
            }
            WalletRejection::AlreadyReviewed(_) => ServiceError::Conflict(rejection.to_string()),
            WalletRejection::NotReviewable(_) => ServiceError::Validation(rejection.to_string()),
        }
    }
}

/// Maps a repository failure, keeping business rejections raised under row locks.
pub fn repository_error(error: anyhow::Error) -> ServiceError {
    if let Some(rejection) = error.downcast_ref::<InvestmentRejection>() {
        return rejection.clone().into();
    }
    if let Some(rejection) = error.downcast_ref::<WalletRejection>() {
        return rejection.clone().into();
    }
    if is_unique_violation(&error) {
        return ServiceError::Conflict("Record already exists".to_string());
    }

    log::error!("Repository error: {:#}", error);
    ServiceError::Database(error.to_string())
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (user_tx, mut user_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (project_tx, mut project_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (investment_tx, mut investment_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (earnings_tx, mut earnings_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (wallet_tx, mut wallet_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (reward_tx, mut reward_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (notification_tx, mut notification_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let mut user_service = users::UserService::new();
    let mut project_service = projects::ProjectService::new();
    let mut investment_service = investments::InvestmentService::new();
    let mut earnings_service = earnings::EarningsService::new();
    let mut wallet_service = wallets::WalletService::new();
    let mut reward_service = rewards::RewardService::new();
    let mut notification_service = notifications::NotificationService::new();

    log::info!("Starting user service.");
    let handler = users::UserRequestHandler::new(pool.clone());
    tokio::spawn(async move {
        user_service.run(handler, &mut user_rx).await;
    });

    log::info!("Starting project service.");
    let handler = projects::ProjectRequestHandler::new(
        pool.clone(),
        settings.investments.default_earnings_cap_bps,
    );
    tokio::spawn(async move {
        project_service.run(handler, &mut project_rx).await;
    });

    log::info!("Starting investment service.");
    let handler =
        investments::InvestmentRequestHandler::new(pool.clone(), settings.referrals.clone());
    tokio::spawn(async move {
        investment_service.run(handler, &mut investment_rx).await;
    });

    log::info!("Starting earnings service.");
    let handler = earnings::EarningsRequestHandler::new(pool.clone());
    tokio::spawn(async move {
        earnings_service.run(handler, &mut earnings_rx).await;
    });

    log::info!("Starting wallet service.");
    let handler = wallets::WalletRequestHandler::new(pool.clone(), settings.withdrawals.clone());
    tokio::spawn(async move {
        wallet_service.run(handler, &mut wallet_rx).await;
    });

    log::info!("Starting reward service.");
    let handler =
        rewards::RewardRequestHandler::new(pool.clone(), settings.rewards.schedule.clone());
    tokio::spawn(async move {
        reward_service.run(handler, &mut reward_rx).await;
    });

    log::info!("Starting notification service.");
    let handler = notifications::NotificationRequestHandler::new(pool);
    tokio::spawn(async move {
        notification_service.run(handler, &mut notification_rx).await;
    });

    let channels = http::Channels {
        users: user_tx,
        projects: project_tx,
        investments: investment_tx,
        earnings: earnings_tx,
        wallets: wallet_tx,
        rewards: reward_tx,
        notifications: notification_tx,
    };

    log::info!("Starting HTTP server.");
    http::start_http_server(
        &settings.server.listen,
        channels,
        &settings.server.cron_secret,
        &settings.server.admin_secret,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tokio::sync::oneshot;

    struct Ping {
        response: oneshot::Sender<usize>,
    }

    #[derive(Clone)]
    struct CountingHandler {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RequestHandler<Ping> for CountingHandler {
        async fn handle_request(&self, request: Ping) {
            let count = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = request.response.send(count);
        }
    }

    struct PingService;

    #[async_trait]
    impl Service<Ping, CountingHandler> for PingService {}

    #[tokio::test]
    async fn service_loop_answers_every_request() {
        let (tx, mut rx) = mpsc::channel(8);
        let seen = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler { seen: seen.clone() };

        tokio::spawn(async move {
            let mut service = PingService;
            service.run(handler, &mut rx).await;
        });

        let mut replies = Vec::new();
        for _ in 0..3 {
            let (response, reply) = oneshot::channel();
            tx.send(Ping { response }).await.expect("send");
            replies.push(reply);
        }
        for reply in replies {
            assert!(reply.await.expect("reply") >= 1);
        }
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn rejections_keep_their_meaning() {
        let err = repository_error(anyhow::Error::new(InvestmentRejection::InsufficientFunds {
            available: 10,
        }));
        assert!(matches!(err, ServiceError::InsufficientFunds(_)));

        let err = repository_error(anyhow::Error::new(InvestmentRejection::ExceedsGoal {
            remaining: 0,
        }));
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = repository_error(anyhow::Error::new(WalletRejection::AlreadyReviewed(
            "completed".to_string(),
        )));
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = repository_error(anyhow::anyhow!("connection reset"));
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
