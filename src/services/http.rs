use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::{
    earnings::EarningsRequest, investments::InvestmentRequest,
    notifications::NotificationRequest, projects::ProjectRequest, rewards::RewardRequest,
    users::UserRequest, wallets::WalletRequest, ServiceError,
};

mod earnings;
mod investments;
mod notifications;
mod projects;
mod rewards;
mod users;
mod wallets;

#[derive(Clone)]
pub struct Channels {
    pub users: mpsc::Sender<UserRequest>,
    pub projects: mpsc::Sender<ProjectRequest>,
    pub investments: mpsc::Sender<InvestmentRequest>,
    pub earnings: mpsc::Sender<EarningsRequest>,
    pub wallets: mpsc::Sender<WalletRequest>,
    pub rewards: mpsc::Sender<RewardRequest>,
    pub notifications: mpsc::Sender<NotificationRequest>,
}

#[derive(Clone)]
pub struct AppState {
    channels: Channels,
    cron_secret: [u8; 32],
    admin_secret: [u8; 32],
}

impl AppState {
    pub fn new(channels: Channels, cron_secret: &str, admin_secret: &str) -> Self {
        AppState {
            channels,
            cron_secret: digest(cron_secret),
            admin_secret: digest(admin_secret),
        }
    }

    fn authorize_cron(&self, headers: &HeaderMap) -> Result<(), ServiceError> {
        authorize(headers, &self.cron_secret)
    }

    fn authorize_admin(&self, headers: &HeaderMap) -> Result<(), ServiceError> {
        authorize(headers, &self.admin_secret)
    }
}

fn digest(secret: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(secret.as_bytes()));
    out
}

fn authorize(headers: &HeaderMap, expected: &[u8; 32]) -> Result<(), ServiceError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ServiceError::Unauthorized)?;

    if digest(token.trim()) == *expected {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// Sends a request to a service loop and waits for its reply.
async fn request<R, T>(
    channel: &mpsc::Sender<R>,
    service: &str,
    build: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> R,
) -> Result<T, ServiceError> {
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(build(response_tx))
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?;

    response_rx
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            ServiceError::InsufficientFunds(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
            }
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            ServiceError::Communication(_, _) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        };

        let details = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({"error": kind, "details": details}))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/users", post(users::register))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/referrals", get(users::get_referrals))
        .route("/users/{id}/investments", get(investments::list_investments))
        .route("/users/{id}/wallet", get(wallets::get_wallet))
        .route("/users/{id}/transactions", get(wallets::list_transactions))
        .route(
            "/users/{id}/daily-reward",
            get(rewards::reward_status).post(rewards::claim_reward),
        )
        .route(
            "/users/{id}/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/users/{id}/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .route(
            "/users/{id}/notifications/{notification_id}/read",
            post(notifications::mark_read),
        )
        .route("/projects", get(projects::list_projects))
        .route("/projects/{id}", get(projects::get_project))
        .route("/admin/projects", post(projects::create_project))
        .route("/admin/projects/{id}/close", post(projects::close_project))
        .route(
            "/admin/transactions/{id}/review",
            post(wallets::review_transaction),
        )
        .route("/investments", post(investments::invest))
        .route("/investments/{id}", get(investments::get_investment))
        .route("/deposits", post(wallets::deposit))
        .route("/withdrawals", post(wallets::withdraw))
        .route(
            "/cron/calculate-earnings",
            post(earnings::calculate_earnings),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    listen: &str,
    channels: Channels,
    cron_secret: &str,
    admin_secret: &str,
) -> Result<(), anyhow::Error> {
    let app = router(AppState::new(channels, cron_secret, admin_secret));

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{investments::EarningsReport, projects::InvestmentRejection};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const CRON: &str = "cron-secret";
    const ADMIN: &str = "admin-secret";

    #[allow(dead_code)]
    struct Receivers {
        users: mpsc::Receiver<UserRequest>,
        projects: mpsc::Receiver<ProjectRequest>,
        investments: mpsc::Receiver<InvestmentRequest>,
        earnings: mpsc::Receiver<EarningsRequest>,
        wallets: mpsc::Receiver<WalletRequest>,
        rewards: mpsc::Receiver<RewardRequest>,
        notifications: mpsc::Receiver<NotificationRequest>,
    }

    fn test_state() -> (AppState, Receivers) {
        let (users, users_rx) = mpsc::channel(4);
        let (projects, projects_rx) = mpsc::channel(4);
        let (investments, investments_rx) = mpsc::channel(4);
        let (earnings, earnings_rx) = mpsc::channel(4);
        let (wallets, wallets_rx) = mpsc::channel(4);
        let (rewards, rewards_rx) = mpsc::channel(4);
        let (notifications, notifications_rx) = mpsc::channel(4);

        let channels = Channels {
            users,
            projects,
            investments,
            earnings,
            wallets,
            rewards,
            notifications,
        };
        let receivers = Receivers {
            users: users_rx,
            projects: projects_rx,
            investments: investments_rx,
            earnings: earnings_rx,
            wallets: wallets_rx,
            rewards: rewards_rx,
            notifications: notifications_rx,
        };

        (AppState::new(channels, CRON, ADMIN), receivers)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: serde_json::Value, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn health_check() {
        let (state, _receivers) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cron_requires_secret() {
        let (state, mut receivers) = test_state();
        let response = router(state)
            .oneshot(post_json("/cron/calculate-earnings", json!({}), Some(ADMIN)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(receivers.earnings.try_recv().is_err());
        assert_eq!(body_json(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn cron_forwards_requested_date() {
        let (state, mut receivers) = test_state();
        tokio::spawn(async move {
            if let Some(EarningsRequest::CalculateEarnings { date, response }) =
                receivers.earnings.recv().await
            {
                let mut report = EarningsReport::new(date);
                report.processed = 3;
                let _ = response.send(Ok(report));
            }
        });

        let response = router(state)
            .oneshot(post_json(
                "/cron/calculate-earnings",
                json!({"date": "2026-03-02"}),
                Some(CRON),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["date"], "2026-03-02");
        assert_eq!(body["processed"], 3);
    }

    #[tokio::test]
    async fn cron_rejects_malformed_body() {
        let (state, _receivers) = test_state();
        let response = router(state)
            .oneshot(post_json(
                "/cron/calculate-earnings",
                json!({"date": "yesterday"}),
                Some(CRON),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn insufficient_funds_maps_to_unprocessable() {
        let (state, mut receivers) = test_state();
        tokio::spawn(async move {
            if let Some(InvestmentRequest::Invest { request, response }) =
                receivers.investments.recv().await
            {
                assert_eq!(request.amount, 50_000);
                let _ = response.send(Err(InvestmentRejection::InsufficientFunds {
                    available: 100,
                }
                .into()));
            }
        });

        let response = router(state)
            .oneshot(post_json(
                "/investments",
                json!({"user_id": "u1", "project_id": "p1", "amount": 50_000}),
                None,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "insufficient_funds");
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_validation_error() {
        let (state, mut receivers) = test_state();
        let response = router(state)
            .oneshot(post_json(
                "/investments",
                json!({"user_id": "u1", "project_id": "p1", "amount": "lots"}),
                None,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation");
        assert!(receivers.investments.try_recv().is_err());
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_rejected() {
        let (state, mut receivers) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/withdrawals")
                    .body(Body::from(
                        r#"{"user_id":"u1","amount":5000,"payment_method_id":"pm"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation");
        assert!(receivers.wallets.try_recv().is_err());
    }

    #[tokio::test]
    async fn bad_query_string_is_a_validation_error() {
        let (state, mut receivers) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/users/u1/transactions?limit=many")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation");
        assert!(receivers.wallets.try_recv().is_err());
    }

    #[tokio::test]
    async fn admin_routes_reject_cron_secret() {
        let (state, mut receivers) = test_state();
        let response = router(state)
            .oneshot(post_json(
                "/admin/projects",
                json!({
                    "name": "Wind",
                    "goal_amount": 100_000,
                    "min_investment": 1_000,
                    "daily_roi_bps": 100
                }),
                Some(CRON),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(receivers.projects.try_recv().is_err());
    }

    #[tokio::test]
    async fn stopped_service_is_unavailable() {
        let (state, receivers) = test_state();
        drop(receivers);

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/users/u1/wallet")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["details"], "Internal server error.");
    }

    #[tokio::test]
    async fn foreign_notification_is_not_found() {
        let (state, mut receivers) = test_state();
        tokio::spawn(async move {
            if let Some(NotificationRequest::MarkRead {
                user_id,
                notification_id,
                response,
            }) = receivers.notifications.recv().await
            {
                assert_eq!(user_id, "u1");
                let _ = response.send(Err(ServiceError::NotFound(format!(
                    "Notification {}",
                    notification_id
                ))));
            }
        });

        let response = router(state)
            .oneshot(post_json("/users/u1/notifications/n9/read", json!({}), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn authorize_accepts_matching_bearer_only() {
        let expected = digest("s3cret");
        let mut headers = HeaderMap::new();
        assert!(authorize(&headers, &expected).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer s3cret".parse().expect("header"));
        assert!(authorize(&headers, &expected).is_ok());

        headers.insert(header::AUTHORIZATION, "Basic s3cret".parse().expect("header"));
        assert!(authorize(&headers, &expected).is_err());
    }

    #[test]
    fn report_date_serializes_as_iso_day() {
        let report = EarningsReport::new(NaiveDate::from_ymd_opt(2026, 1, 31).expect("date"));
        assert_eq!(serde_json::to_value(&report).expect("json")["date"], "2026-01-31");
    }
}
