use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::{
        referrals::ReferralSummary,
        transactions::TransactionKind,
        users::{self, NewUser},
    },
    repositories::{
        referrals::ReferralRepository, transactions::TransactionRepository,
        users::UserRepository,
    },
};

pub enum UserRequest {
    CreateUser {
        user: NewUser,
        response: oneshot::Sender<Result<users::User, ServiceError>>,
    },
    GetUser {
        id: String,
        response: oneshot::Sender<Result<users::User, ServiceError>>,
    },
    GetReferrals {
        id: String,
        response: oneshot::Sender<Result<ReferralSummary, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
    referrals: ReferralRepository,
    transactions: TransactionRepository,
}

impl UserRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        UserRequestHandler {
            repository: UserRepository::new(sql_conn.clone()),
            referrals: ReferralRepository::new(sql_conn.clone()),
            transactions: TransactionRepository::new(sql_conn),
        }
    }

    async fn create_user(&self, new_user: NewUser) -> Result<users::User, ServiceError> {
        new_user.validate().map_err(ServiceError::Validation)?;
        let email = new_user.normalized_email();

        let existing = self
            .repository
            .get_user_by_email(&email)
            .await
            .map_err(repository_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }

        let referrer = match new_user.normalized_referral_code() {
            Some(code) => {
                let referrer = self
                    .repository
                    .get_user_by_referral_code(&code)
                    .await
                    .map_err(repository_error)?;
                match referrer {
                    Some(referrer) => Some(referrer),
                    None => {
                        return Err(ServiceError::Validation(format!(
                            "Unknown referral code: {}",
                            code
                        )))
                    }
                }
            }
            None => None,
        };

        let user = self
            .repository
            .insert_user(&email, &new_user.full_name, referrer.as_ref())
            .await
            .map_err(repository_error)?;

        log::info!(
            "Registered user {} (referred by {:?}).",
            user.id,
            user.referred_by
        );
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<users::User, ServiceError> {
        self.repository
            .get_user_by_id(id)
            .await
            .map_err(repository_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", id)))
    }

    async fn get_referrals(&self, id: &str) -> Result<ReferralSummary, ServiceError> {
        let user = self.get_user(id).await?;

        let referrals = self
            .referrals
            .list_referred(&user.id)
            .await
            .map_err(repository_error)?;
        let total_commissions = self
            .transactions
            .sum_completed(&user.id, TransactionKind::ReferralCommission.as_str())
            .await
            .map_err(repository_error)?;

        Ok(ReferralSummary {
            referral_code: user.referral_code,
            referrals,
            total_commissions,
        })
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::CreateUser { user, response } => {
                let user = self.create_user(user).await;
                let _ = response.send(user);
            }
            UserRequest::GetUser { id, response } => {
                let user = self.get_user(&id).await;
                let _ = response.send(user);
            }
            UserRequest::GetReferrals { id, response } => {
                let summary = self.get_referrals(&id).await;
                let _ = response.send(summary);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}
