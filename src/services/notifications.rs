use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{repository_error, RequestHandler, Service, ServiceError};
use crate::{
    models::notifications::Notification,
    repositories::notifications::NotificationRepository,
};

pub enum NotificationRequest {
    List {
        user_id: String,
        unread_only: bool,
        response: oneshot::Sender<Result<Vec<Notification>, ServiceError>>,
    },
    MarkRead {
        user_id: String,
        notification_id: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    MarkAllRead {
        user_id: String,
        response: oneshot::Sender<Result<u64, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct NotificationRequestHandler {
    repository: NotificationRepository,
}

impl NotificationRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        NotificationRequestHandler {
            repository: NotificationRepository::new(sql_conn),
        }
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<(), ServiceError> {
        let updated = self
            .repository
            .mark_read(user_id, notification_id)
            .await
            .map_err(repository_error)?;

        if updated {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!(
                "Notification {}",
                notification_id
            )))
        }
    }
}

#[async_trait]
impl RequestHandler<NotificationRequest> for NotificationRequestHandler {
    async fn handle_request(&self, request: NotificationRequest) {
        match request {
            NotificationRequest::List {
                user_id,
                unread_only,
                response,
            } => {
                let notifications = self
                    .repository
                    .list_for_user(&user_id, unread_only)
                    .await
                    .map_err(repository_error);
                let _ = response.send(notifications);
            }
            NotificationRequest::MarkRead {
                user_id,
                notification_id,
                response,
            } => {
                let result = self.mark_read(&user_id, &notification_id).await;
                let _ = response.send(result);
            }
            NotificationRequest::MarkAllRead { user_id, response } => {
                let count = self
                    .repository
                    .mark_all_read(&user_id)
                    .await
                    .map_err(repository_error);
                let _ = response.send(count);
            }
        }
    }
}

pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        NotificationService {}
    }
}

#[async_trait]
impl Service<NotificationRequest, NotificationRequestHandler> for NotificationService {}
