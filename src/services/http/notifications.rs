use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::{request, AppState};
use crate::models::notifications::{Notification, NotificationFilter};
use crate::services::{notifications::NotificationRequest, ServiceError};

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<NotificationFilter>, QueryRejection>,
) -> Result<Json<Vec<Notification>>, ServiceError> {
    let Query(filter) = query?;
    let notifications = request(
        &state.channels.notifications,
        "NotificationService",
        |response| NotificationRequest::List {
            user_id,
            unread_only: filter.unread,
            response,
        },
    )
    .await?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, notification_id)): Path<(String, String)>,
) -> Result<Json<Value>, ServiceError> {
    request(
        &state.channels.notifications,
        "NotificationService",
        |response| NotificationRequest::MarkRead {
            user_id,
            notification_id: notification_id.clone(),
            response,
        },
    )
    .await?;

    Ok(Json(json!({"id": notification_id, "read": true})))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let updated = request(
        &state.channels.notifications,
        "NotificationService",
        |response| NotificationRequest::MarkAllRead { user_id, response },
    )
    .await?;

    Ok(Json(json!({"updated": updated})))
}
