use sqlx::{PgConnection, PgPool};

use crate::models::{
    new_id,
    notifications::{NewNotification, Notification},
};

#[derive(Clone)]
pub struct NotificationRepository {
    conn: PgPool,
}

impl NotificationRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Notification>, anyhow::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = false)
            ORDER BY created_at DESC
            LIMIT 200"#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.conn)
        .await?;

        Ok(notifications)
    }

    /// Returns false when the notification does not exist or belongs to someone else.
    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<bool, anyhow::Error> {
        let result =
            sqlx::query("UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2")
                .bind(notification_id)
                .bind(user_id)
                .execute(&self.conn)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64, anyhow::Error> {
        let result =
            sqlx::query("UPDATE notifications SET read = true WHERE user_id = $1 AND read = false")
                .bind(user_id)
                .execute(&self.conn)
                .await?;

        Ok(result.rows_affected())
    }
}

pub async fn insert_notification(
    conn: &mut PgConnection,
    new: &NewNotification,
) -> Result<Notification, anyhow::Error> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"INSERT INTO notifications (id, user_id, title, message, kind)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"#,
    )
    .bind(new_id())
    .bind(&new.user_id)
    .bind(&new.title)
    .bind(&new.message)
    .bind(new.kind)
    .fetch_one(conn)
    .await?;

    Ok(notification)
}
