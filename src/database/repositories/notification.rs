//! Notification repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification};
use crate::models::Role;
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, recipient_role, title, body, kind, data, is_read, created_at";

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, notification: &NewNotification) -> Result<Notification> {
        let stored = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, recipient_role, title, body, kind, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.recipient_id)
        .bind(notification.recipient_role)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.kind)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Store the same notification for many recipients of one role
    pub async fn create_for_all(
        &self,
        recipients: &[Uuid],
        role: Role,
        kind: &str,
        title: &str,
        body: &str,
    ) -> Result<u64> {
        if recipients.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, recipient_role, title, body, kind)
            SELECT recipient, $2, $3, $4, $5 FROM UNNEST($1::uuid[]) AS recipient
            "#,
        )
        .bind(recipients)
        .bind(role)
        .bind(title)
        .bind(body)
        .bind(kind)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn list(
        &self,
        recipient_id: Uuid,
        role: Role,
        unread_only: bool,
        page: Pagination,
    ) -> Result<(Vec<Notification>, i64)> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient_id = $1 AND recipient_role = $2 AND (NOT $3 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(recipient_id)
        .bind(role)
        .bind(unread_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND recipient_role = $2 AND (NOT $3 OR NOT is_read)",
        )
        .bind(recipient_id)
        .bind(role)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        Ok((notifications, total))
    }

    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid, role: Role) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2 AND recipient_role = $3
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(recipient_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("notification", id))
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid, role: Role) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND recipient_role = $2 AND NOT is_read",
        )
        .bind(recipient_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: Uuid, recipient_id: Uuid, role: Role) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE id = $1 AND recipient_id = $2 AND recipient_role = $3",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("notification", id));
        }
        Ok(())
    }
}
