//! Creates in-app notification rows for tenants and managers.

use db::models::notification::Notification;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

pub struct NotificationService;

impl NotificationService {
    pub async fn notify_user(
        pool: &SqlitePool,
        user_id: Uuid,
        titre: &str,
        message: &str,
        lien: Option<&str>,
    ) -> Result<Notification, sqlx::Error> {
        let notification = Notification::create(pool, user_id, titre, message, lien).await?;
        info!(
            user_id = %user_id,
            notification_id = %notification.id,
            titre = titre,
            "notification created"
        );
        Ok(notification)
    }
}
