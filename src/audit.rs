use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde_json::Value;
use uuid::Uuid;

use crate::{entity::audit_logs::ActiveModel as AuditActive, error::AppResult};

pub const RESOURCE_ORDERS: &str = "orders";
pub const RESOURCE_USERS: &str = "users";

pub async fn log_audit<C: ConnectionTrait>(
    conn: &C,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    AuditActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        action: Set(action.to_string()),
        resource: Set(resource.map(str::to_string)),
        metadata: Set(metadata),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}

/// Records an event on `resource`; failures are logged and swallowed so the
/// mutation that already committed is still reported as a success.
pub async fn record_event<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    action: &str,
    resource: &str,
    metadata: Value,
) {
    if let Err(err) = log_audit(conn, Some(user_id), action, Some(resource), Some(metadata)).await {
        tracing::warn!(error = %err, action, resource, "audit log failed");
    }
}

pub async fn record_order_event<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    action: &str,
    metadata: Value,
) {
    record_event(conn, user_id, action, RESOURCE_ORDERS, metadata).await;
}

pub async fn record_user_event<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    action: &str,
    metadata: Value,
) {
    record_event(conn, user_id, action, RESOURCE_USERS, metadata).await;
}
