use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Set when this organization was auto-created for a user at
    /// registration (the user's personal namespace).
    pub self_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
