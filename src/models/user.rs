use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Unique pseudo, shared with the user's self organization.
    pub name: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}
