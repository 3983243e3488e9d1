use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TYPE_LOCAL: &str = "local";
pub const TYPE_GOOGLE: &str = "google";

/// Identity credential record. One per (user, type). Exactly one refresh
/// token value is valid at a time; it is stored hashed and rotated on every
/// successful sign-in or refresh.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub account_type: String,
    pub active: bool,
    pub user_id: Uuid,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing, default)]
    pub provider_sub: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token_hash: Option<String>,
    pub registered: DateTime<Utc>,
    pub last_signin: Option<DateTime<Utc>>,
}
