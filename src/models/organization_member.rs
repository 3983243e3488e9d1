use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join entity between organizations and users. `roles` is an unordered set
/// of role strings ("admin", "self").
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMember {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub roles: Vec<String>,
}
