use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;

/// Baseline permission set. It is attached to every request, anonymous or
/// signed-in, by the auth extractor.
pub const DEFAULT_PERMS: &[&str] = &["user.read", "org.read", "project.read"];

/// Permissions granted by the "admin" organization role.
const ORG_ADMIN_PERMS: &[&str] = &[
    "org.update",
    "orgmember.create",
    "orgmember.update",
    "orgmember.delete",
    "project.create",
    "project.update",
    "project.delete",
];

/// Static role policy: role name to granted permission set. The "self" role
/// marks the member owning the organization and grants the admin set; its
/// assignment is constrained by the member mutation endpoints, not here.
pub fn org_role_permissions(role: &str) -> &'static [&'static str] {
    match role {
        "admin" | "self" => ORG_ADMIN_PERMS,
        _ => &[],
    }
}

/// Whether any of `roles` grants `perm`.
pub fn org_roles_grant(roles: &[String], perm: &str) -> bool {
    roles
        .iter()
        .any(|role| org_role_permissions(role).contains(&perm))
}

/// True if the caller's global permission set already includes `perm`, or
/// the caller's membership roles in `organization_id` grant it.
pub async fn check_org_perm(
    pool: &PgPool,
    user_id: Option<Uuid>,
    global_perms: &[&str],
    organization_id: Uuid,
    perm: &str,
) -> Result<bool, sqlx::Error> {
    if global_perms.contains(&perm) {
        return Ok(true);
    }
    let Some(user_id) = user_id else {
        return Ok(false);
    };
    match db::organization_members::find_by_org_and_user(pool, organization_id, user_id).await? {
        Some(member) => Ok(org_roles_grant(&member.roles, perm)),
        None => Ok(false),
    }
}

pub async fn assert_org_perm(
    pool: &PgPool,
    user_id: Option<Uuid>,
    global_perms: &[&str],
    organization_id: Uuid,
    perm: &str,
) -> Result<(), AppError> {
    if check_org_perm(pool, user_id, global_perms, organization_id, perm).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "missing org permission: \"{perm}\""
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn admin_grants_member_management() {
        assert!(org_roles_grant(&roles(&["admin"]), "orgmember.delete"));
        assert!(org_roles_grant(&roles(&["admin"]), "org.update"));
    }

    #[test]
    fn self_inherits_admin() {
        for perm in ORG_ADMIN_PERMS {
            assert!(org_roles_grant(&roles(&["self"]), perm));
        }
    }

    #[test]
    fn plain_member_grants_nothing() {
        assert!(!org_roles_grant(&roles(&[]), "org.update"));
        assert!(!org_roles_grant(&roles(&["bystander"]), "orgmember.create"));
    }

    #[test]
    fn default_set_is_read_only() {
        assert!(DEFAULT_PERMS.iter().all(|p| p.ends_with(".read")));
    }
}
