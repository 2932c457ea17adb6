//! Well-known role name constants and the role ordering used for access checks.
//!
//! Roles are ordered from most to least privileged. A caller satisfies a
//! requirement when its role is at least as privileged as the required one.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_CONTRIBUTOR: &str = "contributor";
pub const ROLE_SUBSCRIBER: &str = "subscriber";

/// All known roles, most privileged first.
pub const ROLES_BY_PRIVILEGE: &[&str] = &[ROLE_ADMIN, ROLE_EDITOR, ROLE_CONTRIBUTOR, ROLE_SUBSCRIBER];

/// Position of `role` in [`ROLES_BY_PRIVILEGE`]; lower is more privileged.
pub fn role_rank(role: &str) -> Option<usize> {
    ROLES_BY_PRIVILEGE.iter().position(|r| *r == role)
}

/// Returns `true` when `role` does not meet `required`.
///
/// Unknown roles (on either side) are always forbidden.
pub fn is_forbidden(role: &str, required: &str) -> bool {
    match (role_rank(role), role_rank(required)) {
        (Some(have), Some(need)) => have > need,
        _ => true,
    }
}
