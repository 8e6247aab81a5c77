//! Well-known role name constants.
//!
//! These must match the `ck_users_role` check constraint on the `users` table.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Check whether a role name is one the system recognises.
pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_USER
}
