//! Well-known account role names carried in access tokens.
//!
//! These are authorization roles, not the recruiting roles on a profile
//! (see [`crate::journey::snapshot::ProfileRole`]).

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";
