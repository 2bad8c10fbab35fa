//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token validation. Tokens are issued by the
//!   OneShot identity service; [`jwt::generate_access_token`] exists for
//!   tooling and tests that need to mint one with the shared secret.

pub mod jwt;
