//! Authentication primitives.
//!
//! Tokens are issued by the surrounding identity service; this server only
//! verifies them. [`jwt::generate_access_token`] exists for tooling and tests
//! that share the signing secret.

pub mod jwt;
