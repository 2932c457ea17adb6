//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireEditor`] -- Requires `editor` or a more privileged role.
//! - [`rbac::RequireContributor`] -- Requires `contributor` or better.

pub mod auth;
pub mod rbac;
