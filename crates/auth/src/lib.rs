//! `muhasib-auth` — pure authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! issuance/validation happens upstream, and the core trusts the resolved
//! `Principal` it is handed. The only checks enforced here are organization
//! match and role/permission policy.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::{Role, default_role_permissions};
