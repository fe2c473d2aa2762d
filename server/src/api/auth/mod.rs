//! Authentication and role gating
//!
//! `require_auth` verifies the bearer token and attaches an `Identity`;
//! `require_roles` runs after it and checks the identity's role.

mod extractors;
mod identity;
pub mod middleware;
pub mod token;

pub use extractors::{AdminOnly, Authorized, RolePolicy, Staff};
pub use identity::{Identity, ParseRoleError, Role, RoleSet};
pub use middleware::{AuthGate, GateError, RoleGate, require_auth, require_roles};
pub use token::{Claims, TokenError, TokenKeys};
