//! Authentication and authorization.
//!
//! - [`JwtService`] issues and validates bearer tokens
//! - [`password`] hashes and verifies passwords, and generates secrets
//! - [`require_auth`] / [`require_admin`] gate router groups
//! - [`CurrentUser`] is the identity the gate hands to handlers

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use extractor::{ClientIp, CurrentUser};
pub use jwt::{Claims, JwtService};
pub use middleware::{require_admin, require_auth};
