//! Authentication and role capabilities
//!
//! - [`jwt`]: HS256 session tokens
//! - [`middleware`]: `require_auth`, injects [`CurrentUser`]
//! - [`capability`]: role → capability mapping and list scoping

pub mod capability;
pub mod jwt;
pub mod middleware;

pub use capability::{Capability, CurrentUser, ListScope};
pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::require_auth;
