//! Session resolver adapters.
//!
//! - `jwt` - validates HS256 bearer tokens from the external identity
//!   provider
//! - `fixed` - deterministic resolver for tests and local development

mod fixed;
mod jwt;

pub use fixed::FixedSessionResolver;
pub use jwt::JwtSessionResolver;
