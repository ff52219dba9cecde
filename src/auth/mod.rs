//! Authentication and authorization.
//!
//! # Data Flow
//! ```text
//! authorization header
//!     → token.rs (HS256 verify: signature + expiry)
//!     → authenticator.rs (account lookup, Principal construction)
//!     → authorize.rs (role/scope check against the endpoint policy)
//! ```

pub mod authenticator;
pub mod authorize;
pub mod token;

pub use authenticator::{bearer_token, Authenticator};
pub use authorize::is_authorized;
pub use token::{Claims, TokenVerifier};
