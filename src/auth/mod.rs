//! Session authentication for the PayDhan API.
//!
//! Credentials (password or PIN) are checked against argon2 hashes; a
//! successful sign-in issues a signed JWT that travels in an HTTP-only cookie.

pub mod extractor;
pub mod google;
pub mod password;
pub mod rate_limit;
pub mod session;

pub use extractor::CurrentUser;
pub use google::{GoogleOAuthClient, GoogleProfile};
pub use password::{hash_secret, verify_secret};
pub use rate_limit::RateLimiter;
pub use session::{SessionClaims, SessionManager, SESSION_COOKIE};
