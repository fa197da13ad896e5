//! Authentication primitives and request gating

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod random;

pub use jwt::{Claims, IssuedToken, TokenError, TokenIssuer};
pub use middleware::{extract_bearer_token, extract_cookie, require_auth, CurrentUser};
pub use password::PasswordHasher;
pub use random::RandomTokenGenerator;
