//! Session tokens, password hashing and role checks.

mod middleware;
mod password;
pub mod permission;
mod session;
mod token;

pub use middleware::require_session;
pub use password::{hash_password, verify_password};
pub use permission::check_permission;
pub use session::{LoginResponse, SessionService, UserInfo};
pub use token::{token_from_headers, Claims, IssuedToken, TokenService, TOKEN_HEADER};
