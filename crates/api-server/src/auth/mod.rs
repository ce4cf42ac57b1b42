//! Session tokens, password hashing and request identity.

mod jwt;
mod password;
mod session;

pub use jwt::TokenService;
pub use password::{
    generate_reset_token, hash_password, validate_email, validate_password, verify_password,
};
pub use session::{clear_session_cookie, require_admin, require_auth, session_cookie};
