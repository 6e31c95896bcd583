pub mod cookie;
pub mod jwt;
pub mod multipart;
pub mod password;
pub mod reset;

pub use jwt::{decode_session_token, encode_session_token};
pub use password::{hash_password, verify_password};
