//! Authentication: password hashing, JWT minting/verification, and the
//! session/token lifecycle (issue, rotate, revoke).

pub mod jwt;
pub mod password;
pub mod queries;
pub mod tokens;

pub use jwt::{AccessClaims, TokenSecrets};
pub use tokens::TokenPair;
