/// Google Cloud authentication
pub mod auth;
pub mod types;

pub use auth::{AuthError, Credentials, TokenProvider};
