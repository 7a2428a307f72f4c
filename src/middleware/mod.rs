pub mod auth;
pub mod ownership;

pub use auth::AuthUser;
