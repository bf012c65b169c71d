mod auth;
mod health_check;

pub use auth::{current_identity, login, logout, logout_all, refresh};
pub use health_check::health_check;
