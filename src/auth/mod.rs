use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod password;
pub mod services;

pub use password::Hasher;
pub use services::CredentialManager;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
