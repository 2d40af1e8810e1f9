use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod services;

pub use services::AccountManager;

pub fn router() -> Router<AppState> {
    handlers::account_routes()
}
