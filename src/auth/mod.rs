use axum::Router;

use crate::state::AppState;

pub mod claims;
pub(crate) mod current_user;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use current_user::CurrentUser;

pub fn router() -> Router<AppState> {
    handlers::router()
}
