//! HTTP adapter - axum routers, handlers, and DTOs.

mod dto;
mod handlers;
mod routes;

pub use handlers::{AppState, AuthenticatedUser};
pub use routes::api_router;
