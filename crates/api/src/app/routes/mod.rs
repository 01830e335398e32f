use axum::Router;

pub mod alerts;
pub mod products;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/companies", alerts::router())
        .nest("/products", products::router())
}
