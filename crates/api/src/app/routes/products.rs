use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/", post(create_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "missing_fields", rejection.body_text());
        }
    };

    let new_product = match body.into_new_product() {
        Ok(p) => p,
        Err(missing) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "missing_fields",
                format!("missing required fields: {}", missing.join(", ")),
            );
        }
    };

    let validated = match new_product.validate() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_product(validated).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(dto::ProductCreatedResponse::new(created.product_id)),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
