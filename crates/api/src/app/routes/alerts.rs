use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockalert_core::CompanyId;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new().route("/:company_id/alerts/low-stock", get(low_stock_alerts))
}

pub async fn low_stock_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(company_id): Path<String>,
) -> axum::response::Response {
    let company_id: CompanyId = match company_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.alerts.compute_low_stock_alerts(company_id).await {
        Ok(alerts) => (StatusCode::OK, Json(dto::LowStockAlertsResponse::from(alerts))).into_response(),
        Err(e) => errors::upstream_error_to_response(e),
    }
}
