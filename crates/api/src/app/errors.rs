use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockalert_core::DomainError;
use stockalert_inventory::{CatalogError, UpstreamDataError};

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

/// Data-source failures are logged here and surface as a generic 500.
pub fn upstream_error_to_response(err: UpstreamDataError) -> axum::response::Response {
    tracing::error!(error = %err, "upstream data failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "upstream_error",
        "inventory data source unavailable",
    )
}

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::Domain(e) => domain_error_to_response(e),
        CatalogError::Upstream(e) => upstream_error_to_response(e),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn upstream_errors_are_internal() {
        let res = catalog_error_to_response(UpstreamDataError::query("down").into());
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
