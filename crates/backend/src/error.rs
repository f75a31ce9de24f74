use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error surfaced to the HTTP caller as a status code plus a detail message.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	detail: String,
}

impl ApiError {
	pub fn bad_request(detail: impl Into<String>) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			detail: detail.into(),
		}
	}

	pub fn internal(detail: impl Into<String>) -> Self {
		Self {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			detail: detail.into(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(json!({ "detail": self.detail }))).into_response()
	}
}
