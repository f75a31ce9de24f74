use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use damage_classification::{image_ops, Classifier, Prediction};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(classifier: Arc<Classifier>) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/detect", post(detect))
		.layer(DefaultBodyLimit::max(BODY_LIMIT))
		.layer(CorsLayer::permissive())
		.with_state(classifier)
}

async fn root() -> Json<Value> {
	Json(json!({ "status": "ok", "message": "DetectoAI backend running" }))
}

async fn detect(
	State(classifier): State<Arc<Classifier>>,
	mut multipart: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
	if let Some(reason) = classifier.unavailable_reason() {
		return Err(ApiError::internal(format!("Model not loaded on server: {reason}")));
	}

	let mut upload = None;
	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
	{
		if field.name() == Some("file") {
			let content_type = field.content_type().map(str::to_owned);
			let bytes = field
				.bytes()
				.await
				.map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
			upload = Some((content_type, bytes));
			break;
		}
	}

	let (content_type, bytes) = upload.ok_or_else(|| ApiError::bad_request("Missing file field"))?;

	// Content type gate comes before any decode or inference work.
	match content_type.as_deref() {
		Some(ct) if ct.starts_with("image/") => {}
		_ => return Err(ApiError::bad_request("File must be an image")),
	}

	let image = image_ops::decode(&bytes).map_err(|_| ApiError::bad_request("Invalid image file"))?;

	let prediction = classifier
		.predict(&image)
		.map_err(|e| ApiError::internal(format!("Inference error: {e}")))?;

	Ok(Json(DetectResponse::from(prediction)))
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
	detections: Vec<Detection>,
	meta: DetectMeta,
}

#[derive(Debug, Serialize)]
struct Detection {
	label: String,
	confidence: f32,
}

#[derive(Debug, Serialize)]
struct DetectMeta {
	top1_index: usize,
	top1_label: String,
	top1_confidence: f32,
}

impl From<Prediction> for DetectResponse {
	fn from(prediction: Prediction) -> Self {
		Self {
			detections: vec![Detection {
				label: prediction.label.clone(),
				confidence: prediction.confidence,
			}],
			meta: DetectMeta {
				top1_index: prediction.class_index,
				top1_label: prediction.label,
				top1_confidence: prediction.confidence,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::{to_bytes, Body};
	use axum::http::{header, Request, StatusCode};
	use burn::backend::ndarray::NdArrayDevice;
	use damage_classification::model::DamageClassConfig;
	use damage_classification::{LabelTable, DEFAULT_CLASSES};
	use tower::ServiceExt;

	const BOUNDARY: &str = "detecto-test-boundary";

	fn ready_router() -> Router {
		let device = NdArrayDevice::default();
		let classifier = Classifier::from_parts(
			DamageClassConfig::default().init(&device),
			LabelTable::from(&DEFAULT_CLASSES[..]),
		);
		router(Arc::new(classifier))
	}

	fn multipart_body(field_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
		let mut body = Vec::new();
		body.extend_from_slice(
			format!(
				"--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
				 filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
			)
			.as_bytes(),
		);
		body.extend_from_slice(bytes);
		body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
		body
	}

	fn detect_request(field_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
		Request::post("/detect")
			.header(
				header::CONTENT_TYPE,
				format!("multipart/form-data; boundary={BOUNDARY}"),
			)
			.body(Body::from(multipart_body(field_name, content_type, bytes)))
			.unwrap()
	}

	fn png_bytes() -> Vec<u8> {
		let image = image::DynamicImage::new_rgb8(32, 32);
		let mut cursor = std::io::Cursor::new(Vec::new());
		image.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
		cursor.into_inner()
	}

	async fn body_json(response: axum::response::Response) -> Value {
		let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn liveness_probe() {
		let response = ready_router()
			.oneshot(Request::get("/").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let body = body_json(response).await;
		assert_eq!(body["status"], "ok");
	}

	#[tokio::test]
	async fn detect_returns_exactly_one_detection() {
		let response = ready_router()
			.oneshot(detect_request("file", "image/png", &png_bytes()))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);

		let body = body_json(response).await;
		let detections = body["detections"].as_array().unwrap();
		assert_eq!(detections.len(), 1);

		let confidence = detections[0]["confidence"].as_f64().unwrap();
		assert!((0.0..=1.0).contains(&confidence));

		let label = detections[0]["label"].as_str().unwrap();
		assert!(DEFAULT_CLASSES.contains(&label));
		assert_eq!(body["meta"]["top1_label"], detections[0]["label"]);
	}

	#[tokio::test]
	async fn non_image_content_type_is_rejected() {
		let response = ready_router()
			.oneshot(detect_request("file", "text/plain", b"hello"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn undecodable_bytes_are_rejected_despite_declared_type() {
		let response = ready_router()
			.oneshot(detect_request("file", "image/png", b"not actually a png"))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn missing_file_field_is_rejected() {
		let response = ready_router()
			.oneshot(detect_request("other", "image/png", &png_bytes()))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn unloaded_model_is_a_server_error() {
		let app = router(Arc::new(Classifier::unavailable("artifact missing")));
		let response = app
			.oneshot(detect_request("file", "image/png", &png_bytes()))
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
