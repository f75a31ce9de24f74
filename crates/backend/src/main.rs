use std::env;
use std::net::Ipv4Addr;
use std::sync::Arc;

use damage_classification::Classifier;
use log::{info, warn};
use simple_logger::SimpleLogger;

mod error;
mod routes;

const DEFAULT_MODEL_DIR: &str = "results/damage_cls";
const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() {
	SimpleLogger::new().init().unwrap();

	let model_dir = env::var("MODEL_DIR").unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string());
	let classifier = Arc::new(Classifier::load(&model_dir));
	if let Some(reason) = classifier.unavailable_reason() {
		// Every /detect request will answer 500; there is no per-request reload.
		warn!("serving without a model: {reason}");
	}

	let port = env::var("PORT")
		.ok()
		.and_then(|p| p.parse().ok())
		.unwrap_or(DEFAULT_PORT);

	let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
		.await
		.expect("failed to bind server port");

	info!("listening on 0.0.0.0:{port}");
	axum::serve(listener, routes::router(classifier))
		.await
		.expect("server error");
}
