use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
	#[error("model not loaded: {0}")]
	Unavailable(String),
	#[error("invalid image: {0}")]
	InvalidImage(#[from] image::ImageError),
	#[error("failed to load model from {path}: {reason}")]
	ModelLoad { path: PathBuf, reason: String },
	#[error("inference error: {0}")]
	Inference(String),
	#[error("no probabilities returned from model")]
	NoProbabilities,
}
