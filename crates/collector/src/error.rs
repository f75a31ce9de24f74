use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
	#[error("missing credential: set {0}")]
	MissingCredentials(&'static str),
	#[error("http error: {0}")]
	Http(#[from] reqwest::Error),
	#[error("search returned status {0}")]
	SearchStatus(reqwest::StatusCode),
	#[error("image decode error: {0}")]
	Decode(#[from] image::ImageError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
