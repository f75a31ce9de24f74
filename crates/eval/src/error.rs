use std::path::PathBuf;

use damage_classification::ClassifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
	#[error("cannot find dataset folders, tried: {candidates:?}")]
	DatasetNotFound { candidates: Vec<PathBuf> },
	#[error("no test images found")]
	NoSamples,
	#[error("no images were successfully evaluated")]
	NothingScored,
	#[error(transparent)]
	Classifier(#[from] ClassifyError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
