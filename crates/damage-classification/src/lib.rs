pub mod classifier;
pub mod error;
pub mod image_ops;
pub mod labels;
pub mod model;

pub use classifier::{Classifier, InferenceBackend, Prediction, Score};
pub use error::ClassifyError;
pub use labels::{LabelTable, DEFAULT_CLASSES};
