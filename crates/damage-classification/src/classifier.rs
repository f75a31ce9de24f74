use std::path::Path;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use burn::config::Config;
use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::activation::softmax;
use image::DynamicImage;
use log::{error, info};
use serde::Serialize;

use crate::error::ClassifyError;
use crate::image_ops;
use crate::labels::LabelTable;
use crate::model::{DamageClassConfig, DamageClassModel};

pub type InferenceBackend = NdArray;

/// Classifier service object: either a loaded model plus its label table,
/// or a typed unavailable state fixed at startup. The loaded model is
/// read-only, so one instance can be shared across concurrent requests.
pub struct Classifier {
	state: ClassifierState,
	device: NdArrayDevice,
}

enum ClassifierState {
	Ready {
		model: DamageClassModel<InferenceBackend>,
		labels: LabelTable,
	},
	Unavailable {
		reason: String,
	},
}

impl Classifier {
	/// Load the artifact directory (`config.json` + `model.mpk`) once at
	/// process start. A failed load is not a panic: it produces a classifier
	/// that answers every prediction with [`ClassifyError::Unavailable`].
	pub fn load<A: AsRef<Path>>(artifact_dir: A) -> Self {
		let device = NdArrayDevice::default();
		match Self::try_load(artifact_dir.as_ref(), &device) {
			Ok(state) => {
				info!("model loaded from {}", artifact_dir.as_ref().display());
				Self { state, device }
			}
			Err(e) => {
				error!("{e}");
				Self {
					state: ClassifierState::Unavailable { reason: e.to_string() },
					device,
				}
			}
		}
	}

	fn try_load(artifact_dir: &Path, device: &NdArrayDevice) -> Result<ClassifierState, ClassifyError> {
		let config = DamageClassConfig::load(artifact_dir.join("config.json")).map_err(|e| {
			ClassifyError::ModelLoad {
				path: artifact_dir.to_path_buf(),
				reason: e.to_string(),
			}
		})?;

		let model = config
			.init::<InferenceBackend>(device)
			.load_file(artifact_dir.join("model"), &CompactRecorder::new(), device)
			.map_err(|e| ClassifyError::ModelLoad {
				path: artifact_dir.to_path_buf(),
				reason: e.to_string(),
			})?;

		Ok(ClassifierState::Ready {
			model,
			labels: LabelTable::new(config.labels),
		})
	}

	/// Build a classifier from an already constructed model.
	pub fn from_parts(model: DamageClassModel<InferenceBackend>, labels: LabelTable) -> Self {
		Self {
			state: ClassifierState::Ready { model, labels },
			device: NdArrayDevice::default(),
		}
	}

	pub fn unavailable(reason: impl Into<String>) -> Self {
		Self {
			state: ClassifierState::Unavailable { reason: reason.into() },
			device: NdArrayDevice::default(),
		}
	}

	pub fn unavailable_reason(&self) -> Option<&str> {
		match &self.state {
			ClassifierState::Unavailable { reason } => Some(reason),
			ClassifierState::Ready { .. } => None,
		}
	}

	pub fn labels(&self) -> Option<&LabelTable> {
		match &self.state {
			ClassifierState::Ready { labels, .. } => Some(labels),
			ClassifierState::Unavailable { .. } => None,
		}
	}

	pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifyError> {
		let image = image_ops::decode(bytes)?;
		self.predict(&image)
	}

	/// Run one image through the model and rank every class by probability.
	pub fn predict(&self, image: &DynamicImage) -> Result<Prediction, ClassifyError> {
		let (model, labels) = match &self.state {
			ClassifierState::Ready { model, labels } => (model, labels),
			ClassifierState::Unavailable { reason } => {
				return Err(ClassifyError::Unavailable(reason.clone()))
			}
		};

		let input = image_ops::to_tensor::<InferenceBackend>(image_ops::normalize(image), &self.device);
		let logits = model.forward(input.unsqueeze::<4>());
		let probabilities = softmax(logits, 1)
			.into_data()
			.to_vec::<f32>()
			.map_err(|e| ClassifyError::Inference(format!("{e:?}")))?;

		Prediction::from_probabilities(&probabilities, labels)
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct Score {
	pub label: String,
	pub confidence: f32,
}

/// Top-1 prediction plus the full descending ranking, so callers can take
/// whatever prefix they need (the backend reports top-1, the evaluation
/// harness keeps top-3).
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
	pub class_index: usize,
	pub label: String,
	pub confidence: f32,
	pub ranking: Vec<Score>,
}

impl Prediction {
	pub fn from_probabilities(probabilities: &[f32], labels: &LabelTable) -> Result<Self, ClassifyError> {
		if probabilities.is_empty() || labels.is_empty() {
			return Err(ClassifyError::NoProbabilities);
		}

		let mut order: Vec<usize> = (0..probabilities.len()).collect();
		order.sort_by(|a, b| probabilities[*b].total_cmp(&probabilities[*a]));

		let ranking: Vec<Score> = order
			.iter()
			.map(|&i| Score {
				label: class_label(labels, i),
				confidence: probabilities[i],
			})
			.collect();

		Ok(Self {
			class_index: order[0],
			label: ranking[0].label.clone(),
			confidence: ranking[0].confidence,
			ranking,
		})
	}

	pub fn top(&self, n: usize) -> &[Score] {
		&self.ranking[..n.min(self.ranking.len())]
	}
}

// A model head wider than its label table keeps the extra indices visible
// instead of dropping them.
fn class_label(labels: &LabelTable, index: usize) -> String {
	labels
		.get(index)
		.map(str::to_string)
		.unwrap_or_else(|| format!("class_{index}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::labels::DEFAULT_CLASSES;

	fn table() -> LabelTable {
		LabelTable::from(&DEFAULT_CLASSES[..])
	}

	#[test]
	fn ranking_is_descending() {
		let prediction = Prediction::from_probabilities(&[0.1, 0.6, 0.05, 0.25], &table()).unwrap();
		assert_eq!(prediction.label, "dent");
		assert_eq!(prediction.class_index, 1);
		assert!((prediction.confidence - 0.6).abs() < 1e-6);

		let labels: Vec<&str> = prediction.ranking.iter().map(|s| s.label.as_str()).collect();
		assert_eq!(labels, vec!["dent", "scratch", "crack", "pristine"]);
		for pair in prediction.ranking.windows(2) {
			assert!(pair[0].confidence >= pair[1].confidence);
		}
	}

	#[test]
	fn empty_output_is_an_error() {
		assert!(matches!(
			Prediction::from_probabilities(&[], &table()),
			Err(ClassifyError::NoProbabilities)
		));
		assert!(matches!(
			Prediction::from_probabilities(&[1.0], &LabelTable::new(vec![])),
			Err(ClassifyError::NoProbabilities)
		));
	}

	#[test]
	fn out_of_table_index_keeps_a_synthetic_label() {
		let prediction = Prediction::from_probabilities(&[0.1, 0.1, 0.1, 0.1, 0.6], &table()).unwrap();
		assert_eq!(prediction.label, "class_4");
	}

	#[test]
	fn top_prefix_is_capped() {
		let prediction = Prediction::from_probabilities(&[0.5, 0.3, 0.1, 0.1], &table()).unwrap();
		assert_eq!(prediction.top(3).len(), 3);
		assert_eq!(prediction.top(10).len(), 4);
	}

	#[test]
	fn unavailable_classifier_rejects_predictions() {
		let classifier = Classifier::unavailable("no artifact");
		let image = DynamicImage::new_rgb8(8, 8);
		assert!(matches!(
			classifier.predict(&image),
			Err(ClassifyError::Unavailable(_))
		));
	}

	#[test]
	fn fresh_model_produces_one_valid_distribution() {
		use crate::model::DamageClassConfig;
		use burn::backend::ndarray::NdArrayDevice;

		let device = NdArrayDevice::default();
		let classifier = Classifier::from_parts(DamageClassConfig::default().init(&device), table());

		let image = DynamicImage::new_rgb8(64, 64);
		let prediction = classifier.predict(&image).unwrap();

		assert_eq!(prediction.ranking.len(), 4);
		assert!(prediction.confidence >= 0.0 && prediction.confidence <= 1.0);
		assert!(table().contains(&prediction.label));

		let sum: f32 = prediction.ranking.iter().map(|s| s.confidence).sum();
		assert!((sum - 1.0).abs() < 1e-4);
	}
}
