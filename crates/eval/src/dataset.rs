use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::error::EvalError;

pub const SAMPLE_CAP: usize = 10;
pub const SAMPLE_SEED: u64 = 42;
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// One test image with its ground truth taken from the parent folder name.
#[derive(Debug, Clone)]
pub struct EvaluationSample {
	pub path: PathBuf,
	pub true_label: String,
}

/// Locations tried in order when looking for the class folders.
pub fn default_candidates() -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Ok(dir) = env::var("DATASET_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	candidates.push(PathBuf::from("dataset"));
	candidates.push(PathBuf::from("../dataset"));
	candidates.push(PathBuf::from("."));
	candidates
}

/// First candidate that holds a subfolder for the anchor class wins.
pub fn locate_dataset_root(candidates: &[PathBuf], anchor_class: &str) -> Result<PathBuf, EvalError> {
	for candidate in candidates {
		if candidate.join(anchor_class).is_dir() {
			return Ok(candidate.clone());
		}
	}
	Err(EvalError::DatasetNotFound {
		candidates: candidates.to_vec(),
	})
}

/// Image files directly inside a class folder, sorted so sampling over an
/// unchanged folder is reproducible.
pub fn list_class_images(dir: &Path) -> Result<Vec<PathBuf>, EvalError> {
	let mut files = Vec::new();
	for entry in dir.read_dir()? {
		let path = entry?.path();
		if path.is_file() && has_image_extension(&path) {
			files.push(path);
		}
	}
	files.sort();
	Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
	path.extension()
		.and_then(OsStr::to_str)
		.map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
		.unwrap_or(false)
}

/// Uniform sample without replacement, capped at `cap`. A population at or
/// under the cap is used verbatim.
pub fn sample_images(population: &[PathBuf], cap: usize, seed: u64) -> Vec<PathBuf> {
	if population.len() <= cap {
		return population.to_vec();
	}
	let mut rng = StdRng::seed_from_u64(seed);
	index::sample(&mut rng, population.len(), cap)
		.into_iter()
		.map(|i| population[i].clone())
		.collect()
}

/// Draw the per-class samples for one evaluation run.
pub fn collect_samples(root: &Path, classes: &[&str]) -> Result<Vec<EvaluationSample>, EvalError> {
	let mut samples = Vec::new();

	for class in classes {
		let dir = root.join(class);
		if !dir.is_dir() {
			warn!("no folder for class '{class}' under {}", root.display());
			continue;
		}

		let images = list_class_images(&dir)?;
		let chosen = sample_images(&images, SAMPLE_CAP, SAMPLE_SEED);
		info!("{class}: found {} images, testing {}", images.len(), chosen.len());

		samples.extend(chosen.into_iter().map(|path| EvaluationSample {
			path,
			true_label: class.to_string(),
		}));
	}

	if samples.is_empty() {
		return Err(EvalError::NoSamples);
	}
	Ok(samples)
}
