use std::env;

use damage_classification::{Classifier, ClassifyError, DEFAULT_CLASSES};
use log::{error, info, warn};
use simple_logger::SimpleLogger;

use crate::dataset::EvaluationSample;
use crate::error::EvalError;
use crate::report::{EvalReport, SampleOutcome, ScoredSample};

mod dataset;
mod error;
mod report;

const DEFAULT_MODEL_DIR: &str = "results/damage_cls";
const TOP_ALTERNATIVES: usize = 3;

fn main() {
	SimpleLogger::new().init().unwrap();

	if let Err(e) = run() {
		error!("evaluation failed: {e}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), EvalError> {
	let model_dir = env::var("MODEL_DIR").unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string());
	info!("loading model from {model_dir}");

	let classifier = Classifier::load(&model_dir);
	if let Some(reason) = classifier.unavailable_reason() {
		return Err(ClassifyError::Unavailable(reason.to_string()).into());
	}

	let root = dataset::locate_dataset_root(&dataset::default_candidates(), DEFAULT_CLASSES[0])?;
	info!("found dataset at {}", root.display());

	let samples = dataset::collect_samples(&root, &DEFAULT_CLASSES)?;
	info!("testing on {} images", samples.len());

	let mut outcomes = Vec::with_capacity(samples.len());
	for sample in samples {
		let outcome = score_sample(&classifier, sample);
		print_outcome(&outcome);
		outcomes.push(outcome);
	}

	let report = EvalReport::from_outcomes(&DEFAULT_CLASSES, outcomes)?;
	print_report(&report);
	Ok(())
}

/// Score one sampled image. Any per-image failure folds to `Skipped` and is
/// excluded from every total.
fn score_sample(classifier: &Classifier, sample: EvaluationSample) -> SampleOutcome {
	let image = match image::open(&sample.path) {
		Ok(image) => image,
		Err(e) => {
			return SampleOutcome::Skipped {
				path: sample.path,
				reason: e.to_string(),
			}
		}
	};

	match classifier.predict(&image) {
		Ok(prediction) => SampleOutcome::Scored(ScoredSample {
			path: sample.path,
			true_label: sample.true_label,
			predicted: prediction.label.clone(),
			confidence: prediction.confidence,
			top: prediction.top(TOP_ALTERNATIVES).to_vec(),
		}),
		Err(e) => SampleOutcome::Skipped {
			path: sample.path,
			reason: e.to_string(),
		},
	}
}

fn print_outcome(outcome: &SampleOutcome) {
	match outcome {
		SampleOutcome::Scored(sample) => {
			let mark = if sample.true_label == sample.predicted { "ok " } else { "BAD" };
			let name = sample
				.path
				.file_name()
				.map(|n| n.to_string_lossy().into_owned())
				.unwrap_or_default();
			println!("{mark} {name}");
			println!(
				"    true: {:10} | predicted: {:10} ({:.1}%)",
				sample.true_label,
				sample.predicted,
				sample.confidence * 100.0
			);
			let alternatives: Vec<String> = sample
				.top
				.iter()
				.map(|s| format!("{}({:.0}%)", s.label, s.confidence * 100.0))
				.collect();
			println!("    top {}: {}", sample.top.len(), alternatives.join(" "));
		}
		SampleOutcome::Skipped { path, reason } => {
			warn!("skipped {}: {reason}", path.display());
		}
	}
}

fn print_report(report: &EvalReport) {
	println!();
	println!("=== test results ===");
	println!(
		"overall accuracy: {}/{} = {:.1}%",
		report.correct,
		report.total,
		report.accuracy() * 100.0
	);
	println!("{}", report.band().guidance());

	println!();
	println!("per-class accuracy:");
	for class in report.matrix.per_class_accuracy() {
		let bar = "#".repeat((class.accuracy() * 20.0) as usize);
		println!(
			"  {:10} {:5.1}% ({}/{}) {bar}",
			class.label,
			class.accuracy() * 100.0,
			class.correct,
			class.total
		);
	}

	println!();
	println!("confusion matrix (rows = true, columns = predicted):");
	let columns = report.matrix.columns();
	let header: Vec<String> = columns.iter().map(|c| format!("{c:>10}")).collect();
	println!("  {:10}{}", "", header.join(""));
	for class in report.matrix.classes() {
		let cells: Vec<String> = columns
			.iter()
			.map(|col| {
				let count = report.matrix.count(class, col);
				if count > 0 {
					format!("{count:>10}")
				} else {
					format!("{:>10}", "-")
				}
			})
			.collect();
		println!("  {class:10}{}", cells.join(""));
	}

	println!();
	println!("most common mistakes:");
	let mistakes = report.matrix.mistakes();
	if mistakes.is_empty() {
		println!("  none, perfect predictions");
	}
	for mistake in mistakes {
		println!(
			"  confused {:10} as {:10}: {} times",
			mistake.true_label, mistake.predicted, mistake.count
		);
	}

	if !report.skipped.is_empty() {
		println!();
		println!("{} images skipped due to errors", report.skipped.len());
	}
}
