use std::path::PathBuf;

use damage_classification::Score;

use crate::error::EvalError;

pub const MISTAKE_LIMIT: usize = 5;

/// Counts indexed by (true label, predicted label). Rows are the expected
/// classes; columns start as the same set and grow when the model predicts
/// a label outside it.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
	classes: Vec<String>,
	columns: Vec<String>,
	counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
	pub fn new(classes: &[&str]) -> Self {
		let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
		let columns = classes.clone();
		let counts = vec![vec![0; columns.len()]; classes.len()];
		Self {
			classes,
			columns,
			counts,
		}
	}

	pub fn classes(&self) -> &[String] {
		&self.classes
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	/// Record one scored sample. True labels come from the class folder list,
	/// so an unknown row is a caller bug and is ignored.
	pub fn record(&mut self, true_label: &str, predicted: &str) {
		let Some(row) = self.classes.iter().position(|c| c == true_label) else {
			return;
		};
		let col = self.column_index(predicted);
		self.counts[row][col] += 1;
	}

	fn column_index(&mut self, predicted: &str) -> usize {
		if let Some(col) = self.columns.iter().position(|c| c == predicted) {
			return col;
		}
		self.columns.push(predicted.to_string());
		for row in &mut self.counts {
			row.push(0);
		}
		self.columns.len() - 1
	}

	pub fn count(&self, true_label: &str, predicted: &str) -> u64 {
		let row = self.classes.iter().position(|c| c == true_label);
		let col = self.columns.iter().position(|c| c == predicted);
		match (row, col) {
			(Some(row), Some(col)) => self.counts[row][col],
			_ => 0,
		}
	}

	pub fn row_total(&self, true_label: &str) -> u64 {
		self.classes
			.iter()
			.position(|c| c == true_label)
			.map(|row| self.counts[row].iter().sum())
			.unwrap_or(0)
	}

	pub fn diagonal_total(&self) -> u64 {
		self.classes.iter().map(|c| self.count(c, c)).sum()
	}

	pub fn total(&self) -> u64 {
		self.counts.iter().flatten().sum()
	}

	/// Per-class accuracy for rows that scored at least one sample.
	pub fn per_class_accuracy(&self) -> Vec<ClassAccuracy> {
		self.classes
			.iter()
			.filter_map(|class| {
				let total = self.row_total(class);
				if total == 0 {
					return None;
				}
				Some(ClassAccuracy {
					label: class.clone(),
					correct: self.count(class, class),
					total,
				})
			})
			.collect()
	}

	/// Non-diagonal cells with non-zero counts, descending by count, capped.
	/// The sort is stable, so ties keep row-major discovery order.
	pub fn mistakes(&self) -> Vec<Mistake> {
		let mut mistakes = Vec::new();
		for (row, true_label) in self.classes.iter().enumerate() {
			for (col, predicted) in self.columns.iter().enumerate() {
				if true_label == predicted {
					continue;
				}
				let count = self.counts[row][col];
				if count > 0 {
					mistakes.push(Mistake {
						true_label: true_label.clone(),
						predicted: predicted.clone(),
						count,
					});
				}
			}
		}
		mistakes.sort_by(|a, b| b.count.cmp(&a.count));
		mistakes.truncate(MISTAKE_LIMIT);
		mistakes
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mistake {
	pub true_label: String,
	pub predicted: String,
	pub count: u64,
}

#[derive(Debug, Clone)]
pub struct ClassAccuracy {
	pub label: String,
	pub correct: u64,
	pub total: u64,
}

impl ClassAccuracy {
	pub fn accuracy(&self) -> f64 {
		self.correct as f64 / self.total as f64
	}
}

/// Qualitative banding for the report; guidance only, carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyBand {
	Excellent,
	Good,
	Fair,
	NeedsImprovement,
}

impl AccuracyBand {
	pub fn from_accuracy(accuracy: f64) -> Self {
		if accuracy >= 0.85 {
			Self::Excellent
		} else if accuracy >= 0.70 {
			Self::Good
		} else if accuracy >= 0.60 {
			Self::Fair
		} else {
			Self::NeedsImprovement
		}
	}

	pub fn guidance(&self) -> &'static str {
		match self {
			Self::Excellent => "EXCELLENT: the model is performing great",
			Self::Good => "GOOD: the model is working well",
			Self::Fair => "FAIR: the model works but could be better",
			Self::NeedsImprovement => "NEEDS IMPROVEMENT: check the data quality",
		}
	}
}

/// One evaluated image, with the top-3 alternatives kept for the report.
#[derive(Debug, Clone)]
pub struct ScoredSample {
	pub path: PathBuf,
	pub true_label: String,
	pub predicted: String,
	pub confidence: f32,
	pub top: Vec<Score>,
}

/// Per-item result of the scoring loop; skips never abort the batch.
pub enum SampleOutcome {
	Scored(ScoredSample),
	Skipped { path: PathBuf, reason: String },
}

pub struct EvalReport {
	pub matrix: ConfusionMatrix,
	pub correct: u64,
	pub total: u64,
	pub scored: Vec<ScoredSample>,
	pub skipped: Vec<(PathBuf, String)>,
}

impl EvalReport {
	/// Fold the per-item outcomes into totals and the confusion matrix.
	/// Skipped samples count toward nothing.
	pub fn from_outcomes(
		classes: &[&str],
		outcomes: impl IntoIterator<Item = SampleOutcome>,
	) -> Result<Self, EvalError> {
		let mut matrix = ConfusionMatrix::new(classes);
		let mut correct = 0;
		let mut total = 0;
		let mut scored = Vec::new();
		let mut skipped = Vec::new();

		for outcome in outcomes {
			match outcome {
				SampleOutcome::Scored(sample) => {
					matrix.record(&sample.true_label, &sample.predicted);
					if sample.true_label == sample.predicted {
						correct += 1;
					}
					total += 1;
					scored.push(sample);
				}
				SampleOutcome::Skipped { path, reason } => {
					skipped.push((path, reason));
				}
			}
		}

		if total == 0 {
			return Err(EvalError::NothingScored);
		}

		Ok(Self {
			matrix,
			correct,
			total,
			scored,
			skipped,
		})
	}

	pub fn accuracy(&self) -> f64 {
		self.correct as f64 / self.total as f64
	}

	pub fn band(&self) -> AccuracyBand {
		AccuracyBand::from_accuracy(self.accuracy())
	}
}
