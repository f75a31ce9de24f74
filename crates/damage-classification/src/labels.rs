/// Class universe the collector and evaluation harness are built around.
/// The model artifact carries its own label list; these are the folders
/// the dataset tooling reads and writes.
pub const DEFAULT_CLASSES: [&str; 4] = ["crack", "dent", "pristine", "scratch"];

/// Integer-indexed class label table, taken from the model config.
#[derive(Debug, Clone)]
pub struct LabelTable {
	labels: Vec<String>,
}

impl LabelTable {
	pub fn new(labels: Vec<String>) -> Self {
		Self { labels }
	}

	pub fn get(&self, index: usize) -> Option<&str> {
		self.labels.get(index).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	pub fn contains(&self, label: &str) -> bool {
		self.labels.iter().any(|l| l == label)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.labels.iter().map(String::as_str)
	}
}

impl From<&[&str]> for LabelTable {
	fn from(labels: &[&str]) -> Self {
		Self::new(labels.iter().map(|l| l.to_string()).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn indexed_lookup() {
		let table = LabelTable::from(&DEFAULT_CLASSES[..]);
		assert_eq!(table.len(), 4);
		assert_eq!(table.get(0), Some("crack"));
		assert_eq!(table.get(3), Some("scratch"));
		assert_eq!(table.get(4), None);
	}

	#[test]
	fn membership() {
		let table = LabelTable::from(&DEFAULT_CLASSES[..]);
		assert!(table.contains("dent"));
		assert!(!table.contains("shattered"));
	}
}
