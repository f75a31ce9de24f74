use std::path::{Path, PathBuf};
use std::time::Duration;

use image::ImageFormat;

use crate::error::CollectError;

/// Bound on a single image download; a slow host costs one result, not the run.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Download one search hit, normalize it to RGB and store it as a JPEG
/// named `<folder>_<index>.jpg` inside the class folder.
pub fn fetch_and_store(
	http: &reqwest::blocking::Client,
	url: &str,
	dir: &Path,
	folder: &str,
	index: usize,
) -> Result<PathBuf, CollectError> {
	let bytes = http
		.get(url)
		.timeout(FETCH_TIMEOUT)
		.send()?
		.error_for_status()?
		.bytes()?;

	let image = image::load_from_memory(&bytes)?;
	let rgb = image.to_rgb8();

	let path = dir.join(image_file_name(folder, index));
	rgb.save_with_format(&path, ImageFormat::Jpeg)?;
	Ok(path)
}

pub fn image_file_name(folder: &str, index: usize) -> String {
	format!("{folder}_{index:03}.jpg")
}
