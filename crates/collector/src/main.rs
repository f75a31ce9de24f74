use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use simple_logger::SimpleLogger;

use crate::error::CollectError;
use crate::search::{SearchClient, PAGE_SIZE};

mod error;
mod fetch;
mod search;

/// Search queries and the class folder each one feeds.
const QUERIES: [(&str, &str); 9] = [
	("cracked phone screen", "crack"),
	("broken smartphone display", "crack"),
	("phone body scratches", "scratch"),
	("dented phone", "dent"),
	("bent phone frame", "dent"),
	("damaged phone corner", "dent"),
	("phone with edge dent", "dent"),
	("clean smartphone front", "pristine"),
	("brand new smartphone", "pristine"),
];

const RESULTS_PER_QUERY: usize = 60;
const PAGE_DELAY: Duration = Duration::from_secs(2);
const DATASET_ROOT: &str = "dataset";

enum Outcome {
	Saved(PathBuf),
	Skipped { url: String, reason: String },
}

fn main() {
	SimpleLogger::new().init().unwrap();

	if let Err(e) = run() {
		error!("collection failed: {e}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), CollectError> {
	let search = SearchClient::from_env()?;
	let http = reqwest::blocking::Client::new();
	let root = PathBuf::from(DATASET_ROOT);

	// Filename counters span queries that feed the same class folder.
	let mut counters: HashMap<&str, usize> = HashMap::new();

	for (query, folder) in QUERIES {
		collect_query(&search, &http, &root, query, folder, &mut counters)?;
	}

	info!("collection finished under {}/", root.display());
	Ok(())
}

fn collect_query(
	search: &SearchClient,
	http: &reqwest::blocking::Client,
	root: &Path,
	query: &str,
	folder: &'static str,
	counters: &mut HashMap<&'static str, usize>,
) -> Result<(), CollectError> {
	let dir = root.join(folder);
	std::fs::create_dir_all(&dir)?;
	info!("searching for '{query}'");

	let (mut saved, mut skipped) = (0usize, 0usize);

	let mut start = 1;
	while start < RESULTS_PER_QUERY {
		let hits = match search.image_page(query, start) {
			Ok(hits) => hits,
			Err(e) => {
				// A listing failure ends this query only; the run continues.
				warn!("page listing failed for '{query}': {e}");
				break;
			}
		};

		for hit in hits {
			let counter = counters.entry(folder).or_insert(0);
			*counter += 1;
			match fetch_one(http, &hit.link, &dir, folder, *counter) {
				Outcome::Saved(path) => {
					saved += 1;
					info!("saved {}", path.display());
				}
				Outcome::Skipped { url, reason } => {
					skipped += 1;
					warn!("skipped {url}: {reason}");
				}
			}
		}

		thread::sleep(PAGE_DELAY);
		start += PAGE_SIZE;
	}

	info!("finished '{query}' into {folder}/: {saved} saved, {skipped} skipped");
	Ok(())
}

fn fetch_one(
	http: &reqwest::blocking::Client,
	url: &str,
	dir: &Path,
	folder: &str,
	index: usize,
) -> Outcome {
	match fetch::fetch_and_store(http, url, dir, folder, index) {
		Ok(path) => Outcome::Saved(path),
		Err(e) => Outcome::Skipped {
			url: url.to_string(),
			reason: e.to_string(),
		},
	}
}
