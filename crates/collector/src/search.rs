use std::env;

use serde::Deserialize;

use crate::error::CollectError;

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The Custom Search API serves results in fixed pages of 10.
pub const PAGE_SIZE: usize = 10;

/// Image search client over the Custom Search JSON API.
pub struct SearchClient {
	http: reqwest::blocking::Client,
	api_key: String,
	cse_id: String,
}

impl SearchClient {
	pub fn from_env() -> Result<Self, CollectError> {
		let api_key = env::var("GOOGLE_API_KEY")
			.map_err(|_| CollectError::MissingCredentials("GOOGLE_API_KEY"))?;
		let cse_id = env::var("GOOGLE_CSE_ID")
			.map_err(|_| CollectError::MissingCredentials("GOOGLE_CSE_ID"))?;
		Ok(Self {
			http: reqwest::blocking::Client::new(),
			api_key,
			cse_id,
		})
	}

	/// One page of image results, `start` being the 1-based result offset.
	pub fn image_page(&self, query: &str, start: usize) -> Result<Vec<ImageHit>, CollectError> {
		let response = self
			.http
			.get(ENDPOINT)
			.query(&[
				("key", self.api_key.as_str()),
				("cx", self.cse_id.as_str()),
				("q", query),
				("searchType", "image"),
				("num", "10"),
				("start", &start.to_string()),
				("imgSize", "LARGE"),
				("safe", "off"),
			])
			.send()?;

		if !response.status().is_success() {
			return Err(CollectError::SearchStatus(response.status()));
		}

		let page: SearchPage = response.json()?;
		Ok(page.items.unwrap_or_default())
	}
}

// The `items` key is absent entirely when a page has no results.
#[derive(Debug, Deserialize)]
struct SearchPage {
	items: Option<Vec<ImageHit>>,
}

#[derive(Debug, Deserialize)]
pub struct ImageHit {
	pub link: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_a_result_page() {
		let json = r#"{
			"kind": "customsearch#search",
			"items": [
				{"link": "https://example.com/a.jpg", "title": "a"},
				{"link": "https://example.com/b.png", "title": "b"}
			]
		}"#;
		let page: SearchPage = serde_json::from_str(json).unwrap();
		let items = page.items.unwrap();
		assert_eq!(items.len(), 2);
		assert_eq!(items[0].link, "https://example.com/a.jpg");
	}

	#[test]
	fn missing_items_means_empty_page() {
		let page: SearchPage = serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
		assert!(page.items.unwrap_or_default().is_empty());
	}
}
