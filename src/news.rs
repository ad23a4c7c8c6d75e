//! News-search client that extracts the single most recent result for a keyword.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::{FetchError, TransportError},
	http,
	obs::{self, FlowKind},
};

const SEARCH_PATH: &str = "v7.0/news/search";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const TARGET: &str = "the news search endpoint";
const UNKNOWN: &str = "unknown";

/// Normalized news record.
///
/// `title` and `url` are always non-empty; the other fields carry documented defaults when
/// the search result omits them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
	/// Headline.
	pub title: String,
	/// First provider name, or `"unknown"`.
	pub author: String,
	/// Raw `datePublished` value, or `"unknown"`; may be malformed.
	pub published: String,
	/// Snippet, or an empty string.
	pub description: String,
	/// Canonical article URL.
	pub url: String,
	/// Thumbnail image URL, when the result has one.
	pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	#[serde(default)]
	value: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
	name: Option<String>,
	#[serde(default)]
	provider: Vec<Organization>,
	date_published: Option<String>,
	description: Option<String>,
	url: Option<String>,
	image: Option<Image>,
}

#[derive(Debug, Deserialize)]
struct Organization {
	name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Image {
	thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Thumbnail {
	content_url: Option<String>,
}

impl TryFrom<Article> for NewsItem {
	type Error = FetchError;

	fn try_from(article: Article) -> Result<Self, Self::Error> {
		let title = non_empty(article.name).ok_or(FetchError::MissingField { field: "name" })?;
		let url = non_empty(article.url).ok_or(FetchError::MissingField { field: "url" })?;
		let author = article
			.provider
			.into_iter()
			.next()
			.and_then(|provider| non_empty(provider.name))
			.unwrap_or_else(|| UNKNOWN.to_owned());
		let published = non_empty(article.date_published).unwrap_or_else(|| UNKNOWN.to_owned());
		let thumbnail_url = article
			.image
			.and_then(|image| image.thumbnail)
			.and_then(|thumbnail| non_empty(thumbnail.content_url));

		Ok(Self {
			title,
			author,
			published,
			description: article.description.unwrap_or_default(),
			url,
			thumbnail_url,
		})
	}
}

/// Client for the news-search API.
#[derive(Clone, Debug)]
pub struct NewsClient {
	http: ReqwestClient,
	endpoint: Url,
}
impl NewsClient {
	/// Creates a client rooted at `endpoint` (the API base, e.g. `https://api.bing.microsoft.com/`).
	pub fn new(http: ReqwestClient, endpoint: Url) -> Self {
		Self { http, endpoint }
	}

	/// Fetches the newest result for `query` in `market`.
	///
	/// An empty result set is `Ok(None)`, not an error.
	pub async fn fetch_top_result(
		&self,
		query: &str,
		market: &str,
		api_key: &Secret,
	) -> Result<Option<NewsItem>, FetchError> {
		obs::stage(FlowKind::NewsSearch, "fetch_top_result", async move {
			let response = self
				.http
				.get(self.search_url())
				.query(&[("q", query), ("count", "1"), ("mkt", market), ("sortBy", "Date")])
				.header(SUBSCRIPTION_KEY_HEADER, api_key.expose())
				.send()
				.await
				.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
			let body = http::success_body(TARGET, response).await?;
			let search: SearchResponse = http::decode_json(&body)?;
			let item = search.value.into_iter().next().map(NewsItem::try_from).transpose()?;

			match &item {
				Some(item) => obs::event!(info, title = %item.title, url = %item.url, "Fetched news item."),
				None => obs::event!(info, query, "News search returned no results."),
			}

			Ok(item)
		})
		.await
	}

	fn search_url(&self) -> String {
		format!("{}/{SEARCH_PATH}", self.endpoint.as_str().trim_end_matches('/'))
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}
