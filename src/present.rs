//! Rendering of a [`NewsItem`] into mail-ready bodies.
//!
//! Everything here is pure: no I/O, and no failure paths. Timestamps that do not match the
//! strict `YYYY-MM-DDTHH:MM:SSZ` form degrade to a best-effort date string.

// crates.io
use time::{
	Date, PrimitiveDateTime,
	format_description::BorrowedFormatItem,
	macros::format_description,
};
// self
use crate::{_prelude::*, error::ConfigError, news::NewsItem};

const ZULU_TIMESTAMP: &[BorrowedFormatItem<'static>] =
	format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DISPLAY_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]/[month]/[day]");
const NO_IMAGE: &str = "No image";

/// Mail body format, serialized with the tags Microsoft Graph expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
	/// HTML body.
	#[default]
	#[serde(rename = "HTML")]
	Html,
	/// Plain-text body.
	#[serde(rename = "Text")]
	Text,
}
impl ContentType {
	/// Graph `contentType` tag.
	pub const fn as_str(self) -> &'static str {
		match self {
			ContentType::Html => "HTML",
			ContentType::Text => "Text",
		}
	}
}
impl Display for ContentType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContentType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"html" => Ok(ContentType::Html),
			"text" | "plain" => Ok(ContentType::Text),
			other => Err(ConfigError::invalid(
				"MAIL_CONTENT_TYPE",
				format!("expected `html` or `text`, got `{other}`"),
			)),
		}
	}
}

/// Renders `item` as a self-contained HTML table. Every interpolated field is escaped.
pub fn render(item: &NewsItem) -> String {
	let image = match &item.thumbnail_url {
		Some(src) => format!(r#"<img src="{}" width="100">"#, escape_html(src)),
		None => NO_IMAGE.to_owned(),
	};

	format!(
		r#"<table border="1" style="border-collapse: collapse; width: 100%;">
	<tr style="background-color: #f2f2f2;">
		<th style="width:15%;">Image</th>
		<th style="width:25%;">Title</th>
		<th style="width:10%;">Author</th>
		<th style="width:15%;">Published</th>
		<th style="width:35%;">Description</th>
	</tr>
	<tr>
		<td style="text-align:center;">{image}</td>
		<td><a href="{url}" target="_blank">{title}</a></td>
		<td>{author}</td>
		<td>{published}</td>
		<td>{description}</td>
	</tr>
</table>
"#,
		url = escape_html(&item.url),
		title = escape_html(&item.title),
		author = escape_html(&item.author),
		published = escape_html(&format_published(&item.published)),
		description = escape_html(&item.description),
	)
}

/// Renders `item` as plain text.
pub fn render_text(item: &NewsItem) -> String {
	format!(
		"Title: {}\nAuthor: {}\nPublished: {}\n\nURL: {}\n\nSummary: {}",
		item.title,
		item.author,
		format_published(&item.published),
		item.url,
		item.description,
	)
}

/// Full mail body for `item`: an intro naming `keyword` followed by the rendering in
/// `content_type`.
pub fn compose_body(item: &NewsItem, keyword: &str, content_type: ContentType) -> String {
	match content_type {
		ContentType::Html => format!(
			"<p>The following news item was retrieved from the Bing News API (keyword: {}).</p>\n<hr>\n{}",
			escape_html(keyword),
			render(item),
		),
		ContentType::Text => format!(
			"Retrieved one news item from Bing News for the keyword '{keyword}'.\n\n{}",
			render_text(item),
		),
	}
}

/// Mail subject for `item`.
pub fn subject(item: &NewsItem) -> String {
	format!("[Bing News] {}", item.title)
}

/// Normalizes a published timestamp to `YYYY/MM/DD`.
///
/// Inputs that are not strict Zulu timestamps fall back to the text before the first `T`,
/// reformatted when it is a plain `YYYY-MM-DD` date and returned as-is otherwise.
pub fn format_published(raw: &str) -> String {
	if let Some(formatted) = PrimitiveDateTime::parse(raw, ZULU_TIMESTAMP)
		.ok()
		.and_then(|timestamp| timestamp.date().format(DISPLAY_DATE).ok())
	{
		return formatted;
	}

	let prefix = raw.split('T').next().unwrap_or(raw);

	Date::parse(prefix, ISO_DATE)
		.ok()
		.and_then(|date| date.format(DISPLAY_DATE).ok())
		.unwrap_or_else(|| prefix.to_owned())
}

/// Escapes the characters that are significant in HTML text and attribute values.
pub fn escape_html(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(c),
		}
	}

	escaped
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn item(published: &str) -> NewsItem {
		NewsItem {
			title: "AI breakthrough".into(),
			author: "Example Wire".into(),
			published: published.into(),
			description: "Models got better.".into(),
			url: "https://example.com/a".into(),
			thumbnail_url: Some("https://example.com/a.jpg".into()),
		}
	}

	#[test]
	fn zulu_timestamp_renders_as_slash_date() {
		assert_eq!(format_published("2024-05-01T03:00:00Z"), "2024/05/01");
		assert!(render(&item("2024-05-01T03:00:00Z")).contains("2024/05/01"));
	}

	#[test]
	fn fractional_timestamp_falls_back_to_date_prefix() {
		assert_eq!(format_published("2024-05-01T03:00:00.0000000Z"), "2024/05/01");
	}

	#[test]
	fn garbled_timestamp_degrades_without_failing() {
		assert_eq!(format_published("garbled-not-iso"), "garbled-not-iso");
		assert_eq!(format_published("unknown"), "unknown");
		assert_eq!(format_published(""), "");
		assert!(render(&item("garbled-not-iso")).contains("<td>garbled-not-iso</td>"));
	}

	#[test]
	fn empty_description_renders_an_empty_cell() {
		let mut item = item("2024-05-01T03:00:00Z");

		item.description = String::new();

		assert!(render(&item).contains("<td></td>"));
		assert!(render_text(&item).ends_with("Summary: "));
	}

	#[test]
	fn missing_thumbnail_uses_placeholder() {
		let mut item = item("2024-05-01T03:00:00Z");

		item.thumbnail_url = None;

		let html = render(&item);

		assert!(html.contains(NO_IMAGE));
		assert!(!html.contains("<img"));
	}

	#[test]
	fn interpolated_fields_are_escaped() {
		let mut item = item("2024-05-01T03:00:00Z");

		item.title = "<script>alert('x')</script>".into();
		item.url = "https://example.com/?a=1&b=\"2\"".into();

		let html = render(&item);

		assert!(!html.contains("<script>"));
		assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
		assert!(html.contains("https://example.com/?a=1&amp;b=&quot;2&quot;"));
	}

	#[test]
	fn compose_body_follows_content_type() {
		let item = item("2024-05-01T03:00:00Z");
		let html = compose_body(&item, "AI & ML", ContentType::Html);

		assert!(html.starts_with("<p>"));
		assert!(html.contains("AI &amp; ML"));
		assert!(html.contains("<table"));

		let text = compose_body(&item, "AI", ContentType::Text);

		assert!(text.contains("keyword 'AI'"));
		assert!(text.contains("URL: https://example.com/a"));
		assert!(!text.contains('<'));
	}

	#[test]
	fn subject_prefixes_title() {
		assert_eq!(subject(&item("")), "[Bing News] AI breakthrough");
	}

	#[test]
	fn content_type_parses_and_serializes_graph_tags() {
		assert_eq!("HTML".parse::<ContentType>().ok(), Some(ContentType::Html));
		assert_eq!("text".parse::<ContentType>().ok(), Some(ContentType::Text));
		assert!("rtf".parse::<ContentType>().is_err());
		assert_eq!(
			serde_json::to_string(&ContentType::Text).expect("Content type should serialize."),
			"\"Text\""
		);
	}
}
