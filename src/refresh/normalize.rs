use atom_syndication as atom;
use time::OffsetDateTime;
use time::format_description::well_known::{Rfc2822, Rfc3339};

use crate::database::models::ItemImage;

use super::error::ParseError;
use super::guid::{self, GuidSource};

/// One entry mapped to the stored item shape, minus everything the store
/// assigns (id, feed id, status flags).
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
	pub guid: String,
	pub title: String,
	pub description: String,
	pub summary: String,
	pub link: String,
	pub author: String,
	pub comments: Option<String>,
	pub image: Option<ItemImage>,
	pub categories: Vec<String>,
	pub enclosures: Vec<String>,
	pub published: Option<i64>,
	pub updated: Option<i64>,
}

/// Parses a raw payload as RSS 2.0 and falls back to Atom. A payload neither
/// syntax accepts is a per-feed [`ParseError`], left to the orchestrator.
pub fn normalize(payload: &[u8]) -> Result<Vec<NormalizedItem>, ParseError> {
	match rss::Channel::read_from(payload) {
		Ok(channel) => Ok(normalize_rss(&channel)),
		Err(rss_err) => match atom::Feed::read_from(payload) {
			Ok(feed) => Ok(normalize_atom(&feed)),
			Err(atom_err) => Err(ParseError::Syntax {
				rss: rss_err,
				atom: atom_err,
			}),
		},
	}
}

fn normalize_rss(channel: &rss::Channel) -> Vec<NormalizedItem> {
	// feedparser semantics: the channel image applies to every item
	let image = channel.image().map(|image| ItemImage {
		title: Some(image.title().to_owned()),
		url: Some(image.url().to_owned()),
	});

	channel
		.items()
		.iter()
		.map(|item| normalize_rss_item(item, image.as_ref()))
		.collect()
}

fn normalize_rss_item(item: &rss::Item, image: Option<&ItemImage>) -> NormalizedItem {
	let canonical = item.link().map(ToOwned::to_owned);
	let origlink = rss_origlink(item);

	let link = match &origlink {
		Some(origlink) if !is_blank(origlink) => origlink.clone(),
		_ => canonical.clone().unwrap_or_default(),
	};

	let guid = guid::compute(&GuidSource {
		guid: item.guid().map(|guid| guid.value().to_owned()),
		link: canonical,
		origlink,
	});

	let pub_date = item.pub_date().and_then(parse_date);
	let dc_date = item
		.dublin_core_ext()
		.and_then(|dc| dc.dates().first())
		.map(String::as_str)
		.and_then(parse_date);

	let author = item
		.author()
		.map(ToOwned::to_owned)
		.or_else(|| {
			item.dublin_core_ext()
				.and_then(|dc| dc.creators().first().cloned())
		})
		.unwrap_or_default();

	NormalizedItem {
		guid,
		title: item.title().unwrap_or_default().to_owned(),
		description: item
			.content()
			.or_else(|| item.description())
			.unwrap_or_default()
			.to_owned(),
		summary: item.description().unwrap_or_default().to_owned(),
		link,
		author,
		comments: item.comments().map(ToOwned::to_owned),
		image: image.cloned(),
		categories: item
			.categories()
			.iter()
			.map(|category| category.name().to_owned())
			.collect(),
		enclosures: item
			.enclosure()
			.map(|enclosure| enclosure.url().to_owned())
			.into_iter()
			.collect(),
		published: pub_date.or(dc_date),
		updated: dc_date.or(pub_date),
	}
}

/// Feedburner rewrites `<link>` to its proxy and keeps the real url in
/// `feedburner:origLink`.
fn rss_origlink(item: &rss::Item) -> Option<String> {
	item.extensions()
		.get("feedburner")?
		.get("origLink")?
		.first()?
		.value()
		.map(ToOwned::to_owned)
}

fn normalize_atom(feed: &atom::Feed) -> Vec<NormalizedItem> {
	let image = feed.logo().map(|url| ItemImage {
		title: Some(feed.title().value.clone()),
		url: Some(url.to_owned()),
	});

	feed.entries()
		.iter()
		.map(|entry| normalize_atom_entry(entry, image.as_ref()))
		.collect()
}

fn normalize_atom_entry(entry: &atom::Entry, image: Option<&ItemImage>) -> NormalizedItem {
	let canonical = entry
		.links()
		.iter()
		.find(|link| link.rel() == "alternate")
		.or_else(|| entry.links().first())
		.map(|link| link.href().to_owned());

	let guid = guid::compute(&GuidSource {
		guid: Some(entry.id().to_owned()),
		link: canonical.clone(),
		origlink: None,
	});

	let published = entry.published().map(|date| date.timestamp());
	let updated = entry.updated().timestamp();

	let summary = entry
		.summary()
		.map(|text| text.value.clone())
		.unwrap_or_default();

	NormalizedItem {
		guid,
		title: entry.title().value.clone(),
		description: entry
			.content()
			.and_then(|content| content.value().map(ToOwned::to_owned))
			.unwrap_or_else(|| summary.clone()),
		summary,
		link: canonical.unwrap_or_default(),
		author: entry
			.authors()
			.first()
			.map(|person| person.name().to_owned())
			.unwrap_or_default(),
		comments: None,
		image: image.cloned(),
		categories: entry
			.categories()
			.iter()
			.map(|category| category.term().to_owned())
			.collect(),
		enclosures: entry
			.links()
			.iter()
			.filter(|link| link.rel() == "enclosure")
			.map(|link| link.href().to_owned())
			.collect(),
		published: published.or(Some(updated)),
		updated: Some(updated),
	}
}

fn parse_date(raw: &str) -> Option<i64> {
	let raw = raw.trim();
	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc2822) {
		return Some(parsed.unix_timestamp());
	}
	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed.unix_timestamp());
	}

	// common feed quirk: a zone name where RFC 2822 wants a numeric offset
	let normalized = raw
		.strip_suffix(" GMT")
		.or_else(|| raw.strip_suffix(" UT"))
		.map(|prefix| format!("{prefix} +0000"))?;
	OffsetDateTime::parse(&normalized, &Rfc2822)
		.ok()
		.map(OffsetDateTime::unix_timestamp)
}

fn is_blank(value: &str) -> bool {
	value.trim().is_empty()
}
