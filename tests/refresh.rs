//! End-to-end refresh pipeline tests over a mocked HTTP origin and an
//! in-memory store.

use std::time::Duration;

use diesel::r2d2;
use diesel_migrations::MigrationHarness;
use time::{OffsetDateTime, format_description::well_known::Rfc2822};
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

use feedstash::{
	database::{
		MIGRATIONS, PoolConnection,
		feeds::{self, FeedDraft},
		items::{self, ItemFilter, StatusField},
		models::Feed,
	},
	fetcher::Fetcher,
	refresh::RefreshEngine,
	utils::unix_now,
};

const RETENTION_SECS: i64 = 14 * 24 * 3600;

// A single shared `:memory:` database: with more than one connection each
// would get its own empty database.
fn test_pool() -> PoolConnection {
	let manager = r2d2::ConnectionManager::<diesel::SqliteConnection>::new(":memory:");
	let pool = r2d2::Pool::builder()
		.max_size(1)
		.build(manager)
		.unwrap();

	let mut conn = pool.get().unwrap();
	conn.run_pending_migrations(MIGRATIONS).unwrap();
	drop(conn);

	pool
}

fn test_engine(pool: PoolConnection) -> RefreshEngine {
	let fetcher = Fetcher::new(Duration::from_secs(5)).unwrap();
	RefreshEngine::new(pool, fetcher, RETENTION_SECS, 4)
}

fn subscribe(pool: &PoolConnection, title: &str, url: String) -> Feed {
	let mut conn = pool.get().unwrap();
	feeds::create(
		&FeedDraft {
			title: title.to_owned(),
			url,
		},
		unix_now(),
		&mut conn,
	)
	.unwrap()
}

fn items_for(pool: &PoolConnection, feed: &Feed) -> Vec<feedstash::database::models::Item> {
	let mut conn = pool.get().unwrap();
	items::list(
		ItemFilter {
			feed_id: Some(feed.id),
			..ItemFilter::default()
		},
		&mut conn,
	)
	.unwrap()
}

fn rss_channel(items_xml: &str) -> String {
	format!(
		r#"<?xml version="1.0"?>
		<rss version="2.0">
			<channel>
				<title>test channel</title>
				<link>http://example.com/</link>
				{items_xml}
			</channel>
		</rss>"#
	)
}

fn rss_item(title: &str, link: &str, pub_date: Option<&str>) -> String {
	let date_tag = pub_date.map_or_else(String::new, |d| format!("<pubDate>{d}</pubDate>"));
	format!("<item><title>{title}</title><link>{link}</link>{date_tag}</item>")
}

fn recent_rfc2822() -> String {
	OffsetDateTime::now_utc().format(&Rfc2822).unwrap()
}

async fn mount_feed(server: &MockServer, route: &str, body: String) {
	Mock::given(method("GET"))
		.and(path(route))
		.respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
		.mount(server)
		.await;
}

#[tokio::test]
async fn one_broken_feed_does_not_sink_the_tick() {
	let server = MockServer::start().await;
	let pool = test_pool();

	let body_one = rss_channel(&rss_item("alpha", "http://example.com/a", None));
	let body_three = rss_channel(&rss_item("gamma", "http://example.com/c", None));
	mount_feed(&server, "/one.xml", body_one).await;
	mount_feed(&server, "/three.xml", body_three).await;

	let feed_one = subscribe(&pool, "one", format!("{}/one.xml", server.uri()));
	// nothing listens on port 1, so this one fails at the transport level
	let feed_two = subscribe(&pool, "two", "http://127.0.0.1:1/".to_owned());
	let feed_three = subscribe(&pool, "three", format!("{}/three.xml", server.uri()));

	let engine = test_engine(pool.clone());
	engine.run_once().await.unwrap();

	assert_eq!(items_for(&pool, &feed_one).len(), 1);
	assert!(items_for(&pool, &feed_two).is_empty());
	assert_eq!(items_for(&pool, &feed_three).len(), 1);
}

#[tokio::test]
async fn non_200_responses_are_skipped_without_error() {
	let server = MockServer::start().await;
	let pool = test_pool();

	Mock::given(method("GET"))
		.and(path("/gone.xml"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;

	let feed = subscribe(&pool, "gone", format!("{}/gone.xml", server.uri()));

	let engine = test_engine(pool.clone());
	engine.run_once().await.unwrap();

	assert!(items_for(&pool, &feed).is_empty());
}

#[tokio::test]
async fn entries_past_the_retention_horizon_are_never_stored() {
	let server = MockServer::start().await;
	let pool = test_pool();

	let recent = recent_rfc2822();
	let items_xml = [
		rss_item("ancient", "http://example.com/old", Some("Tue, 01 Jan 2002 00:00:00 +0000")),
		rss_item("fresh", "http://example.com/fresh", Some(&recent)),
		rss_item("dateless", "http://example.com/dateless", None),
	]
	.join("");
	mount_feed(&server, "/mixed.xml", rss_channel(&items_xml)).await;

	let feed = subscribe(&pool, "mixed", format!("{}/mixed.xml", server.uri()));

	let engine = test_engine(pool.clone());
	engine.run_once().await.unwrap();

	let stored = items_for(&pool, &feed);
	let titles = stored.iter().map(|item| item.title.as_str()).collect::<Vec<_>>();

	// the ancient entry is dropped on first sighting; the dateless one is
	// only ever expired by the sweeper, never at ingestion
	assert_eq!(titles, vec!["fresh", "dateless"]);
}

#[tokio::test]
async fn reingestion_updates_rows_instead_of_duplicating_them() {
	let server = MockServer::start().await;
	let pool = test_pool();

	let body = rss_channel(&rss_item("alpha", "http://example.com/a", None));
	mount_feed(&server, "/feed.xml", body).await;

	let feed = subscribe(&pool, "feed", format!("{}/feed.xml", server.uri()));
	let engine = test_engine(pool.clone());

	engine.run_once().await.unwrap();

	let stored = items_for(&pool, &feed);
	assert_eq!(stored.len(), 1);

	{
		let mut conn = pool.get().unwrap();
		items::set_status(&[stored[0].id], StatusField::Read, true, &mut conn).unwrap();
	}

	engine.run_once().await.unwrap();

	let stored = items_for(&pool, &feed);
	assert_eq!(stored.len(), 1);
	// a refresh overwrites content, never user state
	assert!(stored[0].read);
}
