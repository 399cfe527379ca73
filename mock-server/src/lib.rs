//! In-memory stand-in for the Pinboard v1 API.
//!
//! Serves the same XML shapes as the real service from a `Store` behind an
//! `RwLock`. Every route requires either `auth_token=USER:TOKEN` or basic auth
//! with `USER:PASSWORD`. Like Pinboard, write outcomes are reported in the
//! body with a 200 status; only auth failures and unknown notes use error
//! statuses.

use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64ct::{Base64, Encoding};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::escape::escape;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const USER: &str = "drags";
pub const TOKEN: &str = "AC1638B3E618FD194CA0";
pub const PASSWORD: &str = "foobar";
pub const SECRET: &str = "6493a84f72d86e7de130";

const DEFAULT_RECENT: usize = 15;
const MAX_RECENT: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPost {
    pub url: String,
    pub description: String,
    pub extended: String,
    pub tags: Vec<String>,
    pub time: DateTime<Utc>,
    pub shared: bool,
    pub toread: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredNote {
    pub id: String,
    pub title: String,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Default)]
pub struct Store {
    pub posts: Vec<StoredPost>,
    pub notes: Vec<StoredNote>,
    pub updated: DateTime<Utc>,
}

impl Store {
    /// A store with two notes and no posts.
    pub fn seeded() -> Self {
        Self {
            posts: Vec::new(),
            notes: vec![
                StoredNote {
                    id: "cf73662d6ee5ec0d1bfa".to_string(),
                    title: "Paul Graham on Hirin' The Ladies".to_string(),
                    text: "Hiring & <interviews>\nsecond line".to_string(),
                    created_at: seed_time((2011, 7, 10), (23, 33, 48)),
                    updated_at: seed_time((2011, 7, 10), (23, 33, 48)),
                },
                StoredNote {
                    id: "8e5d6964bb810e0050b0".to_string(),
                    title: "Ubuntu bashrc".to_string(),
                    text: "    alias ll='ls -l'\n".to_string(),
                    created_at: seed_time((2011, 5, 4), (15, 40, 32)),
                    updated_at: seed_time((2011, 5, 6), (9, 12, 0)),
                },
            ],
            updated: DateTime::<Utc>::default(),
        }
    }
}

/// Seed data is fixed, so an invalid literal is a bug in this file.
fn seed_time((y, mo, d): (i32, u32, u32), (h, mi, s): (u32, u32, u32)) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("seed timestamps are valid calendar times")
}

pub type Db = Arc<RwLock<Store>>;

/// Query parameters in request order; Pinboard repeats `tag` for filters.
type Params = Query<Vec<(String, String)>>;

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    let api = Router::new()
        .route("/posts/update", get(posts_update))
        .route("/posts/add", get(posts_add))
        .route("/posts/delete", get(posts_delete))
        .route("/posts/get", get(posts_get))
        .route("/posts/recent", get(posts_recent))
        .route("/posts/dates", get(posts_dates))
        .route("/posts/all", get(posts_all))
        .route("/posts/suggest", get(posts_suggest))
        .route("/tags/get", get(tags_get))
        .route("/tags/delete", get(tags_delete))
        .route("/tags/rename", get(tags_rename))
        .route("/user/secret", get(user_secret))
        .route("/user/api_token", get(user_api_token))
        .route("/notes/list", get(notes_list))
        .route("/notes/{id}", get(notes_get))
        .route_layer(middleware::from_fn(require_auth))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "mock pinboard listening");
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// auth
// ---------------------------------------------------------------------------

async fn require_auth(request: Request, next: Next) -> Response {
    if is_authorized(&request) {
        return next.run(request).await;
    }
    debug!(uri = %request.uri().path(), "rejecting unauthenticated request");
    (StatusCode::UNAUTHORIZED, "401 Forbidden").into_response()
}

fn is_authorized(request: &Request) -> bool {
    let expected_token = format!("{USER}:{TOKEN}");
    if let Ok(Query(params)) = Params::try_from_uri(request.uri()) {
        if let Some((_, token)) = params.iter().find(|(k, _)| k == "auth_token") {
            return *token == expected_token;
        }
    }
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| Base64::decode_vec(encoded.trim()).ok())
        .is_some_and(|decoded| decoded == format!("{USER}:{PASSWORD}").as_bytes())
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn params_all<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect()
}

fn xml(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n{body}"),
    )
        .into_response()
}

fn result_code(code: &str) -> Response {
    xml(format!("<result code=\"{}\" />", escape(code)))
}

fn result_text(text: &str) -> Response {
    xml(format!("<result>{}</result>", escape(text)))
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn short_hash(value: impl Hash) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn post_xml(post: &StoredPost) -> String {
    let hash = short_hash(&post.url);
    let meta = short_hash((&post.url, &post.description, &post.extended, &post.tags, post.time));
    format!(
        "  <post href=\"{}\" time=\"{}\" description=\"{}\" extended=\"{}\" tag=\"{}\" hash=\"{}\" meta=\"{}\" shared=\"{}\" toread=\"{}\" />\n",
        escape(&post.url),
        rfc3339(&post.time),
        escape(&post.description),
        escape(&post.extended),
        escape(&post.tags.join(" ")),
        hash,
        meta,
        yes_no(post.shared),
        yes_no(post.toread),
    )
}

fn posts_xml<'a>(posts: impl IntoIterator<Item = &'a StoredPost>, dt: Option<&str>) -> Response {
    let body: String = posts.into_iter().map(post_xml).collect();
    let dt = dt.map(|d| format!(" dt=\"{d}\"")).unwrap_or_default();
    xml(format!("<posts user=\"{USER}\"{dt}>\n{body}</posts>"))
}

fn has_all_tags(post: &StoredPost, tags: &[&str]) -> bool {
    tags.iter().all(|tag| post.tags.iter().any(|t| t == tag))
}

/// Newest first.
fn sorted_posts(store: &Store) -> Vec<&StoredPost> {
    let mut posts: Vec<&StoredPost> = store.posts.iter().collect();
    posts.sort_by(|a, b| b.time.cmp(&a.time));
    posts
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

// ---------------------------------------------------------------------------
// posts
// ---------------------------------------------------------------------------

async fn posts_update(State(db): State<Db>) -> Response {
    let store = db.read().await;
    xml(format!("<update time=\"{}\" />", rfc3339(&store.updated)))
}

async fn posts_add(State(db): State<Db>, Query(params): Params) -> Response {
    let Some(url) = param(&params, "url").filter(|u| !u.is_empty()) else {
        return result_code("missing url");
    };
    let Some(description) = param(&params, "description").filter(|d| !d.is_empty()) else {
        return result_code("missing description");
    };
    let time = match param(&params, "dt") {
        Some(dt) => match parse_rfc3339(dt) {
            Some(time) => time,
            None => return result_code("invalid date"),
        },
        None => Utc::now(),
    };
    let post = StoredPost {
        url: url.to_string(),
        description: description.to_string(),
        extended: param(&params, "extended").unwrap_or_default().to_string(),
        tags: param(&params, "tags")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        time,
        shared: param(&params, "shared") != Some("no"),
        toread: param(&params, "toread") == Some("yes"),
    };
    let replace = param(&params, "replace") != Some("no");

    let mut store = db.write().await;
    match store.posts.iter().position(|p| p.url == post.url) {
        Some(_) if !replace => return result_code("item already exists"),
        Some(index) => store.posts[index] = post,
        None => store.posts.push(post),
    }
    store.updated = Utc::now();
    result_code("done")
}

async fn posts_delete(State(db): State<Db>, Query(params): Params) -> Response {
    let url = param(&params, "url").unwrap_or_default();
    let mut store = db.write().await;
    let before = store.posts.len();
    store.posts.retain(|p| p.url != url);
    if store.posts.len() == before {
        return result_code("item not found");
    }
    store.updated = Utc::now();
    result_code("done")
}

async fn posts_get(State(db): State<Db>, Query(params): Params) -> Response {
    let store = db.read().await;
    let tags = params_all(&params, "tag");
    let posts = sorted_posts(&store);

    if let Some(url) = param(&params, "url") {
        let matching: Vec<_> = posts.into_iter().filter(|p| p.url == url).collect();
        return posts_xml(matching, None);
    }

    let day = match param(&params, "dt") {
        Some(dt) => match NaiveDate::parse_from_str(dt, "%Y-%m-%d") {
            Ok(day) => Some(day),
            Err(_) => return (StatusCode::BAD_REQUEST, "invalid dt").into_response(),
        },
        None => posts.first().map(|p| p.time.date_naive()),
    };
    let matching: Vec<_> = posts
        .into_iter()
        .filter(|p| Some(p.time.date_naive()) == day && has_all_tags(p, &tags))
        .collect();
    let dt = day.map(|d| d.format("%Y-%m-%d").to_string());
    posts_xml(matching, dt.as_deref())
}

async fn posts_recent(State(db): State<Db>, Query(params): Params) -> Response {
    let count = param(&params, "count")
        .and_then(|c| c.parse().ok())
        .unwrap_or(DEFAULT_RECENT)
        .min(MAX_RECENT);
    let tags = params_all(&params, "tag");
    let store = db.read().await;
    let matching: Vec<_> = sorted_posts(&store)
        .into_iter()
        .filter(|p| has_all_tags(p, &tags))
        .take(count)
        .collect();
    posts_xml(matching, Some(&rfc3339(&store.updated)))
}

async fn posts_dates(State(db): State<Db>, Query(params): Params) -> Response {
    let tag = param(&params, "tag");
    let store = db.read().await;
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for post in &store.posts {
        if tag.is_none_or(|t| post.tags.iter().any(|p| p == t)) {
            *per_day.entry(post.time.date_naive()).or_default() += 1;
        }
    }
    let body: String = per_day
        .iter()
        .rev()
        .map(|(day, count)| {
            format!(
                "  <date count=\"{count}\" date=\"{}\" />\n",
                day.format("%Y-%m-%d")
            )
        })
        .collect();
    xml(format!(
        "<dates user=\"{USER}\" tag=\"{}\">\n{body}</dates>",
        escape(tag.unwrap_or_default())
    ))
}

async fn posts_all(State(db): State<Db>, Query(params): Params) -> Response {
    let tags = params_all(&params, "tag");
    let start: usize = param(&params, "start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let results: Option<usize> = param(&params, "results").and_then(|r| r.parse().ok());
    let from = param(&params, "fromdt").and_then(parse_rfc3339);
    let to = param(&params, "todt").and_then(parse_rfc3339);

    let store = db.read().await;
    let matching: Vec<_> = sorted_posts(&store)
        .into_iter()
        .filter(|p| has_all_tags(p, &tags))
        .filter(|p| from.is_none_or(|from| p.time >= from))
        .filter(|p| to.is_none_or(|to| p.time <= to))
        .skip(start)
        .take(results.unwrap_or(usize::MAX))
        .collect();
    posts_xml(matching, None)
}

async fn posts_suggest(State(db): State<Db>, Query(params): Params) -> Response {
    let url = param(&params, "url").unwrap_or_default();
    let store = db.read().await;
    let popular: Vec<&str> = store
        .posts
        .iter()
        .filter(|p| p.url == url)
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();
    let mut recommended: Vec<(&str, u32)> = tag_counts(&store).into_iter().collect();
    recommended.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut body = String::new();
    for tag in popular {
        body.push_str(&format!("  <popular>{}</popular>\n", escape(tag)));
    }
    for (tag, _) in recommended.into_iter().take(3) {
        body.push_str(&format!("  <recommended>{}</recommended>\n", escape(tag)));
    }
    xml(format!("<suggested>\n{body}</suggested>"))
}

// ---------------------------------------------------------------------------
// tags
// ---------------------------------------------------------------------------

fn tag_counts(store: &Store) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for tag in store.posts.iter().flat_map(|p| p.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }
    counts
}

async fn tags_get(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let counts: BTreeMap<&str, u32> = tag_counts(&store).into_iter().collect();
    let body: String = counts
        .iter()
        .map(|(tag, count)| format!("  <tag count=\"{count}\" tag=\"{}\" />\n", escape(*tag)))
        .collect();
    xml(format!("<tags>\n{body}</tags>"))
}

async fn tags_delete(State(db): State<Db>, Query(params): Params) -> Response {
    let tag = param(&params, "tag").unwrap_or_default().to_string();
    let mut store = db.write().await;
    for post in &mut store.posts {
        post.tags.retain(|t| *t != tag);
    }
    store.updated = Utc::now();
    result_text("done")
}

async fn tags_rename(State(db): State<Db>, Query(params): Params) -> Response {
    let (Some(old), Some(new)) = (param(&params, "old"), param(&params, "new")) else {
        return result_text("missing tag");
    };
    let mut store = db.write().await;
    for post in &mut store.posts {
        for tag in post.tags.iter_mut().filter(|t| *t == old) {
            *tag = new.to_string();
        }
    }
    store.updated = Utc::now();
    result_text("done")
}

// ---------------------------------------------------------------------------
// user
// ---------------------------------------------------------------------------

async fn user_secret() -> Response {
    result_text(SECRET)
}

async fn user_api_token() -> Response {
    result_text(TOKEN)
}

// ---------------------------------------------------------------------------
// notes
// ---------------------------------------------------------------------------

fn note_fields(note: &StoredNote) -> String {
    format!(
        "    <title>{}</title>\n    <hash>{}</hash>\n    <created_at>{}</created_at>\n    <updated_at>{}</updated_at>\n    <length>{}</length>\n",
        escape(&note.title),
        short_hash(&note.text),
        note.created_at.format("%Y-%m-%d %H:%M:%S"),
        note.updated_at.format("%Y-%m-%d %H:%M:%S"),
        note.text.chars().count(),
    )
}

async fn notes_list(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let body: String = store
        .notes
        .iter()
        .map(|note| format!("  <note id=\"{}\">\n{}  </note>\n", note.id, note_fields(note)))
        .collect();
    xml(format!(
        "<notes count=\"{}\">\n{body}</notes>",
        store.notes.len()
    ))
}

async fn notes_get(State(db): State<Db>, Path(id): Path<String>) -> Response {
    let store = db.read().await;
    match store.notes.iter().find(|note| note.id == id) {
        Some(note) => xml(format!(
            "<note id=\"{}\">\n{}    <text>{}</text>\n</note>",
            note.id,
            note_fields(note),
            escape(&note.text)
        )),
        None => (StatusCode::NOT_FOUND, "note not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(url: &str, tags: &[&str], day: u32) -> StoredPost {
        StoredPost {
            url: url.to_string(),
            description: "d".to_string(),
            extended: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            time: Utc.with_ymd_and_hms(2020, 1, day, 12, 0, 0).unwrap(),
            shared: true,
            toread: false,
        }
    }

    #[test]
    fn post_xml_escapes_attributes() {
        let mut p = post("https://x.example/?a=1&b=2", &["a", "b"], 1);
        p.description = "Say \"hi\" <now>".to_string();
        let rendered = post_xml(&p);
        assert!(rendered.contains("href=\"https://x.example/?a=1&amp;b=2\""));
        assert!(rendered.contains("description=\"Say &quot;hi&quot; &lt;now&gt;\""));
        assert!(rendered.contains("tag=\"a b\""));
        assert!(rendered.contains("time=\"2020-01-01T12:00:00Z\""));
    }

    #[test]
    fn tag_filter_requires_every_tag() {
        let p = post("https://x.example", &["a", "b"], 1);
        assert!(has_all_tags(&p, &["a", "b"]));
        assert!(!has_all_tags(&p, &["a", "c"]));
        assert!(has_all_tags(&p, &[]));
    }

    #[test]
    fn posts_sort_newest_first() {
        let store = Store {
            posts: vec![
                post("https://a.example", &[], 1),
                post("https://b.example", &[], 3),
                post("https://c.example", &[], 2),
            ],
            ..Store::default()
        };
        let urls: Vec<_> = sorted_posts(&store).iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://b.example", "https://c.example", "https://a.example"]
        );
    }

    #[test]
    fn tag_counts_span_all_posts() {
        let store = Store {
            posts: vec![
                post("https://a.example", &["rust", "xml"], 1),
                post("https://b.example", &["rust"], 2),
            ],
            ..Store::default()
        };
        let counts = tag_counts(&store);
        assert_eq!(counts.get("rust"), Some(&2));
        assert_eq!(counts.get("xml"), Some(&1));
    }

    #[test]
    fn seeded_notes_keep_their_timestamps() {
        let notes = Store::seeded().notes;
        assert_eq!(
            notes[0].created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2011-07-10 23:33:48"
        );
        assert_eq!(
            notes[1].updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2011-05-06 09:12:00"
        );
    }

    #[test]
    #[should_panic(expected = "seed timestamps")]
    fn invalid_seed_time_fails_loudly() {
        seed_time((2011, 2, 30), (0, 0, 0));
    }

    #[test]
    fn seeded_store_has_valid_note_ids() {
        for note in Store::seeded().notes {
            assert_eq!(note.id.len(), 20);
            assert!(note.id.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }
}
