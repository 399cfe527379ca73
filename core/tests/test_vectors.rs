//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! `requests.json` pairs each operation's arguments with the exact URL it
//! must produce, plus inputs that must be rejected before any I/O.
//! `responses.json` pairs simulated responses with the parsed result, which
//! is compared as JSON so field order in the vectors does not matter.

use chrono::{DateTime, Utc};
use pinboard_core::{
    ApiError, Config, Credentials, HttpRequest, HttpResponse, NewPost, Note, PinboardClient,
    Post, PostsAllFilter, PostsGetFilter, PostsRecentFilter, TagList, UtcDate,
};
use serde_json::{json, Value};

fn client(base_url: &str, credentials: &Value) -> PinboardClient {
    let mut creds = Credentials::new(credentials["username"].as_str().unwrap());
    if let Some(token) = credentials["token"].as_str() {
        creds = creds.token(token);
    }
    if let Some(password) = credentials["password"].as_str() {
        creds = creds.password(password);
    }
    let config = Config::new(creds).with_base_url(base_url).unwrap();
    PinboardClient::new(&config)
}

fn text<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args[key].as_str()
}

fn number(args: &Value, key: &str) -> Option<u32> {
    args[key].as_u64().map(|n| n as u32)
}

fn flag(args: &Value, key: &str) -> Option<bool> {
    args[key].as_bool()
}

fn tags(args: &Value) -> Vec<String> {
    args["tags"]
        .as_array()
        .map(|tags| {
            tags.iter()
                .map(|t| t.as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn timestamp(args: &Value, key: &str) -> Option<DateTime<Utc>> {
    text(args, key).map(|ts| ts.parse().unwrap())
}

fn new_post(args: &Value) -> NewPost {
    let mut post = NewPost::new(
        text(args, "url").unwrap(),
        text(args, "description").unwrap(),
    );
    post.extended = text(args, "extended").unwrap_or_default().to_string();
    post.tags = TagList::decode(text(args, "tags").unwrap_or_default());
    post.time = timestamp(args, "dt");
    post.replace = flag(args, "replace").unwrap_or(true);
    post.shared = text(args, "shared").map(str::to_string);
    post.toread = flag(args, "toread").unwrap_or(false);
    post
}

fn build(client: &PinboardClient, operation: &str, args: &Value) -> Result<HttpRequest, ApiError> {
    match operation {
        "posts_update" => client.build_posts_update(),
        "posts_add" => client.build_posts_add(&new_post(args)),
        "posts_delete" => client.build_posts_delete(text(args, "url").unwrap()),
        "posts_get" => client.build_posts_get(&PostsGetFilter {
            tags: tags(args),
            date: text(args, "dt").map(|d| UtcDate::decode(d).unwrap()),
            url: text(args, "url").map(str::to_string),
            meta: flag(args, "meta").unwrap_or(false),
        }),
        "posts_recent" => client.build_posts_recent(&PostsRecentFilter {
            tags: tags(args),
            count: number(args, "count"),
        }),
        "posts_dates" => client.build_posts_dates(text(args, "tag")),
        "posts_all" => client.build_posts_all(&PostsAllFilter {
            tags: tags(args),
            start: number(args, "start"),
            results: number(args, "results"),
            from: timestamp(args, "fromdt"),
            to: timestamp(args, "todt"),
            meta: flag(args, "meta").unwrap_or(false),
        }),
        "posts_suggest" => client.build_posts_suggest(text(args, "url").unwrap()),
        "tags_get" => client.build_tags_get(),
        "tags_delete" => client.build_tags_delete(text(args, "tag").unwrap()),
        "tags_rename" => {
            client.build_tags_rename(text(args, "old").unwrap(), text(args, "new").unwrap())
        }
        "user_secret" => client.build_user_secret(),
        "user_api_token" => client.build_user_api_token(),
        "notes_list" => client.build_notes_list(),
        "notes_get" => client.build_notes_get(text(args, "id").unwrap()),
        other => panic!("unknown operation: {other}"),
    }
}

fn post_json(post: &Post) -> Value {
    json!({
        "url": post.url,
        "description": post.description,
        "extended": post.extended,
        "tags": post.tags.to_vec(),
        "time": post.time.map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        "hash": post.hash,
        "meta": post.meta,
        "shared": post.shared,
        "toread": post.toread,
    })
}

fn note_json(note: &Note) -> Value {
    json!({
        "id": note.id,
        "title": note.title,
        "hash": note.hash,
        "created_at": note.created_at.map(|ts| ts.encode()),
        "updated_at": note.updated_at.map(|ts| ts.encode()),
        "length": note.length,
        "text": note.text,
    })
}

fn parse(client: &PinboardClient, operation: &str, response: HttpResponse) -> Result<Value, ApiError> {
    let posts = |posts: Vec<Post>| Value::Array(posts.iter().map(post_json).collect());
    Ok(match operation {
        "posts_update" => json!(client
            .parse_posts_update(response)?
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()),
        "posts_add" => json!(client.parse_posts_add(response)?),
        "posts_delete" => json!(client.parse_posts_delete(response)?),
        "posts_get" => posts(client.parse_posts_get(response)?),
        "posts_recent" => posts(client.parse_posts_recent(response)?),
        "posts_all" => posts(client.parse_posts_all(response)?),
        "posts_dates" => Value::Array(
            client
                .parse_posts_dates(response)?
                .iter()
                .map(|d| json!({ "date": d.date.encode(), "count": d.count }))
                .collect(),
        ),
        "posts_suggest" => {
            let s = client.parse_posts_suggest(response)?;
            json!({ "popular": s.popular, "recommended": s.recommended })
        }
        "tags_get" => Value::Array(
            client
                .parse_tags_get(response)?
                .iter()
                .map(|t| json!({ "name": t.name, "count": t.count }))
                .collect(),
        ),
        "tags_delete" => json!(client.parse_tags_delete(response)?),
        "tags_rename" => json!(client.parse_tags_rename(response)?),
        "user_secret" => json!(client.parse_user_secret(response)?),
        "user_api_token" => json!(client.parse_user_api_token(response)?),
        "notes_list" => Value::Array(
            client
                .parse_notes_list(response)?
                .iter()
                .map(note_json)
                .collect(),
        ),
        "notes_get" => note_json(&client.parse_notes_get(response)?),
        other => panic!("unknown operation: {other}"),
    })
}

fn variant(err: &ApiError) -> &'static str {
    match err {
        ApiError::Config(_) => "config",
        ApiError::Validation { .. } => "validation",
        ApiError::Http { .. } => "http",
        ApiError::Transport(_) => "transport",
        ApiError::Rejected(_) => "rejected",
        ApiError::Decode { .. } => "decode",
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let profile = case["credentials"].as_str().unwrap();
        let c = client(base_url, &vectors["credentials"][profile]);

        let req = build(&c, case["operation"].as_str().unwrap(), &case["args"])
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(req.url.as_str(), case["expected_url"].as_str().unwrap(), "{name}: url");
    }
}

#[test]
fn invalid_request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client(
        vectors["base_url"].as_str().unwrap(),
        &vectors["credentials"]["token"],
    );

    for case in vectors["invalid"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let err = build(&c, case["operation"].as_str().unwrap(), &case["args"])
            .expect_err(name);
        match err {
            ApiError::Validation { field, .. } => {
                assert_eq!(field, case["field"].as_str().unwrap(), "{name}: field")
            }
            other => panic!("{name}: expected validation error, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client(
        "https://api.pinboard.in/v1/",
        &json!({ "username": "drags", "token": "T" }),
    );

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            body: case["body"].as_str().unwrap().to_string(),
        };
        let result = parse(&c, case["operation"].as_str().unwrap(), response);

        match case["error"].as_str() {
            None => {
                let parsed = result.unwrap_or_else(|e| panic!("{name}: {e}"));
                assert_eq!(parsed, case["expected"], "{name}: parsed result");
            }
            Some(expected) => {
                let err = result.expect_err(name);
                assert_eq!(variant(&err), expected, "{name}: error kind ({err})");
                match (&err, case["message"].as_str()) {
                    (ApiError::Rejected(code), Some(message)) => assert_eq!(code, message, "{name}"),
                    (ApiError::Http { body, .. }, Some(message)) => assert_eq!(body, message, "{name}"),
                    _ => {}
                }
            }
        }
    }
}
