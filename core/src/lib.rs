//! Synchronous client for the Pinboard v1 bookmarking API.
//!
//! # Overview
//! Builds authenticated `HttpRequest` values and parses Pinboard's XML
//! responses into typed records (host-does-IO pattern). `Pinboard` composes
//! both halves with a `Transport`; with the default `ureq` feature,
//! `Pinboard::new` gives a ready-to-use blocking client.
//!
//! # Design
//! - `PinboardClient` is stateless: it holds the API root and credentials.
//! - Each remote action is split into `build_*` (validates input, produces a
//!   request) and `parse_*` (checks status, decodes the body), so the I/O
//!   boundary is explicit and every check runs before the network.
//! - Text-carried values (tag lists, the two date formats, yes/no flags) have
//!   their own codecs in `codec`.
//!
//! ```no_run
//! use pinboard_core::{Config, Credentials, Pinboard, PostsRecentFilter};
//!
//! let config = Config::new(Credentials::with_token("maciej", "ABC123"));
//! let pinboard = Pinboard::new(&config);
//! for post in pinboard.posts_recent(&PostsRecentFilter::default())? {
//!     println!("{} [{}]", post.description, post.tags);
//! }
//! # Ok::<(), pinboard_core::ApiError>(())
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
mod decode;
pub mod error;
pub mod http;
pub mod pinboard;
pub mod request;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::PinboardClient;
pub use codec::{FormatError, TagList, UtcDate, UtcDateTime};
pub use config::Config;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Transport};
pub use pinboard::Pinboard;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    NewPost, Note, Post, PostDate, PostsAllFilter, PostsGetFilter, PostsRecentFilter, Tag,
    TagSuggestions,
};
