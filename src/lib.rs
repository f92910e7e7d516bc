//! Client-side state layer for a social meme feed.
//!
//! Browses memes page by page, resolves their authors through a single-flight
//! cache, opens and pages each meme's comments, posts comments and publishes
//! new memes with positioned captions, all over the meme REST API.

pub mod author_cache;
pub mod client;
pub mod composer;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod infinite_scroll;
pub mod models;
pub mod pagination;
pub mod picture;

#[cfg(test)]
mod fake;

pub use author_cache::AuthorCache;
pub use client::HttpMemeApi;
pub use composer::MemeDraft;
pub use config::Config;
pub use credentials::{CredentialStore, Credentials};
pub use domain::MemeApi;
pub use errors::{ApiError, AppError};
pub use feed::{CommentCard, FeedSession, MemeCard};
pub use infinite_scroll::{InfiniteScroll, ScrollState};
pub use pagination::{FetchOutcome, LoaderStatus, PaginatedLoader};
