use crate::{
    author_cache::AuthorCache,
    credentials::Credentials,
    domain::MemeApi,
    errors::ApiError,
    infinite_scroll::{InfiniteScroll, ScrollState},
    models::{Author, Comment, Meme},
    pagination::{FetchOutcome, PaginatedLoader},
};
use futures::future::join_all;
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;

/// A meme ready for display. `author` is `None` while it cannot be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeCard {
    pub meme: Meme,
    pub author: Option<Author>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentCard {
    pub comment: Comment,
    pub author: Option<Author>,
}

struct CommentSection {
    loader: PaginatedLoader<Comment>,
    trigger: InfiniteScroll,
    open: bool,
}

impl CommentSection {
    fn new(api: Arc<dyn MemeApi>, creds: Credentials, meme_id: &str) -> Self {
        let owned_id = meme_id.to_string();
        let loader = PaginatedLoader::new(format!("comments:{}", meme_id), move |page| {
            let api = Arc::clone(&api);
            let creds = creds.clone();
            let meme_id = owned_id.clone();
            async move { api.get_meme_comments(&creds, &meme_id, page).await }
        });
        Self {
            loader,
            trigger: InfiniteScroll::new(),
            open: false,
        }
    }
}

/// State of one mounted feed view.
///
/// Owns the author cache shared by every card, the feed loader and a lazily
/// created loader per opened comment section. Closing (or dropping) the
/// session cancels its token, so in-flight pages and author lookups are
/// discarded and a late posted comment is not merged.
pub struct FeedSession {
    api: Arc<dyn MemeApi>,
    creds: Credentials,
    authors: AuthorCache,
    feed: PaginatedLoader<Meme>,
    feed_trigger: InfiniteScroll,
    comments: HashMap<String, CommentSection>,
    cancel: CancellationToken,
}

impl FeedSession {
    pub fn new(api: Arc<dyn MemeApi>, creds: Credentials) -> Self {
        let feed_api = Arc::clone(&api);
        let feed_creds = creds.clone();
        let feed = PaginatedLoader::new("memes", move |page| {
            let api = Arc::clone(&feed_api);
            let creds = feed_creds.clone();
            async move { api.get_memes(&creds, page).await }
        });
        let mut feed_trigger = InfiniteScroll::new();
        feed_trigger.mount();

        Self {
            authors: AuthorCache::new(Arc::clone(&api)),
            api,
            creds,
            feed,
            feed_trigger,
            comments: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled when the view goes away; hand it to whoever unmounts the view.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn close(&self) {
        tracing::debug!("Closing feed session");
        self.cancel.cancel();
    }

    pub fn credentials(&self) -> &Credentials {
        &self.creds
    }

    pub fn authors(&self) -> &AuthorCache {
        &self.authors
    }

    /// Loads the first feed page.
    pub async fn load(&mut self) -> Result<FetchOutcome, ApiError> {
        let outcome = self.feed.fetch_next_page(&self.cancel).await?;
        if matches!(outcome, FetchOutcome::Loaded { .. }) {
            self.feed_trigger.rearm();
        }
        Ok(outcome)
    }

    /// Reports the feed sentinel's visibility; returns what was fetched, if anything.
    pub async fn on_feed_sentinel(&mut self, visible: bool) -> Result<Option<FetchOutcome>, ApiError> {
        let state = ScrollState {
            has_next_page: self.feed.has_next_page(),
            is_fetching_next_page: self.feed.is_fetching_next_page(),
        };
        if !self.feed_trigger.on_visibility(visible, state) {
            return Ok(None);
        }
        let outcome = self.feed.fetch_next_page(&self.cancel).await?;
        if matches!(outcome, FetchOutcome::Loaded { .. }) {
            self.feed_trigger.rearm();
        }
        Ok(Some(outcome))
    }

    pub fn has_next_page(&self) -> bool {
        self.feed.has_next_page()
    }

    pub fn memes(&self) -> impl Iterator<Item = &Meme> {
        self.feed.items()
    }

    pub fn feed(&self) -> &PaginatedLoader<Meme> {
        &self.feed
    }

    /// Loaded memes with their authors, resolved through the shared cache.
    ///
    /// Empty if the view is closed before the authors arrive.
    pub async fn meme_cards(&self) -> Result<Vec<MemeCard>, ApiError> {
        let memes: Vec<&Meme> = self.feed.items().collect();
        let Some(authors) = self.resolve_authors(memes.iter().map(|m| m.author_id.as_str())).await? else {
            return Ok(Vec::new());
        };
        Ok(memes
            .into_iter()
            .zip(authors)
            .map(|(meme, author)| MemeCard { meme: meme.clone(), author })
            .collect())
    }

    /// The signed-in user, taken from the token's `id` claim.
    pub async fn current_user(&self) -> Result<Author, ApiError> {
        let id = self.creds.user_id()?;
        self.authors.resolve(&id, &self.creds).await
    }

    pub fn is_comments_open(&self, meme_id: &str) -> bool {
        self.comments.get(meme_id).is_some_and(|s| s.open)
    }

    /// Opens or closes a meme's comment section; returns whether it is now open.
    ///
    /// The first opening creates the section's loader and fetches page 1.
    /// Reopening keeps what was already loaded.
    pub async fn toggle_comments(&mut self, meme_id: &str) -> Result<bool, ApiError> {
        if !self.feed.items().any(|m| m.id == meme_id) {
            return Err(ApiError::NotFound(format!("meme {}", meme_id)));
        }

        let section = match self.comments.entry(meme_id.to_string()) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                tracing::debug!(%meme_id, "Creating comment section");
                entry.insert(CommentSection::new(Arc::clone(&self.api), self.creds.clone(), meme_id))
            }
        };

        section.open = !section.open;
        if !section.open {
            section.trigger.unmount();
            return Ok(false);
        }

        section.trigger.mount();
        if section.loader.loaded_pages() == 0 {
            let outcome = section.loader.fetch_next_page(&self.cancel).await?;
            if matches!(outcome, FetchOutcome::Loaded { .. }) {
                section.trigger.rearm();
            }
        }
        Ok(true)
    }

    /// Reports a comment section's sentinel visibility.
    pub async fn on_comments_sentinel(
        &mut self,
        meme_id: &str,
        visible: bool,
    ) -> Result<Option<FetchOutcome>, ApiError> {
        let Some(section) = self.comments.get_mut(meme_id) else {
            return Ok(None);
        };
        let state = ScrollState {
            has_next_page: section.loader.has_next_page(),
            is_fetching_next_page: section.loader.is_fetching_next_page(),
        };
        if !section.trigger.on_visibility(visible, state) {
            return Ok(None);
        }
        let outcome = section.loader.fetch_next_page(&self.cancel).await?;
        if matches!(outcome, FetchOutcome::Loaded { .. }) {
            section.trigger.rearm();
        }
        Ok(Some(outcome))
    }

    pub fn comments(&self, meme_id: &str) -> Option<&PaginatedLoader<Comment>> {
        self.comments.get(meme_id).map(|s| &s.loader)
    }

    /// Loaded comments of a meme with their authors; empty if never opened.
    pub async fn comment_cards(&self, meme_id: &str) -> Result<Vec<CommentCard>, ApiError> {
        let Some(section) = self.comments.get(meme_id) else {
            return Ok(Vec::new());
        };
        let comments: Vec<&Comment> = section.loader.items().collect();
        let Some(authors) = self
            .resolve_authors(comments.iter().map(|c| c.author_id.as_str()))
            .await?
        else {
            return Ok(Vec::new());
        };
        Ok(comments
            .into_iter()
            .zip(authors)
            .map(|(comment, author)| CommentCard { comment: comment.clone(), author })
            .collect())
    }

    /// Posts a comment and puts it at the top of the meme's loaded comments.
    ///
    /// Blank content is ignored. The list is not re-fetched, and a closed view
    /// is left untouched.
    pub async fn post_comment(&mut self, meme_id: &str, content: &str) -> Result<Option<Comment>, ApiError> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let comment = self.api.create_comment(&self.creds, meme_id, content).await?;
        if self.cancel.is_cancelled() {
            tracing::debug!(%meme_id, comment_id = %comment.id, "View closed, not merging comment");
            return Ok(Some(comment));
        }
        if let Some(section) = self.comments.get_mut(meme_id) {
            section.loader.prepend(comment.clone());
        }
        Ok(Some(comment))
    }

    // Unauthorized aborts the whole view; any other lookup failure leaves that author blank.
    // `None` once the view is closed.
    async fn resolve_authors<'a>(
        &self,
        ids: impl Iterator<Item = &'a str>,
    ) -> Result<Option<Vec<Option<Author>>>, ApiError> {
        let lookups = ids.map(|id| self.authors.resolve(id, &self.creds));
        let results = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            results = join_all(lookups) => Some(results),
        };
        let Some(results) = results.filter(|_| !self.cancel.is_cancelled()) else {
            tracing::debug!("Discarding authors for a closed view");
            return Ok(None);
        };

        let mut authors = Vec::new();
        for (position, result) in results.into_iter().enumerate() {
            match result {
                Ok(author) => authors.push(Some(author)),
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized),
                Err(e) => {
                    tracing::warn!(position, error = %e, "Could not resolve author");
                    authors.push(None);
                }
            }
        }
        Ok(Some(authors))
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
