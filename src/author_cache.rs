//! Single-flight cache of author profiles for one feed view.

use crate::{credentials::Credentials, domain::MemeApi, errors::ApiError, models::Author};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

type AuthorLookup = Shared<BoxFuture<'static, Result<Author, ApiError>>>;

enum Slot {
    /// A lookup is in flight; late callers attach to the same future.
    Pending(AuthorLookup),
    Resolved(Author),
}

/// Resolves author ids to profiles, issuing at most one request per id.
///
/// Entries live as long as the cache; there is no TTL and no size bound. A
/// failed lookup is reported to every caller waiting on it and then evicted,
/// so the next `resolve` for that id retries.
pub struct AuthorCache {
    api: Arc<dyn MemeApi>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl AuthorCache {
    pub fn new(api: Arc<dyn MemeApi>) -> Self {
        Self {
            api,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn resolve(&self, id: &str, creds: &Credentials) -> Result<Author, ApiError> {
        let lookup = {
            let mut slots = self.slots();
            match slots.get(id) {
                Some(Slot::Resolved(author)) => return Ok(author.clone()),
                Some(Slot::Pending(lookup)) => {
                    tracing::trace!(author_id = %id, "Joining in-flight author lookup");
                    lookup.clone()
                }
                None => {
                    tracing::debug!(author_id = %id, "Fetching author");
                    let api = Arc::clone(&self.api);
                    let creds = creds.clone();
                    let owned_id = id.to_string();
                    let lookup = async move { api.get_user(&creds, &owned_id).await }
                        .boxed()
                        .shared();
                    // Registered before the first poll so concurrent callers find it.
                    slots.insert(id.to_string(), Slot::Pending(lookup.clone()));
                    lookup
                }
            }
        };

        let result = lookup.clone().await;

        let mut slots = self.slots();
        let still_ours = matches!(slots.get(id), Some(Slot::Pending(current)) if current.ptr_eq(&lookup));
        if still_ours {
            match &result {
                Ok(author) => {
                    slots.insert(id.to_string(), Slot::Resolved(author.clone()));
                }
                Err(e) => {
                    tracing::warn!(author_id = %id, error = %e, "Author lookup failed, evicting");
                    slots.remove(id);
                }
            }
        }
        result
    }

    /// Number of ids with a pending or resolved entry.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_resolved(&self, id: &str) -> bool {
        matches!(self.slots().get(id), Some(Slot::Resolved(_)))
    }
}
