//! Crawl-scoped dedup state
//!
//! Both structures are created empty by the crawl controller and dropped
//! with it; nothing here outlives a run.

use dashmap::DashSet;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use url::Url;

use crate::utils::{PropertyId, property_id};

/// Card identifiers already handled in this run
///
/// `insert` is an atomic check-and-insert, so two page tasks racing on the
/// same identifier cannot both win.
#[derive(Debug, Default)]
pub struct SeenIds {
    ids: DashSet<PropertyId>,
}

impl SeenIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`; `false` if it was already seen
    pub fn insert(&self, id: PropertyId) -> bool {
        self.ids.insert(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Default)]
struct CollectionInner {
    urls: IndexMap<Url, Option<PropertyId>>,
    ids: HashSet<PropertyId>,
}

/// The crawl's output set, in insertion order
///
/// A URL is refused if it is already present or if another URL with the
/// same property id was collected first. URLs without an id are keyed on
/// the URL alone.
#[derive(Debug, Default)]
pub struct UrlCollection {
    inner: Mutex<CollectionInner>,
}

impl UrlCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `url`; `false` if it (or its property id) is already collected
    pub fn insert(&self, url: Url) -> bool {
        let id = property_id(&url);
        let mut inner = self.inner.lock();
        if inner.urls.contains_key(&url) {
            return false;
        }
        if let Some(id) = id
            && !inner.ids.insert(id)
        {
            return false;
        }
        inner.urls.insert(url, id);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().urls.is_empty()
    }

    /// Copy of the collected URLs in insertion order
    #[must_use]
    pub fn to_vec(&self) -> Vec<Url> {
        self.inner.lock().urls.keys().cloned().collect()
    }
}
