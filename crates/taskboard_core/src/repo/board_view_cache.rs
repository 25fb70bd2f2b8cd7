//! Read-through cache of per-account board views.
//!
//! # Responsibility
//! - Serve `BoardView` lookups keyed by `(uid, board_id)`.
//! - Drop entries when ownership changes so the next lookup reloads.
//!
//! # Invariants
//! - Only present views are cached; a miss for an unknown pair is reloaded
//!   every time.
//! - An entry is served for at most the configured TTL after it was loaded.
//! - Writers evict before they change the ownership row.

use crate::config::CacheSettings;
use crate::model::board::BoardView;
use crate::model::{AccountId, BoardId};
use crate::repo::board_repo::BoardRepository;
use crate::repo::RepoResult;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Authorization lookup consumed by the path resolver.
pub trait BoardViewLookup {
    /// The board as seen by `uid`, or `None` when the account has no access
    /// or the board does not exist.
    fn find(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>>;
    /// Forgets any cached view for the pair.
    fn evict(&self, uid: AccountId, board_id: BoardId);
}

struct CachedView {
    view: BoardView,
    loaded_at: Instant,
}

/// LRU + TTL cache in front of a [`BoardRepository`].
pub struct BoardViewCache<B> {
    source: B,
    ttl: Duration,
    entries: Mutex<LruCache<(AccountId, BoardId), CachedView>>,
}

impl<B: BoardRepository> BoardViewCache<B> {
    pub fn new(source: B, settings: &CacheSettings) -> Self {
        let capacity =
            NonZeroUsize::new(settings.board_view_max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            ttl: settings.board_view_ttl(),
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached view.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<B: BoardRepository> BoardViewLookup for BoardViewCache<B> {
    fn find(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>> {
        let key = (uid, board_id);
        {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(cached) if cached.loaded_at.elapsed() < self.ttl => {
                    log::debug!(
                        "event=board_view_lookup module=cache status=hit uid={uid} board_id={board_id}"
                    );
                    return Ok(Some(cached.view.clone()));
                }
                Some(_) => {
                    entries.pop(&key);
                }
                None => {}
            }
        }

        // Lock is released while the store is queried.
        let loaded = self.source.find_board_view(uid, board_id)?;
        log::debug!(
            "event=board_view_lookup module=cache status=miss uid={uid} board_id={board_id} found={}",
            loaded.is_some()
        );
        if let Some(view) = &loaded {
            self.entries.lock().put(
                key,
                CachedView {
                    view: view.clone(),
                    loaded_at: Instant::now(),
                },
            );
        }
        Ok(loaded)
    }

    fn evict(&self, uid: AccountId, board_id: BoardId) {
        if self.entries.lock().pop(&(uid, board_id)).is_some() {
            log::debug!(
                "event=board_view_evict module=cache status=ok uid={uid} board_id={board_id}"
            );
        }
    }
}

impl<V: BoardViewLookup + ?Sized> BoardViewLookup for &V {
    fn find(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>> {
        (**self).find(uid, board_id)
    }

    fn evict(&self, uid: AccountId, board_id: BoardId) {
        (**self).evict(uid, board_id);
    }
}
