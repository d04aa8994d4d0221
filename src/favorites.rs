//! Favorites store
//!
//! Insertion-ordered list of favorite movies and series, unique per
//! `(id, media_type)`. The whole list is written back to the key-value store
//! after every mutation and read exactly once, in [`FavoritesStore::initialize`].

use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{SecondsFormat, Utc};

use crate::error::Result;
use crate::models::{FavoriteEntry, MediaType, NewFavorite};
use crate::storage::KeyValueStore;

pub const STORAGE_KEY: &str = "epikodi-favorites";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesEvent {
    Added { id: i64, media_type: MediaType },
    Removed { id: i64, media_type: MediaType },
}

pub struct FavoritesStore<S: KeyValueStore> {
    entries: Vec<FavoriteEntry>,
    storage: S,
    subscribers: Vec<Sender<FavoritesEvent>>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Load the persisted collection; anything unreadable starts an empty one
    pub fn initialize(storage: S) -> Self {
        let entries = match storage.get(STORAGE_KEY) {
            Ok(Some(payload)) => match serde_json::from_str::<Vec<FavoriteEntry>>(&payload) {
                Ok(entries) => dedup(entries),
                Err(e) => {
                    tracing::warn!("Stored favorites are unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read stored favorites, starting empty: {}", e);
                Vec::new()
            }
        };
        tracing::info!("Loaded {} favorites", entries.len());

        Self {
            entries,
            storage,
            subscribers: Vec::new(),
        }
    }

    /// Returns `Ok(false)` without touching storage when the item is already a favorite.
    ///
    /// A failed write is reported, but the entry stays in memory.
    pub fn add(&mut self, item: NewFavorite) -> Result<bool> {
        if self.is_favorite(item.id, item.media_type) {
            return Ok(false);
        }

        let (id, media_type) = (item.id, item.media_type);
        self.entries.push(FavoriteEntry {
            id,
            media_type,
            title: item.title,
            poster_path: item.poster_path,
            added_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        tracing::debug!("Added favorite {} {}", media_type, id);

        let persisted = self.persist();
        self.notify(FavoritesEvent::Added { id, media_type });
        persisted.map(|_| true)
    }

    /// Returns `Ok(false)` without touching storage when nothing matched
    pub fn remove(&mut self, id: i64, media_type: MediaType) -> Result<bool> {
        let Some(pos) = self.position(id, media_type) else {
            return Ok(false);
        };
        self.entries.remove(pos);
        tracing::debug!("Removed favorite {} {}", media_type, id);

        let persisted = self.persist();
        self.notify(FavoritesEvent::Removed { id, media_type });
        persisted.map(|_| true)
    }

    /// Remove when present, add otherwise. Returns whether the item is now a favorite.
    pub fn toggle(&mut self, item: NewFavorite) -> Result<bool> {
        if self.is_favorite(item.id, item.media_type) {
            self.remove(item.id, item.media_type).map(|_| false)
        } else {
            self.add(item).map(|_| true)
        }
    }

    /// Drop every entry with a single write. Returns how many were removed.
    pub fn clear(&mut self) -> Result<usize> {
        if self.entries.is_empty() {
            return Ok(0);
        }
        let removed = std::mem::take(&mut self.entries);
        tracing::info!("Cleared {} favorites", removed.len());

        let persisted = self.persist();
        for entry in &removed {
            self.notify(FavoritesEvent::Removed { id: entry.id, media_type: entry.media_type });
        }
        persisted.map(|_| removed.len())
    }

    pub fn is_favorite(&self, id: i64, media_type: MediaType) -> bool {
        self.position(id, media_type).is_some()
    }

    pub fn list(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn by_type(&self, media_type: MediaType) -> impl Iterator<Item = &FavoriteEntry> {
        self.entries.iter().filter(move |e| e.media_type == media_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscribe(&mut self) -> Receiver<FavoritesEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[cfg(test)]
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn position(&self, id: i64, media_type: MediaType) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id && e.media_type == media_type)
    }

    fn persist(&mut self) -> Result<()> {
        let payload = serde_json::to_string(&self.entries)?;
        self.storage.set(STORAGE_KEY, &payload).map_err(|e| {
            tracing::warn!("Failed to persist {} favorites: {}", self.entries.len(), e);
            e
        })
    }

    fn notify(&mut self, event: FavoritesEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// A hand-edited file may carry duplicates; keep the first occurrence
fn dedup(entries: Vec<FavoriteEntry>) -> Vec<FavoriteEntry> {
    let mut kept: Vec<FavoriteEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !kept.iter().any(|k| k.id == entry.id && k.media_type == entry.media_type) {
            kept.push(entry);
        }
    }
    kept
}
