//! Tests for the favorites store

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::favorites::*;
    use crate::models::{FavoriteEntry, MediaType, NewFavorite};
    use crate::storage::{FileStore, KeyValueStore, MemoryStore};

    fn fav(id: i64, media_type: MediaType, title: &str) -> NewFavorite {
        NewFavorite {
            id,
            media_type,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
        }
    }

    fn reload(store: &FavoritesStore<MemoryStore>) -> Vec<FavoriteEntry> {
        FavoritesStore::initialize(store.storage().clone()).list().to_vec()
    }

    #[test]
    fn test_add_list_remove_scenario() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        assert!(store.list().is_empty());

        assert!(store
            .add(NewFavorite { id: 42, media_type: MediaType::Movie, title: "X".to_string(), poster_path: None })
            .unwrap());
        let list = store.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 42);
        assert_eq!(list[0].media_type, MediaType::Movie);
        assert_eq!(list[0].title, "X");
        assert_eq!(list[0].poster_path, None);
        assert!(chrono::DateTime::parse_from_rfc3339(&list[0].added_at).is_ok());
        assert!(list[0].added_at.ends_with('Z'));

        assert!(store.remove(42, MediaType::Movie).unwrap());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        assert!(store.add(fav(1, MediaType::Movie, "First")).unwrap());
        let before = store.list().to_vec();
        let writes = store.storage().write_count;

        assert!(!store.add(fav(1, MediaType::Movie, "Renamed")).unwrap());
        assert_eq!(store.list(), &before[..]);
        assert_eq!(store.storage().write_count, writes);
    }

    #[test]
    fn test_same_id_different_type_are_distinct() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.add(fav(7, MediaType::Movie, "Movie 7")).unwrap();
        store.add(fav(7, MediaType::Series, "Series 7")).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.is_favorite(7, MediaType::Movie));
        assert!(store.is_favorite(7, MediaType::Series));

        store.remove(7, MediaType::Movie).unwrap();
        assert!(!store.is_favorite(7, MediaType::Movie));
        assert!(store.is_favorite(7, MediaType::Series));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.add(fav(1, MediaType::Series, "A")).unwrap();
        let writes = store.storage().write_count;

        assert!(!store.remove(99, MediaType::Series).unwrap());
        assert!(!store.remove(1, MediaType::Movie).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.storage().write_count, writes);
    }

    #[test]
    fn test_is_favorite_tracks_add_and_remove() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        assert!(!store.is_favorite(5, MediaType::Movie));
        store.add(fav(5, MediaType::Movie, "Five")).unwrap();
        assert!(store.is_favorite(5, MediaType::Movie));
        store.remove(5, MediaType::Movie).unwrap();
        assert!(!store.is_favorite(5, MediaType::Movie));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.add(fav(3, MediaType::Movie, "Zeta")).unwrap();
        store.add(fav(1, MediaType::Series, "Alpha")).unwrap();
        store.add(fav(2, MediaType::Movie, "Mu")).unwrap();
        store.remove(1, MediaType::Series).unwrap();
        store.add(fav(1, MediaType::Series, "Alpha")).unwrap();

        let ids: Vec<i64> = store.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        let movies: Vec<&str> = store.by_type(MediaType::Movie).map(|e| e.title.as_str()).collect();
        assert_eq!(movies, vec!["Zeta", "Mu"]);
    }

    #[test]
    fn test_reload_reproduces_collection_after_every_mutation() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        let ops: Vec<(bool, i64, MediaType)> = vec![
            (true, 1, MediaType::Movie),
            (true, 2, MediaType::Series),
            (true, 1, MediaType::Movie),
            (true, 3, MediaType::Movie),
            (false, 2, MediaType::Series),
            (false, 8, MediaType::Movie),
            (true, 2, MediaType::Movie),
        ];
        for (add, id, media_type) in ops {
            if add {
                store.add(fav(id, media_type, "t")).unwrap();
            } else {
                store.remove(id, media_type).unwrap();
            }
            assert_eq!(reload(&store), store.list().to_vec());
        }
    }

    #[test]
    fn test_no_duplicates_under_mixed_operations() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        let types = [MediaType::Movie, MediaType::Series];
        // Deterministic pseudo-random walk over a small id space
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let id = (seed % 6) as i64;
            let media_type = types[((seed >> 8) % 2) as usize];
            if (seed >> 16) % 3 == 0 {
                store.remove(id, media_type).unwrap();
            } else {
                store.add(fav(id, media_type, "t")).unwrap();
            }

            let list = store.list();
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    assert!(!(a.id == b.id && a.media_type == b.media_type));
                }
            }
        }
    }

    #[test]
    fn test_missing_storage_starts_empty() {
        let store = FavoritesStore::initialize(MemoryStore::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let store = FavoritesStore::initialize(MemoryStore::with_value(STORAGE_KEY, "{\"oops\":"));
        assert!(store.is_empty());

        let store = FavoritesStore::initialize(MemoryStore::with_value(STORAGE_KEY, r#"{"id":1}"#));
        assert!(store.is_empty());
    }

    #[test]
    fn test_loads_existing_payload_and_drops_duplicates() {
        let payload = r#"[
            {"id":10,"type":"movie","title":"Ten","poster_path":"/10.jpg","addedAt":"2024-01-01T00:00:00.000Z"},
            {"id":11,"type":"series","title":"Eleven","poster_path":null,"addedAt":"2024-01-02T00:00:00.000Z"},
            {"id":10,"type":"movie","title":"Ten again","poster_path":null,"addedAt":"2024-01-03T00:00:00.000Z"}
        ]"#;
        let store = FavoritesStore::initialize(MemoryStore::with_value(STORAGE_KEY, payload));
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].title, "Ten");
        assert_eq!(store.list()[0].added_at, "2024-01-01T00:00:00.000Z");
        assert_eq!(store.list()[1].media_type, MediaType::Series);
    }

    #[test]
    fn test_failed_write_keeps_memory_and_retries() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.storage_mut().fail_writes = true;

        let result = store.add(fav(1, MediaType::Movie, "One"));
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(store.is_favorite(1, MediaType::Movie));
        assert_eq!(store.storage().get(STORAGE_KEY).unwrap(), None);

        store.storage_mut().fail_writes = false;
        store.add(fav(2, MediaType::Movie, "Two")).unwrap();
        assert_eq!(reload(&store).len(), 2);
        assert_eq!(store.storage().write_count, 2);
    }

    #[test]
    fn test_failed_remove_write_still_removes() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.add(fav(1, MediaType::Series, "One")).unwrap();
        store.storage_mut().fail_writes = true;

        assert!(store.remove(1, MediaType::Series).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_subscribers_get_events_only_for_changes() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        let rx = store.subscribe();

        store.add(fav(4, MediaType::Movie, "Four")).unwrap();
        store.add(fav(4, MediaType::Movie, "Four")).unwrap();
        store.remove(9, MediaType::Movie).unwrap();
        store.remove(4, MediaType::Movie).unwrap();

        let events: Vec<FavoritesEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                FavoritesEvent::Added { id: 4, media_type: MediaType::Movie },
                FavoritesEvent::Removed { id: 4, media_type: MediaType::Movie },
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        let rx = store.subscribe();
        drop(rx);
        let kept = store.subscribe();
        store.add(fav(1, MediaType::Movie, "One")).unwrap();
        assert_eq!(kept.try_iter().count(), 1);
    }

    #[test]
    fn test_toggle() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        assert!(store.toggle(fav(3, MediaType::Series, "Three")).unwrap());
        assert!(store.is_favorite(3, MediaType::Series));
        assert!(!store.toggle(fav(3, MediaType::Series, "Three")).unwrap());
        assert!(!store.is_favorite(3, MediaType::Series));
    }

    #[test]
    fn test_clear_writes_once_and_notifies_each() {
        let mut store = FavoritesStore::initialize(MemoryStore::new());
        store.add(fav(1, MediaType::Movie, "One")).unwrap();
        store.add(fav(2, MediaType::Series, "Two")).unwrap();
        let rx = store.subscribe();
        let writes = store.storage().write_count;

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.is_empty());
        assert_eq!(store.storage().write_count, writes + 1);
        assert!(reload(&store).is_empty());
        assert_eq!(rx.try_iter().count(), 2);

        assert_eq!(store.clear().unwrap(), 0);
        assert_eq!(store.storage().write_count, writes + 1);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FavoritesStore::initialize(FileStore::new(dir.path()));
            store.add(fav(100, MediaType::Movie, "Persisted")).unwrap();
            store.add(fav(200, MediaType::Series, "Also")).unwrap();
        }
        let store = FavoritesStore::initialize(FileStore::new(dir.path()));
        let titles: Vec<&str> = store.list().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Persisted", "Also"]);
    }
}
