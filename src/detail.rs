//! Normalized creature records and the keyed detail cache.
//!
//! The cache owns a map from key to fetch lifecycle state. Keys are strings:
//! numeric identifiers and creature names both resolve through the same
//! catalog path, so `"25"` and `"pikachu"` are separate entries. Records are
//! cached until a forced refetch replaces them wholesale.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::api::{self, CatalogApi, PokemonPayload, SummaryPayload};
use crate::errors::{FetchError, FetchResult};

/// Most move names retained on a normalized record.
pub const MAX_MOVES_RETAINED: usize = 8;

/// One named base stat from the catalog (values 0-255).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEntry {
    pub name: String,
    pub value: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityEntry {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CryUrls {
    pub latest: String,
    pub legacy: String,
}

/// Normalized representation of one fetched catalog entry.
///
/// Immutable once built; the cache replaces records wholesale and never
/// mutates them in place. The untouched payload rides along in `raw` for
/// traceability.
#[derive(Debug, Clone, PartialEq)]
pub struct PokemonDetail {
    pub id: u32,
    pub name: String,
    /// Tenths of a metre
    pub height: u32,
    /// Tenths of a kilogram
    pub weight: u32,
    pub base_experience: u32,
    pub types: Vec<String>,
    pub stats: Vec<StatEntry>,
    pub abilities: Vec<AbilityEntry>,
    /// At most [`MAX_MOVES_RETAINED`] entries
    pub moves: Vec<String>,
    pub cries: CryUrls,
    /// Official-artwork sprite, falling back to the default front sprite
    pub sprite: String,
    pub raw: Value,
}

impl PokemonDetail {
    /// Normalizes a raw detail document. Missing optional fields become
    /// empty defaults; only a payload that fails to match the catalog shape
    /// at all is an error.
    pub fn from_payload(raw: Value) -> FetchResult<Self> {
        let payload: PokemonPayload = serde_json::from_value(raw.clone())
            .map_err(|err| FetchError::Decode(err.to_string()))?;

        let sprite = pointer_string(&payload.sprites, "/other/official-artwork/front_default")
            .or_else(|| pointer_string(&payload.sprites, "/front_default"))
            .unwrap_or_default();

        let cries = payload
            .cries
            .map(|cries| CryUrls {
                latest: cries.latest.unwrap_or_default(),
                legacy: cries.legacy.unwrap_or_default(),
            })
            .unwrap_or_default();

        Ok(PokemonDetail {
            id: payload.id,
            name: payload.name,
            height: payload.height,
            weight: payload.weight,
            base_experience: payload.base_experience.unwrap_or(0),
            types: payload
                .types
                .iter()
                .map(|slot| {
                    slot.r#type
                        .as_ref()
                        .map(|named| named.name.clone())
                        .unwrap_or_default()
                })
                .collect(),
            stats: payload
                .stats
                .iter()
                .map(|slot| StatEntry {
                    name: slot
                        .stat
                        .as_ref()
                        .map(|named| named.name.clone())
                        .unwrap_or_default(),
                    value: slot.base_stat,
                })
                .collect(),
            abilities: payload
                .abilities
                .iter()
                .map(|slot| AbilityEntry {
                    name: slot
                        .ability
                        .as_ref()
                        .map(|named| named.name.clone())
                        .unwrap_or_default(),
                    is_hidden: slot.is_hidden,
                })
                .collect(),
            moves: payload
                .moves
                .iter()
                .take(MAX_MOVES_RETAINED)
                .map(|slot| {
                    slot.r#move
                        .as_ref()
                        .map(|named| named.name.clone())
                        .unwrap_or_default()
                })
                .collect(),
            cries,
            sprite,
            raw,
        })
    }

    /// Base value of a named stat, if the record carries it.
    pub fn stat(&self, name: &str) -> Option<u16> {
        self.stats
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value)
    }
}

fn pointer_string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

/// Minimal creature reference shared by the slots, favorites, and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonRef {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub url: String,
}

impl PokemonRef {
    /// Projects one listing entry; entries whose URL carries no identifier
    /// are dropped.
    pub fn from_summary(summary: &SummaryPayload) -> Option<Self> {
        let id = summary.parse_id()?;
        Some(PokemonRef {
            id,
            name: summary.name.clone(),
            image: api::artwork_url(id),
            url: summary.url.clone(),
        })
    }

    /// Projects a full record down to the reference shape.
    pub fn from_detail(detail: &PokemonDetail) -> Self {
        let url = detail
            .raw
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| api::canonical_url(detail.id));
        PokemonRef {
            id: detail.id,
            name: detail.name.clone(),
            image: detail.sprite.clone(),
            url,
        }
    }
}

/// Lifecycle status of one key's remote fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// No fetch has been recorded for the key
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Point-in-time view of one key: status, latest record, latest error.
///
/// A prior record stays visible while a refetch is in flight and survives a
/// failed refetch; entering the loading state clears the error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchState {
    pub status: FetchStatus,
    pub detail: Option<Arc<PokemonDetail>>,
    pub error: Option<String>,
}

/// Options for [`DetailCache::fetch_detail`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Refetch even when a record is cached or a request is in flight
    pub force: bool,
}

impl FetchOptions {
    pub fn forced() -> Self {
        FetchOptions { force: true }
    }
}

/// Keyed store of creature records with per-key fetch status.
///
/// One instance per application context; every caller shares the same map,
/// so concurrent views of the same creature trigger at most one request.
/// Transitions are broadcast per key through watch channels.
pub struct DetailCache {
    api: Arc<dyn CatalogApi>,
    entries: Mutex<HashMap<String, watch::Sender<FetchState>>>,
}

impl DetailCache {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        DetailCache {
            api,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves one key to a record.
    ///
    /// Returns the cached record without network I/O when present (unless
    /// forced), `None` while a non-forced request is already in flight, and
    /// `None` on failure; failures are recorded in the key's state rather
    /// than returned. An empty key is a no-op.
    pub async fn fetch_detail(
        &self,
        key: &str,
        options: FetchOptions,
    ) -> Option<Arc<PokemonDetail>> {
        if key.is_empty() {
            return None;
        }

        // Check-and-transition atomically, before any network I/O. The lock
        // is never held across an await.
        {
            let mut entries = self.entries.lock().unwrap();
            let sender = entry_sender(&mut entries, key);
            let snapshot = sender.borrow().clone();

            if !options.force {
                if snapshot.status == FetchStatus::Loading {
                    tracing::debug!("Fetch already in flight for key: {}", key);
                    return None;
                }
                if let Some(detail) = snapshot.detail {
                    tracing::debug!("Cache hit for key: {}", key);
                    return Some(detail);
                }
            }

            tracing::debug!("Cache miss for key: {}, fetching from catalog", key);
            sender.send_replace(FetchState {
                status: FetchStatus::Loading,
                detail: snapshot.detail,
                error: None,
            });
        }

        let result = self
            .api
            .detail(key)
            .await
            .and_then(PokemonDetail::from_payload);

        let mut entries = self.entries.lock().unwrap();
        let sender = entry_sender(&mut entries, key);
        match result {
            Ok(detail) => {
                let detail = Arc::new(detail);
                tracing::debug!("Stored detail for key: {} ({})", key, detail.name);
                sender.send_replace(FetchState {
                    status: FetchStatus::Success,
                    detail: Some(Arc::clone(&detail)),
                    error: None,
                });
                Some(detail)
            }
            Err(err) => {
                tracing::error!("Failed to fetch detail for key {}: {}", key, err);
                let prior = sender.borrow().detail.clone();
                sender.send_replace(FetchState {
                    status: FetchStatus::Error,
                    detail: prior,
                    error: Some(err.to_string()),
                });
                None
            }
        }
    }

    /// Latest cached record for a key, if any.
    pub fn get(&self, key: &str) -> Option<Arc<PokemonDetail>> {
        self.state(key).detail
    }

    pub fn status(&self, key: &str) -> FetchStatus {
        self.state(key).status
    }

    pub fn error(&self, key: &str) -> Option<String> {
        self.state(key).error
    }

    /// Snapshot of a key's full fetch state. Unknown keys read as idle.
    pub fn state(&self, key: &str) -> FetchState {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|sender| sender.borrow().clone())
            .unwrap_or_default()
    }

    /// Subscribes to every transition of one key. The receiver starts at the
    /// key's current state.
    pub fn subscribe(&self, key: &str) -> watch::Receiver<FetchState> {
        let mut entries = self.entries.lock().unwrap();
        entry_sender(&mut entries, key).subscribe()
    }

    /// Drops every entry and notifies subscribers with the idle state.
    pub fn reset(&self) {
        let mut entries = self.entries.lock().unwrap();
        for sender in entries.values() {
            sender.send_replace(FetchState::default());
        }
        entries.clear();
    }
}

fn entry_sender<'a>(
    entries: &'a mut HashMap<String, watch::Sender<FetchState>>,
    key: &str,
) -> &'a watch::Sender<FetchState> {
    entries
        .entry(key.to_string())
        .or_insert_with(|| watch::channel(FetchState::default()).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PagePayload;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn pikachu_payload() -> Value {
        json!({
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "weight": 60,
            "base_experience": 112,
            "abilities": [
                { "is_hidden": false, "ability": { "name": "static" } },
                { "is_hidden": true, "ability": { "name": "lightning-rod" } }
            ],
            "types": [ { "slot": 1, "type": { "name": "electric" } } ],
            "stats": [
                { "base_stat": 35, "stat": { "name": "hp" } },
                { "base_stat": 55, "stat": { "name": "attack" } },
                { "base_stat": 90, "stat": { "name": "speed" } }
            ],
            "moves": [
                { "move": { "name": "thunder-shock" } },
                { "move": { "name": "quick-attack" } }
            ],
            "sprites": {
                "front_default": "https://img/front/25.png",
                "other": { "official-artwork": { "front_default": "https://img/art/25.png" } }
            },
            "cries": { "latest": "https://cry/25.ogg", "legacy": "https://cry/legacy/25.ogg" }
        })
    }

    struct StubCatalog {
        payload: Value,
        failure: Mutex<Option<FetchError>>,
        gate: Option<Arc<Notify>>,
        detail_calls: AtomicUsize,
    }

    impl StubCatalog {
        fn new(payload: Value) -> Self {
            StubCatalog {
                payload,
                failure: Mutex::new(None),
                gate: None,
                detail_calls: AtomicUsize::new(0),
            }
        }

        fn gated(payload: Value, gate: Arc<Notify>) -> Self {
            StubCatalog {
                gate: Some(gate),
                ..StubCatalog::new(payload)
            }
        }

        fn fail_next(&self, err: FetchError) {
            *self.failure.lock().unwrap() = Some(err);
        }

        fn detail_calls(&self) -> usize {
            self.detail_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogApi for StubCatalog {
        async fn detail(&self, _key: &str) -> FetchResult<Value> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(err) = self.failure.lock().unwrap().take() {
                return Err(err);
            }
            Ok(self.payload.clone())
        }

        async fn page(&self, _offset: u32, _limit: u32) -> FetchResult<PagePayload> {
            Err(FetchError::Network("page not stubbed".to_string()))
        }
    }

    async fn wait_for_status(cache: &DetailCache, key: &str, status: FetchStatus) {
        for _ in 0..200 {
            if cache.status(key) == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("key {key} never reached {status:?}");
    }

    #[test]
    fn normalizes_full_payload() {
        let detail = PokemonDetail::from_payload(pikachu_payload()).unwrap();
        assert_eq!(detail.id, 25);
        assert_eq!(detail.name, "pikachu");
        assert_eq!(detail.height, 4);
        assert_eq!(detail.weight, 60);
        assert_eq!(detail.base_experience, 112);
        assert_eq!(detail.types, vec!["electric".to_string()]);
        assert_eq!(detail.stat("speed"), Some(90));
        assert_eq!(detail.stat("special-attack"), None);
        assert_eq!(detail.abilities.len(), 2);
        assert_eq!(detail.abilities[1].name, "lightning-rod");
        assert!(detail.abilities[1].is_hidden);
        assert_eq!(detail.moves, vec!["thunder-shock", "quick-attack"]);
        assert_eq!(detail.cries.latest, "https://cry/25.ogg");
        assert_eq!(detail.sprite, "https://img/art/25.png");
        assert_eq!(detail.raw, pikachu_payload());
    }

    #[test]
    fn sprite_falls_back_to_front_default_then_empty() {
        let mut payload = pikachu_payload();
        payload["sprites"] = json!({ "front_default": "https://img/front/25.png" });
        let detail = PokemonDetail::from_payload(payload).unwrap();
        assert_eq!(detail.sprite, "https://img/front/25.png");

        let mut payload = pikachu_payload();
        payload["sprites"] = json!({});
        let detail = PokemonDetail::from_payload(payload).unwrap();
        assert_eq!(detail.sprite, "");
    }

    #[test]
    fn retains_at_most_eight_moves() {
        let mut payload = pikachu_payload();
        let moves: Vec<Value> = (0..12)
            .map(|n| json!({ "move": { "name": format!("move-{n}") } }))
            .collect();
        payload["moves"] = Value::Array(moves);

        let detail = PokemonDetail::from_payload(payload).unwrap();
        assert_eq!(detail.moves.len(), MAX_MOVES_RETAINED);
        assert_eq!(detail.moves[7], "move-7");
    }

    #[test]
    fn substitutes_defaults_for_missing_optionals() {
        let detail =
            PokemonDetail::from_payload(json!({ "id": 132, "name": "ditto" })).unwrap();
        assert_eq!(detail.height, 0);
        assert_eq!(detail.base_experience, 0);
        assert!(detail.types.is_empty());
        assert!(detail.moves.is_empty());
        assert_eq!(detail.cries, CryUrls::default());
        assert_eq!(detail.sprite, "");
    }

    #[test]
    fn rejects_payload_without_identifier() {
        let err = PokemonDetail::from_payload(json!({ "name": "missingno" })).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn second_fetch_reuses_cached_record() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        let first = cache.fetch_detail("25", FetchOptions::default()).await.unwrap();
        let second = cache.fetch_detail("25", FetchOptions::default()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(api.detail_calls(), 1);
        assert_eq!(cache.status("25"), FetchStatus::Success);
    }

    #[tokio::test]
    async fn forced_fetch_always_hits_the_catalog() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        cache.fetch_detail("25", FetchOptions::default()).await;
        cache.fetch_detail("25", FetchOptions::forced()).await;

        assert_eq!(api.detail_calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_fetch_is_deduplicated() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(StubCatalog::gated(pikachu_payload(), gate.clone()));
        let cache = Arc::new(DetailCache::new(api.clone()));

        let background = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.fetch_detail("25", FetchOptions::default()).await })
        };
        wait_for_status(&cache, "25", FetchStatus::Loading).await;

        // Second caller sees the in-flight request and backs off.
        let parallel = cache.fetch_detail("25", FetchOptions::default()).await;
        assert!(parallel.is_none());
        assert_eq!(api.detail_calls(), 1);

        gate.notify_one();
        let first = background.await.unwrap();
        assert!(first.is_some());
        assert_eq!(cache.status("25"), FetchStatus::Success);
    }

    #[tokio::test]
    async fn failed_fetch_records_status_message() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        api.fail_next(FetchError::detail_status(404));
        let cache = DetailCache::new(api.clone());

        let fetched = cache.fetch_detail("9999", FetchOptions::default()).await;
        assert!(fetched.is_none());
        assert_eq!(cache.status("9999"), FetchStatus::Error);
        assert_eq!(
            cache.error("9999"),
            Some("Failed to load Pokemon detail (status 404).".to_string())
        );
    }

    #[tokio::test]
    async fn prior_record_survives_failed_refetch() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        let first = cache.fetch_detail("25", FetchOptions::default()).await.unwrap();
        api.fail_next(FetchError::Network("connection reset".to_string()));
        let refetched = cache.fetch_detail("25", FetchOptions::forced()).await;

        assert!(refetched.is_none());
        assert_eq!(cache.status("25"), FetchStatus::Error);
        let kept = cache.get("25").unwrap();
        assert!(Arc::ptr_eq(&first, &kept));
    }

    #[tokio::test]
    async fn successful_fetch_clears_prior_error() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        api.fail_next(FetchError::detail_status(500));
        let cache = DetailCache::new(api.clone());

        cache.fetch_detail("25", FetchOptions::default()).await;
        assert_eq!(cache.status("25"), FetchStatus::Error);

        cache.fetch_detail("25", FetchOptions::default()).await;
        assert_eq!(cache.status("25"), FetchStatus::Success);
        assert_eq!(cache.error("25"), None);
    }

    #[tokio::test]
    async fn empty_key_is_a_no_op() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        let fetched = cache.fetch_detail("", FetchOptions::default()).await;
        assert!(fetched.is_none());
        assert_eq!(api.detail_calls(), 0);
        assert_eq!(cache.state(""), FetchState::default());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        let mut rx = cache.subscribe("25");
        assert_eq!(rx.borrow().status, FetchStatus::Idle);

        cache.fetch_detail("25", FetchOptions::default()).await;
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.status, FetchStatus::Success);
        assert_eq!(state.detail.unwrap().name, "pikachu");
    }

    #[tokio::test]
    async fn reset_drops_every_entry() {
        let api = Arc::new(StubCatalog::new(pikachu_payload()));
        let cache = DetailCache::new(api.clone());

        cache.fetch_detail("25", FetchOptions::default()).await;
        cache.reset();

        assert_eq!(cache.status("25"), FetchStatus::Idle);
        assert!(cache.get("25").is_none());
    }
}
