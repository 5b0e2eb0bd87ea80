use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::api::{CatalogApi, PagePayload};
use crate::battle::participant::BattleParticipant;
use crate::battle::state::BattleRng;
use crate::detail::{PokemonDetail, PokemonRef};
use crate::errors::{FetchError, FetchResult};

/// A builder for creating battle participants with common defaults.
///
/// # Example
/// ```
/// let fighter = TestParticipantBuilder::new("pikachu")
///     .with_speed(100)
///     .with_moves(vec!["thunder shock"])
///     .build();
/// ```
pub struct TestParticipantBuilder {
    name: String,
    max_hp: u16,
    attack: u16,
    defense: u16,
    speed: u16,
    moves: Vec<String>,
}

impl TestParticipantBuilder {
    /// Creates a new builder with mid-range stats and a 200 HP pool.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_hp: 200,
            attack: 50,
            defense: 50,
            speed: 50,
            moves: vec!["tackle".to_string()],
        }
    }

    pub fn with_hp(mut self, hp: u16) -> Self {
        self.max_hp = hp;
        self
    }

    pub fn with_attack(mut self, attack: u16) -> Self {
        self.attack = attack;
        self
    }

    pub fn with_defense(mut self, defense: u16) -> Self {
        self.defense = defense;
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_moves(mut self, moves: Vec<&str>) -> Self {
        self.moves = moves.into_iter().map(str::to_string).collect();
        self
    }

    pub fn build(self) -> BattleParticipant {
        BattleParticipant {
            id: 1,
            name: self.name,
            image: String::new(),
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            moves: self.moves,
        }
    }
}

/// Creates a `BattleRng` with a generous buffer of mid-range values (0.5).
/// Mid-range draws never dodge and never crit, so battles play out as plain
/// exchanges; useful when the specific outcome is not important.
pub fn predictable_rng() -> BattleRng {
    BattleRng::new_for_test(vec![0.5; 256])
}

/// Catalog detail payload with explicit base stats and moves, shaped the way
/// the remote API returns it.
pub fn catalog_payload(id: u32, name: &str, stats: &[(&str, u16)], moves: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "stats": stats
            .iter()
            .map(|(stat, value)| json!({ "base_stat": value, "stat": { "name": stat } }))
            .collect::<Vec<_>>(),
        "moves": moves
            .iter()
            .map(|name| json!({ "move": { "name": name } }))
            .collect::<Vec<_>>(),
        "sprites": {
            "front_default": format!("https://img.example/{}.png", id),
        },
    })
}

/// Parsed counterpart of [`catalog_payload`].
pub fn catalog_detail(id: u32, name: &str, stats: &[(&str, u16)], moves: &[&str]) -> PokemonDetail {
    match PokemonDetail::from_payload(catalog_payload(id, name, stats, moves)) {
        Ok(detail) => detail,
        Err(err) => panic!("Failed to build test detail for {}: {}", name, err),
    }
}

/// Minimal reference card for a slotted Pokemon.
pub fn card(id: u32, name: &str) -> PokemonRef {
    PokemonRef {
        id,
        name: name.to_string(),
        image: format!("https://img.example/{}.png", id),
        url: format!("https://pokeapi.co/api/v2/pokemon/{}/", id),
    }
}

/// Catalog stub serving canned detail payloads by key. Unknown keys answer
/// with a 404 status error; an optional gate holds every request open until
/// notified.
pub struct CannedCatalog {
    payloads: HashMap<String, Value>,
    gate: Option<Arc<Notify>>,
}

impl CannedCatalog {
    pub fn new() -> Self {
        Self {
            payloads: HashMap::new(),
            gate: None,
        }
    }

    pub fn with(mut self, key: &str, payload: Value) -> Self {
        self.payloads.insert(key.to_string(), payload);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl CatalogApi for CannedCatalog {
    async fn detail(&self, key: &str) -> FetchResult<Value> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.payloads
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::detail_status(404))
    }

    async fn page(&self, _offset: u32, _limit: u32) -> FetchResult<PagePayload> {
        Err(FetchError::Network("page not stubbed".to_string()))
    }
}
