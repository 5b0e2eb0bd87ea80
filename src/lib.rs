// In: src/lib.rs

//! Pokemon Arena Battle Core
//!
//! An async battle engine over a remote creature catalog: a
//! request-deduplicating detail cache, persisted battle slots and favorites,
//! a probabilistic turn-by-turn battle resolver, and a cancellable phase
//! controller that sequences each battle's presentation.

// --- MODULE DECLARATIONS ---
// This declares the module hierarchy for the crate.
pub mod api;
pub mod battle;
pub mod config;
pub mod detail;
pub mod errors;
pub mod favorites;
pub mod roster;
pub mod search;
pub mod slots;
pub mod storage;

// --- PUBLIC API RE-EXPORTS ---
// This section defines the public-facing API of the `pokemon-arena` crate,
// making it easy for users to import the most important types directly.

// --- Remote catalog access ---
pub use api::{artwork_url, CatalogApi, HttpCatalog, DEFAULT_API_URL};

// --- Detail records and the fetch cache ---
pub use detail::{DetailCache, FetchOptions, FetchState, FetchStatus, PokemonDetail, PokemonRef};

// --- Battle engine: participants, resolution, presentation ---
pub use battle::controller::{BattleController, BattlePacing, BattleView};
pub use battle::participant::BattleParticipant;
pub use battle::resolver::{resolve_battle, BattleReport};
pub use battle::state::{BattleEvent, BattleLog, BattleOutcome, BattlePhase, BattleRng};

// --- Persisted application state ---
pub use favorites::Favorites;
pub use slots::{BattleSlots, SlotName, SlotState};
pub use storage::{JsonFileStorage, MemoryStorage, Storage};

// --- Catalog listing and lookup ---
pub use roster::{Roster, RosterState};
pub use search::{search, SearchError, SearchHit};

// --- Runtime configuration ---
pub use config::ArenaConfig;

// Crate-specific error and result types.
pub use errors::{
    ArenaError, ArenaResult, BattleStartError, ConfigError, FetchError, FetchResult, StorageError,
    StorageResult,
};
