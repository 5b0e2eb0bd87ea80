//! Persisted favorites, keyed by creature identifier.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::detail::PokemonRef;
use crate::storage::{load_versioned, save_versioned, Storage};

const STORE_KEY: &str = "pokemon-favorites";
const STORE_VERSION: u32 = 1;

type FavoriteMap = BTreeMap<u32, PokemonRef>;

/// Favorites store, persisted across sessions under the `pokemon-favorites`
/// schema name. Mutations persist the new map and notify watch subscribers.
pub struct Favorites {
    storage: Arc<dyn Storage>,
    state: watch::Sender<FavoriteMap>,
}

impl Favorites {
    /// Creates the store, restoring any persisted favorites.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let initial =
            match load_versioned::<FavoriteMap>(storage.as_ref(), STORE_KEY, STORE_VERSION) {
                Ok(Some(favorites)) => favorites,
                Ok(None) => FavoriteMap::new(),
                Err(err) => {
                    tracing::warn!("Failed to restore favorites: {}", err);
                    FavoriteMap::new()
                }
            };
        Favorites {
            storage,
            state: watch::channel(initial).0,
        }
    }

    /// Adds the reference when absent, removes it when present. Zero
    /// identifiers are no-ops.
    pub fn toggle(&self, pokemon: &PokemonRef) {
        if pokemon.id == 0 {
            return;
        }
        self.state.send_modify(|favorites| {
            if favorites.remove(&pokemon.id).is_none() {
                favorites.insert(pokemon.id, pokemon.clone());
            }
        });
        self.persist();
    }

    /// Drops one favorite. Zero identifiers are no-ops.
    pub fn remove(&self, id: u32) {
        if id == 0 {
            return;
        }
        self.state.send_modify(|favorites| {
            favorites.remove(&id);
        });
        self.persist();
    }

    pub fn clear(&self) {
        self.state.send_replace(FavoriteMap::new());
        self.persist();
    }

    pub fn is_favorite(&self, id: u32) -> bool {
        self.state.borrow().contains_key(&id)
    }

    /// Favorites in identifier order, for stable iteration.
    pub fn list(&self) -> Vec<PokemonRef> {
        self.state.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoriteMap> {
        self.state.subscribe()
    }

    fn persist(&self) {
        let snapshot = self.state.borrow().clone();
        if let Err(err) =
            save_versioned(self.storage.as_ref(), STORE_KEY, STORE_VERSION, &snapshot)
        {
            tracing::warn!("Failed to persist favorites: {}", err);
        }
    }
}
