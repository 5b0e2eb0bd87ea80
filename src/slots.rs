//! The two named battle positions and their persisted store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::detail::PokemonRef;
use crate::storage::{load_versioned, save_versioned, Storage};

const STORE_KEY: &str = "pokemon-battle-slots";
const STORE_VERSION: u32 = 1;

/// One of the two battle positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    Challenger,
    Opponent,
}

impl SlotName {
    /// Parses a UI-facing slot name. Unknown names map to `None`, which
    /// every caller treats as a no-op.
    pub fn parse(name: &str) -> Option<SlotName> {
        match name {
            "challenger" => Some(SlotName::Challenger),
            "opponent" => Some(SlotName::Opponent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Challenger => "challenger",
            SlotName::Opponent => "opponent",
        }
    }
}

/// Contents of both slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotState {
    pub challenger: Option<PokemonRef>,
    pub opponent: Option<PokemonRef>,
}

impl SlotState {
    pub fn get(&self, slot: SlotName) -> Option<&PokemonRef> {
        match slot {
            SlotName::Challenger => self.challenger.as_ref(),
            SlotName::Opponent => self.opponent.as_ref(),
        }
    }

    fn set(&mut self, slot: SlotName, value: Option<PokemonRef>) {
        match slot {
            SlotName::Challenger => self.challenger = value,
            SlotName::Opponent => self.opponent = value,
        }
    }

    /// True when neither position holds a creature.
    pub fn is_empty(&self) -> bool {
        self.challenger.is_none() && self.opponent.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.challenger.is_some() && self.opponent.is_some()
    }
}

/// Store of the two battle positions, persisted across sessions under the
/// `pokemon-battle-slots` schema name.
///
/// Mutations persist the new state (a persistence failure warns, it never
/// fails the caller) and broadcast it to watch subscribers.
pub struct BattleSlots {
    storage: Arc<dyn Storage>,
    state: watch::Sender<SlotState>,
}

impl BattleSlots {
    /// Creates the store, restoring any persisted slots.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let initial =
            match load_versioned::<SlotState>(storage.as_ref(), STORE_KEY, STORE_VERSION) {
                Ok(Some(state)) => state,
                Ok(None) => SlotState::default(),
                Err(err) => {
                    tracing::warn!("Failed to restore battle slots: {}", err);
                    SlotState::default()
                }
            };
        BattleSlots {
            storage,
            state: watch::channel(initial).0,
        }
    }

    pub fn snapshot(&self) -> SlotState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SlotState> {
        self.state.subscribe()
    }

    /// Assigns a creature to a named slot. Unknown slot names and zero
    /// identifiers are no-ops.
    pub fn set_slot(&self, slot: &str, pokemon: &PokemonRef) {
        if pokemon.id == 0 {
            return;
        }
        let Some(slot) = SlotName::parse(slot) else {
            return;
        };
        self.state
            .send_modify(|state| state.set(slot, Some(pokemon.clone())));
        self.persist();
    }

    /// Empties a named slot. Unknown slot names are no-ops.
    pub fn clear_slot(&self, slot: &str) {
        let Some(slot) = SlotName::parse(slot) else {
            return;
        };
        self.state.send_modify(|state| state.set(slot, None));
        self.persist();
    }

    /// Exchanges the challenger and opponent positions.
    pub fn swap_slots(&self) {
        self.state
            .send_modify(|state| std::mem::swap(&mut state.challenger, &mut state.opponent));
        self.persist();
    }

    /// Empties both positions.
    pub fn reset_slots(&self) {
        self.state.send_replace(SlotState::default());
        self.persist();
    }

    fn persist(&self) {
        let snapshot = self.snapshot();
        if let Err(err) =
            save_versioned(self.storage.as_ref(), STORE_KEY, STORE_VERSION, &snapshot)
        {
            tracing::warn!("Failed to persist battle slots: {}", err);
        }
    }
}
