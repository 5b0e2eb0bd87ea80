use serde::{Deserialize, Serialize};

use crate::detail::{PokemonDetail, PokemonRef};

/// Stand-in base stat when the catalog record is missing "hp".
pub const DEFAULT_HP_STAT: u16 = 55;
/// Stand-in base stat for any other missing stat.
pub const DEFAULT_STAT: u16 = 50;
/// No fighter enters the arena with less than this much HP.
pub const MIN_HP: u16 = 80;
/// Size of the move pool carried into battle.
pub const MOVE_POOL_LIMIT: usize = 6;
/// Used when a catalog record lists no moves at all.
pub const FALLBACK_MOVE: &str = "tackle";

/// A fighter prepared for the arena, with battle stats derived from its
/// catalog record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleParticipant {
    pub id: u32,
    pub name: String,
    pub image: String,
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
    pub moves: Vec<String>,
}

impl BattleParticipant {
    /// Builds a participant from a slot card and its full catalog record.
    ///
    /// Display identity (name, image) comes from the card; battle stats come
    /// from the record. HP is the "hp" base stat scaled by four with a floor
    /// of [`MIN_HP`]; attack and defense each take the better of the physical
    /// and special variants. The move pool keeps the first
    /// [`MOVE_POOL_LIMIT`] listed moves with hyphens rendered as spaces,
    /// dropping slots that carry no move name; a pool left empty falls back
    /// to [`FALLBACK_MOVE`].
    pub fn new(pokemon: &PokemonRef, detail: &PokemonDetail) -> Self {
        let hp_stat = detail.stat("hp").unwrap_or(DEFAULT_HP_STAT);
        let attack = detail.stat("attack").unwrap_or(DEFAULT_STAT);
        let special_attack = detail.stat("special-attack").unwrap_or(DEFAULT_STAT);
        let defense = detail.stat("defense").unwrap_or(DEFAULT_STAT);
        let special_defense = detail.stat("special-defense").unwrap_or(DEFAULT_STAT);
        let speed = detail.stat("speed").unwrap_or(DEFAULT_STAT);

        // Unnamed slots are dropped after the cut; they still spend pool
        // positions.
        let mut moves: Vec<String> = detail
            .moves
            .iter()
            .take(MOVE_POOL_LIMIT)
            .map(|name| name.replace('-', " "))
            .filter(|name| !name.is_empty())
            .collect();
        if moves.is_empty() {
            moves.push(FALLBACK_MOVE.to_string());
        }

        BattleParticipant {
            id: detail.id,
            name: pokemon.name.clone(),
            image: pokemon.image.clone(),
            max_hp: hp_stat.saturating_mul(4).max(MIN_HP),
            attack: attack.max(special_attack),
            defense: defense.max(special_defense),
            speed,
            moves,
        }
    }
}
