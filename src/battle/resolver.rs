use crate::battle::participant::{BattleParticipant, FALLBACK_MOVE};
use crate::battle::state::{BattleEvent, BattleLog, BattleOutcome, BattleRng};

/// Turn cap before the exhaustion ruling.
pub const MAX_TURNS: u32 = 20;

const BASE_DODGE_CHANCE: f64 = 0.12;
const MAX_DODGE_CHANCE: f64 = 0.35;
const DODGE_SPEED_SCALE: f64 = 900.0;
const CRIT_CHANCE: f64 = 0.1;
const CRIT_MULTIPLIER: f64 = 1.5;
const MIN_DAMAGE: f64 = 10.0;

/// Everything a finished clash produces: the commentary and the ruling.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleReport {
    pub log: BattleLog,
    pub outcome: BattleOutcome,
}

/// Resolves one full battle between two participants.
///
/// The faster fighter strikes first (a coin flip breaks exact speed ties),
/// then attacker and defender roles alternate for up to [`MAX_TURNS`] turns.
/// Each attack picks a random move, may be dodged, and otherwise deals
/// variance-rolled damage with a chance of a critical hit. A knockout ends
/// the battle immediately; hitting the turn cap rules on remaining HP, with
/// equal totals declared a draw.
///
/// The shape of the result is deterministic but its content is not: every
/// probabilistic step draws from `rng`, so identical inputs can produce
/// different logs and outcomes unless the rng is scripted or seeded.
pub fn resolve_battle(
    challenger: &BattleParticipant,
    opponent: &BattleParticipant,
    rng: &mut BattleRng,
) -> BattleReport {
    let fighters = [challenger, opponent];
    let mut hp = [challenger.max_hp, opponent.max_hp];
    let mut log = BattleLog::new();

    let mut attacker = first_mover(challenger, opponent, rng);
    log.push(BattleEvent::FirstMover {
        name: fighters[attacker].name.clone(),
    });

    for _ in 0..MAX_TURNS {
        let defender = 1 - attacker;
        let (atk, def) = (fighters[attacker], fighters[defender]);

        let move_name = pick_move(atk, rng);
        log.push(BattleEvent::MoveUsed {
            attacker: atk.name.clone(),
            move_name: move_name.clone(),
        });

        if rng.next_outcome("dodge check") < dodge_chance(atk, def) {
            log.push(BattleEvent::Dodged {
                defender: def.name.clone(),
            });
            attacker = defender;
            continue;
        }

        let (damage, critical) = roll_damage(atk, def, rng);
        if critical {
            log.push(BattleEvent::CriticalHit);
        }
        hp[defender] = hp[defender].saturating_sub(damage);
        log.push(BattleEvent::DamageDealt {
            move_name: move_name.clone(),
            damage,
            defender: def.name.clone(),
            remaining_hp: hp[defender],
        });

        if hp[defender] == 0 {
            log.push(BattleEvent::Collapsed {
                defender: def.name.clone(),
            });
            return BattleReport {
                log,
                outcome: BattleOutcome::Win {
                    name: atk.name.clone(),
                    summary: format!("{} overpowers {} with {}!", atk.name, def.name, move_name),
                },
            };
        }

        attacker = defender;
    }

    // Turn cap reached with both fighters standing.
    if hp[0] == hp[1] {
        log.push(BattleEvent::Stalemate);
        return BattleReport {
            log,
            outcome: BattleOutcome::Draw {
                summary: "Both Pokémon withstand every assault and the match ends in a draw."
                    .to_string(),
            },
        };
    }

    let winner = if hp[0] > hp[1] { 0 } else { 1 };
    let loser = 1 - winner;
    log.push(BattleEvent::StillStanding {
        winner: fighters[winner].name.clone(),
        loser: fighters[loser].name.clone(),
    });
    BattleReport {
        log,
        outcome: BattleOutcome::Win {
            name: fighters[winner].name.clone(),
            summary: format!(
                "{} emerges victorious after a fierce exchange!",
                fighters[winner].name
            ),
        },
    }
}

/// Chance for `defender` to dodge an attack from `attacker`.
///
/// Starts at 12%, grows with the defender's speed advantage, and caps at 35%.
pub fn dodge_chance(attacker: &BattleParticipant, defender: &BattleParticipant) -> f64 {
    let speed_gap = f64::from(defender.speed) - f64::from(attacker.speed);
    (BASE_DODGE_CHANCE + (speed_gap / DODGE_SPEED_SCALE).max(0.0)).min(MAX_DODGE_CHANCE)
}

/// Index of the fighter who attacks first: 0 for the challenger, 1 for the
/// opponent. Strictly higher speed wins; an exact tie flips a coin.
fn first_mover(
    challenger: &BattleParticipant,
    opponent: &BattleParticipant,
    rng: &mut BattleRng,
) -> usize {
    if challenger.speed > opponent.speed {
        0
    } else if opponent.speed > challenger.speed {
        1
    } else if rng.next_outcome("turn order coin flip") < 0.5 {
        0
    } else {
        1
    }
}

/// Picks a uniformly random move name from the attacker's pool. Cosmetic
/// only; the choice never feeds the damage formula.
fn pick_move(attacker: &BattleParticipant, rng: &mut BattleRng) -> String {
    let draw = rng.next_outcome("move selection");
    if attacker.moves.is_empty() {
        return FALLBACK_MOVE.to_string();
    }
    let index = ((draw * attacker.moves.len() as f64) as usize).min(attacker.moves.len() - 1);
    attacker.moves[index].clone()
}

/// Rolls damage for a landed attack and whether it was a critical hit.
///
/// Base damage is attack times U(0.65, 1.10) minus 30% of defense plus
/// U(0, 20) noise, rounded and floored at 10. A critical (10%) multiplies
/// the floored damage by 1.5.
fn roll_damage(
    attacker: &BattleParticipant,
    defender: &BattleParticipant,
    rng: &mut BattleRng,
) -> (u16, bool) {
    let multiplier = 0.65 + rng.next_outcome("damage roll") * 0.45;
    let noise = rng.next_outcome("damage variance") * 20.0;
    let base =
        f64::from(attacker.attack) * multiplier - f64::from(defender.defense) * 0.3 + noise;
    let mut damage = base.round().max(MIN_DAMAGE);

    let critical = rng.next_outcome("critical hit check") < CRIT_CHANCE;
    if critical {
        damage = (damage * CRIT_MULTIPLIER).round();
    }
    (damage as u16, critical)
}
