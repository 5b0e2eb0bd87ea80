use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Copy, Default)]
pub enum BattlePhase {
    #[default]
    Idle,
    Countdown, // counting down before the fighters engage
    Engaged,   // countdown finished, the clash is being resolved
    Completed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Stage Management
    PreparationsComplete,
    BellRings,

    // Attack Resolution
    FirstMover {
        name: String,
    },
    MoveUsed {
        attacker: String,
        move_name: String,
    },
    Dodged {
        defender: String,
    },
    CriticalHit,
    DamageDealt {
        move_name: String,
        damage: u16,
        defender: String,
        remaining_hp: u16,
    },
    Collapsed {
        defender: String,
    },

    // Exhaustion Endings
    Stalemate,
    StillStanding {
        winner: String,
        loser: String,
    },
}

impl BattleEvent {
    /// Formats the event into its commentary line. Every event narrates;
    /// there are no silent events in the battle log.
    pub fn format(&self) -> String {
        match self {
            // === Stage Management Events ===
            BattleEvent::PreparationsComplete => {
                "Battle preparations complete. Trainers take their positions.".to_string()
            }
            BattleEvent::BellRings => "The battle bell rings!".to_string(),

            // === Attack Resolution Events ===
            BattleEvent::FirstMover { name } => {
                format!("{} strikes first thanks to their speed advantage.", name)
            }
            BattleEvent::MoveUsed { attacker, move_name } => {
                format!("{} uses {}!", attacker, move_name)
            }
            BattleEvent::Dodged { defender } => {
                format!("{} deftly dodges the attack!", defender)
            }
            BattleEvent::CriticalHit => "Critical hit!".to_string(),
            BattleEvent::DamageDealt { move_name, damage, defender, remaining_hp } => {
                format!(
                    "{} hits for {} damage. {} has {} HP remaining.",
                    move_name, damage, defender, remaining_hp
                )
            }
            BattleEvent::Collapsed { defender } => {
                format!("{} collapses and can no longer fight!", defender)
            }

            // === Exhaustion Ending Events ===
            BattleEvent::Stalemate => {
                "After an exhausting clash, neither Pokémon can secure the win.".to_string()
            }
            BattleEvent::StillStanding { winner, loser } => {
                format!(
                    "{} still stands while {} is too exhausted to continue.",
                    winner, loser
                )
            }
        }
    }
}

/// How a finished battle ended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleOutcome {
    Win { name: String, summary: String },
    Draw { summary: String },
}

impl BattleOutcome {
    /// Name shown on the result banner. Draws report "Stalemate".
    pub fn name(&self) -> &str {
        match self {
            BattleOutcome::Win { name, .. } => name,
            BattleOutcome::Draw { .. } => "Stalemate",
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            BattleOutcome::Win { summary, .. } => summary,
            BattleOutcome::Draw { summary } => summary,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, BattleOutcome::Win { .. })
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, BattleOutcome::Draw { .. })
    }
}

/// Ordered commentary log for one battle.
///
/// ## Usage Examples
///
/// ```rust,ignore
/// // Collect events while resolving
/// log.push(BattleEvent::CriticalHit);
///
/// // Convenient printing during development
/// log.print_debug();                               // Raw event dump
/// log.print_debug_with_message("Turn 3 events:");  // With header message
///
/// // Commentary lines for display surfaces
/// for line in log.lines() {
///     println!("{}", line);
/// }
///
/// // Display trait prints the formatted commentary
/// println!("{}", log);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BattleLog {
    events: Vec<BattleEvent>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, other: BattleLog) {
        self.events.extend(other.events);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Formatted commentary, one line per event, in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(BattleEvent::format).collect()
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events in debug format with a custom prefix message.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        self.print_debug();
    }

    /// Return true if the log contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the log.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl std::fmt::Display for BattleLog {
    /// Format the log for printing. Shows the commentary line of each event.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {}", event.format())?;
        }
        Ok(())
    }
}

/// Source of random outcomes for one battle.
///
/// Scripted sources replay a fixed sequence so tests can force dodges,
/// criticals, and damage rolls; entropy sources draw from the OS. Every
/// draw names a reason so scripted tests can follow the consumption order.
#[derive(Debug, Clone)]
pub struct BattleRng {
    source: RngSource,
}

#[derive(Debug, Clone)]
enum RngSource {
    Scripted { outcomes: Vec<f64>, index: usize },
    Entropy(StdRng),
}

impl BattleRng {
    /// Replays `outcomes` in order. Each value must lie in `[0, 1)`.
    pub fn new_for_test(outcomes: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Entropy(StdRng::from_os_rng()),
        }
    }

    /// Deterministic entropy source for reproducible simulations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: RngSource::Entropy(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws the next outcome in `[0, 1)`.
    pub fn next_outcome(&mut self, reason: &str) -> f64 {
        let outcome = match &mut self.source {
            RngSource::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    // Add the reason to the panic message for better debugging!
                    panic!(
                        "BattleRng exhausted! Tried to get a value for: '{}'. Need more scripted values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];
                *index += 1;
                outcome
            }
            RngSource::Entropy(rng) => rng.random::<f64>(),
        };

        // The magic line: Print the consumption event to the console during tests.
        #[cfg(test)]
        println!("[RNG] Consumed {:.3} for: {}", outcome, reason);

        outcome
    }
}
