//! Orchestrates the battle presentation timeline around the resolver.
//!
//! The controller walks one battle through idle, countdown, engaged, and
//! completed phases on timers, then merges the resolver's commentary and
//! ruling into the shared view. Starting over or resetting cancels the
//! running timeline; a cancelled timeline never touches the view again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::battle::participant::BattleParticipant;
use crate::battle::resolver::resolve_battle;
use crate::battle::state::{BattleEvent, BattleLog, BattleOutcome, BattlePhase, BattleRng};
use crate::detail::{DetailCache, FetchStatus, PokemonRef};
use crate::errors::BattleStartError;
use crate::slots::BattleSlots;

/// Timings that drive the battle presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct BattlePacing {
    /// Starting value of the pre-battle countdown
    pub countdown_start: u32,
    /// Interval between countdown ticks
    pub tick: Duration,
    /// Pause between the battle bell and the revealed result
    pub engage_delay: Duration,
}

impl Default for BattlePacing {
    fn default() -> Self {
        BattlePacing {
            countdown_start: 3,
            tick: Duration::from_millis(1000),
            engage_delay: Duration::from_millis(1700),
        }
    }
}

/// Read-only projection of the battle presentation observed by the UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleView {
    pub phase: BattlePhase,
    pub countdown: u32,
    pub log: BattleLog,
    pub outcome: Option<BattleOutcome>,
    pub error: Option<String>,
}

struct TimerState {
    handle: Option<JoinHandle<()>>,
    /// Bumped on every start/reset; a timeline only mutates the view while
    /// its captured epoch is still current.
    epoch: u64,
}

/// Sequences battles over the slots and the detail cache.
pub struct BattleController {
    slots: Arc<BattleSlots>,
    cache: Arc<DetailCache>,
    pacing: BattlePacing,
    view: Arc<watch::Sender<BattleView>>,
    timer: Arc<Mutex<TimerState>>,
}

impl BattleController {
    pub fn new(slots: Arc<BattleSlots>, cache: Arc<DetailCache>, pacing: BattlePacing) -> Self {
        let initial = BattleView {
            countdown: pacing.countdown_start,
            ..BattleView::default()
        };
        BattleController {
            slots,
            cache,
            pacing,
            view: Arc::new(watch::channel(initial).0),
            timer: Arc::new(Mutex::new(TimerState {
                handle: None,
                epoch: 0,
            })),
        }
    }

    /// Validates both slots and launches the countdown timeline.
    ///
    /// Requires both slots occupied, neither detail fetch still loading, and
    /// both detail records present. A violation records its message in the
    /// view's error without any phase transition. Starting while a countdown
    /// or an engaged clash is running is rejected the same way; starting
    /// from a completed battle begins a fresh one.
    ///
    /// Must be called from within a tokio runtime; the timeline runs as a
    /// spawned task.
    pub fn start_battle(&self) -> Result<(), BattleStartError> {
        let snapshot = self.slots.snapshot();
        let (challenger_ref, opponent_ref) = match (snapshot.challenger, snapshot.opponent) {
            (Some(challenger), Some(opponent)) => (challenger, opponent),
            _ => return self.fail(BattleStartError::MissingSlot),
        };

        let challenger_key = challenger_ref.id.to_string();
        let opponent_key = opponent_ref.id.to_string();
        if self.cache.status(&challenger_key) == FetchStatus::Loading
            || self.cache.status(&opponent_key) == FetchStatus::Loading
        {
            return self.fail(BattleStartError::DetailsLoading);
        }

        let details = (self.cache.get(&challenger_key), self.cache.get(&opponent_key));
        let (challenger_detail, opponent_detail) = match details {
            (Some(challenger), Some(opponent)) => (challenger, opponent),
            _ => return self.fail(BattleStartError::DetailsUnavailable),
        };

        let phase = self.view.borrow().phase;
        if phase == BattlePhase::Countdown || phase == BattlePhase::Engaged {
            return self.fail(BattleStartError::InProgress);
        }

        let challenger = BattleParticipant::new(&challenger_ref, &challenger_detail);
        let opponent = BattleParticipant::new(&opponent_ref, &opponent_detail);
        tracing::info!(
            "Starting battle: {} vs {}",
            challenger.name,
            opponent.name
        );

        let mut timer = self.timer.lock().unwrap();
        timer.epoch += 1;
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        let epoch = timer.epoch;

        self.view.send_modify(|view| {
            view.phase = BattlePhase::Countdown;
            view.countdown = self.pacing.countdown_start;
            view.log.clear();
            view.log.push(BattleEvent::PreparationsComplete);
            view.outcome = None;
            view.error = None;
        });

        timer.handle = Some(tokio::spawn(run_timeline(
            Arc::clone(&self.view),
            Arc::clone(&self.timer),
            self.pacing.clone(),
            epoch,
            challenger,
            opponent,
        )));
        Ok(())
    }

    /// Cancels any running timeline and returns the view to idle.
    ///
    /// No countdown tick or resolution scheduled before the reset lands
    /// afterwards.
    pub fn reset_battle(&self) {
        let mut timer = self.timer.lock().unwrap();
        timer.epoch += 1;
        if let Some(handle) = timer.handle.take() {
            handle.abort();
        }
        self.view.send_modify(|view| {
            view.phase = BattlePhase::Idle;
            view.countdown = self.pacing.countdown_start;
            view.log.clear();
            view.outcome = None;
            view.error = None;
        });
    }

    // --- Slot Facade ---
    //
    // Slot changes route through the controller so a battle can never
    // reference fighters that are no longer slotted.

    pub fn set_slot(&self, slot: &str, pokemon: &PokemonRef) {
        self.slots.set_slot(slot, pokemon);
    }

    /// Clears one slot. Emptying the last occupied slot force-resets the
    /// battle.
    pub fn clear_slot(&self, slot: &str) {
        self.slots.clear_slot(slot);
        if self.slots.snapshot().is_empty() {
            self.reset_battle();
        }
    }

    pub fn swap_slots(&self) {
        self.slots.swap_slots();
    }

    /// Empties both slots and force-resets the battle.
    pub fn reset_slots(&self) {
        self.slots.reset_slots();
        self.reset_battle();
    }

    // --- Read-Only Projections ---

    pub fn snapshot(&self) -> BattleView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BattleView> {
        self.view.subscribe()
    }

    pub fn phase(&self) -> BattlePhase {
        self.view.borrow().phase
    }

    pub fn countdown(&self) -> u32 {
        self.view.borrow().countdown
    }

    /// Formatted commentary lines in arrival order.
    pub fn log_lines(&self) -> Vec<String> {
        self.view.borrow().log.lines()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.view.borrow().outcome.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    fn fail(&self, err: BattleStartError) -> Result<(), BattleStartError> {
        tracing::warn!("Battle not started: {}", err);
        self.view
            .send_modify(|view| view.error = Some(err.to_string()));
        Err(err)
    }
}

/// Ticks the countdown, rings the bell, and resolves the clash.
async fn run_timeline(
    view: Arc<watch::Sender<BattleView>>,
    timer: Arc<Mutex<TimerState>>,
    pacing: BattlePacing,
    epoch: u64,
    challenger: BattleParticipant,
    opponent: BattleParticipant,
) {
    loop {
        tokio::time::sleep(pacing.tick).await;
        let mut engaged = false;
        let alive = guarded(&timer, epoch, || {
            view.send_modify(|view| {
                if view.countdown > 1 {
                    view.countdown -= 1;
                } else {
                    view.countdown = 0;
                    view.phase = BattlePhase::Engaged;
                    view.log.push(BattleEvent::BellRings);
                    engaged = true;
                }
            });
        });
        if !alive {
            return;
        }
        if engaged {
            break;
        }
    }

    tokio::time::sleep(pacing.engage_delay).await;

    let mut rng = BattleRng::new_random();
    let report = resolve_battle(&challenger, &opponent, &mut rng);
    guarded(&timer, epoch, || {
        view.send_modify(|view| {
            view.log.extend(report.log);
            view.outcome = Some(report.outcome);
            view.phase = BattlePhase::Completed;
        });
    });
}

/// Runs `apply` only while `epoch` is still the live timeline, holding the
/// timer lock so a concurrent reset cannot interleave.
fn guarded(timer: &Mutex<TimerState>, epoch: u64, apply: impl FnOnce()) -> bool {
    let state = timer.lock().unwrap();
    if state.epoch != epoch {
        return false;
    }
    apply();
    true
}
