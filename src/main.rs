// In: src/main.rs

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pokemon_arena::{
    ArenaConfig, ArenaResult, BattleController, BattleParticipant, BattlePhase, BattleSlots,
    ConfigError, DetailCache, FetchError, FetchOptions, HttpCatalog, MemoryStorage, PokemonDetail,
    PokemonRef,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> ArenaResult<()> {
    let config = load_config()?;
    let (challenger_id, opponent_id) = parse_args();

    let api = Arc::new(HttpCatalog::new(&config.api));
    let cache = Arc::new(DetailCache::new(api));
    let slots = Arc::new(BattleSlots::load(Arc::new(MemoryStorage::new())));
    let controller = BattleController::new(slots, Arc::clone(&cache), config.pacing());

    println!("=== Pokemon Arena Battle Demo ===");
    println!();

    // Pull both records through the cache, then fill the battle positions
    let challenger = fetch_fighter(&cache, challenger_id).await?;
    let opponent = fetch_fighter(&cache, opponent_id).await?;
    let challenger_card = PokemonRef::from_detail(&challenger);
    let opponent_card = PokemonRef::from_detail(&opponent);
    controller.set_slot("challenger", &challenger_card);
    controller.set_slot("opponent", &opponent_card);

    print_fighter(
        "Challenger",
        &BattleParticipant::new(&challenger_card, &challenger),
    );
    print_fighter("Opponent", &BattleParticipant::new(&opponent_card, &opponent));
    println!();

    // Subscribe before starting so no phase transition is missed
    let mut view = controller.subscribe();
    controller.start_battle()?;

    println!("🔥 Battle begins!");

    // Follow the published view until the outcome lands
    let mut last_countdown = u32::MAX;
    loop {
        let snapshot = view.borrow_and_update().clone();
        match snapshot.phase {
            BattlePhase::Countdown => {
                if snapshot.countdown != last_countdown {
                    last_countdown = snapshot.countdown;
                    println!("  {}...", snapshot.countdown);
                }
            }
            BattlePhase::Completed => {
                println!();
                for line in snapshot.log.lines() {
                    println!("  {}", line);
                }
                println!();
                match snapshot.outcome {
                    Some(outcome) if outcome.is_draw() => {
                        println!("🤝 {}", outcome.summary());
                    }
                    Some(outcome) => {
                        println!("🏆 Winner: {}", outcome.name());
                        println!("   {}", outcome.summary());
                    }
                    None => println!("Battle ended without an outcome"),
                }
                break;
            }
            _ => {}
        }
        if view.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Reads the optional `ARENA_CONFIG` file path; defaults stand in otherwise.
fn load_config() -> Result<ArenaConfig, ConfigError> {
    match std::env::var("ARENA_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading configuration from {}", path);
            ArenaConfig::load(path)
        }
        Err(_) => Ok(ArenaConfig::default()),
    }
}

/// Two optional Pokedex numbers on the command line; Pikachu vs Charizard
/// when absent.
fn parse_args() -> (u32, u32) {
    let mut args = std::env::args().skip(1);
    let challenger = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(25);
    let opponent = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(6);
    (challenger, opponent)
}

async fn fetch_fighter(cache: &DetailCache, id: u32) -> ArenaResult<Arc<PokemonDetail>> {
    let key = id.to_string();
    match cache.fetch_detail(&key, FetchOptions::default()).await {
        Some(detail) => Ok(detail),
        None => {
            let reason = cache
                .error(&key)
                .unwrap_or_else(|| format!("Failed to load Pokemon {}.", key));
            Err(FetchError::Status(reason).into())
        }
    }
}

fn print_fighter(role: &str, fighter: &BattleParticipant) {
    println!("{}: #{:03} {}", role, fighter.id, fighter.name);
    println!(
        "  Battle Stats: HP:{} ATK:{} DEF:{} SPD:{}",
        fighter.max_hp, fighter.attack, fighter.defense, fighter.speed
    );
    println!("  Moves: {}", fighter.moves.join(", "));
}
