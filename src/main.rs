//! Bat Hunt Session Engine
//!
//! Runs a scripted demo session, then replays it from the seed and tap log
//! and checks that the final state hashes agree.
//!
//! Usage: `bat-hunt-engine [config.json] [seed]`

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bat_hunt::{
    VERSION,
    game::{events::GameEventData, input::Tap, trajectory},
    session::{replay, NoopHooks, SessionConfig, SessionController},
};

/// Session time at which the demo stops if nobody has won or lost.
const DEMO_END_MS: u64 = 60_000;

/// Script tap cadence (ms).
const TAP_EVERY_MS: u64 = 700;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            SessionConfig::from_json(&json).with_context(|| format!("loading {path}"))?
        }
        None => SessionConfig::default(),
    };
    let seed = match args.next() {
        Some(s) => s.parse::<u64>().with_context(|| format!("invalid seed {s:?}"))?,
        None => 12345,
    };

    info!("Bat Hunt Engine v{}", VERSION);
    info!("Tick Interval: {} ms", config.tick_interval_ms);

    demo_session(config, seed)
}

/// Play a scripted session: every few hundred ms, tap the oldest bat on
/// every third beat and tap empty sky otherwise.
fn demo_session(config: SessionConfig, seed: u64) -> Result<()> {
    info!("=== Starting Demo Session ===");
    info!("Difficulty: {}", config.difficulty);
    info!("RNG Seed: {}", seed);

    let mut controller = SessionController::new(config.clone(), seed, NoopHooks)?;
    controller.start(0);

    let mut beat = 0u64;
    let mut now = 0u64;
    let mut hits = 0u32;

    while !controller.is_finished() && now < DEMO_END_MS {
        now += TAP_EVERY_MS;
        beat += 1;
        controller.advance(now);

        let target = controller
            .live_bats()
            .next()
            .map(|bat| trajectory::position(bat, bat.elapsed_ms(now)));

        let tap = match target {
            Some(position) if beat % 3 != 0 => Tap { position, timestamp_ms: now },
            _ => Tap::new(4.0, 4.0, now),
        };

        for event in controller.handle_tap(tap) {
            if let GameEventData::BatHit { bat_id, awarded, streak, .. } = event.data {
                hits += 1;
                info!("Hit bat {} for {} (streak {})", bat_id, awarded, streak);
            }
        }
    }
    controller.advance(DEMO_END_MS);

    // Print final results
    info!("=== Session Results ===");
    let snapshot = controller.snapshot(controller.now_ms());
    info!(
        "Score: {}  Kills: {}/{}  Stamina: {:.1}  Time left: {} ms",
        snapshot.score, snapshot.kill_count, snapshot.kill_target, snapshot.stamina, snapshot.time_remaining_ms
    );
    info!("Hits: {}  Taps: {}", hits, controller.tap_log().len());
    match controller.outcome() {
        Some(outcome) => info!("Outcome: {}", serde_json::to_string(outcome)?),
        None => info!("Outcome: still running at {} ms", controller.now_ms()),
    }

    let hash = controller.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replayed = replay(config, seed, controller.tap_log().taps(), DEMO_END_MS)?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        anyhow::bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}
