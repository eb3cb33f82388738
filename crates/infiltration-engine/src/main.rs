//! Demo host for Infiltration.
//!
//! Plays one complete session with scripted bots so the whole engine can be
//! watched end to end from the logs. It loads configuration, seats the bots,
//! runs the session clock on a background task, and drives bot turns until
//! the session reaches `Complete`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `infiltration-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the session manager and a session
//! 4. Seat and ready the bots, then start the session
//! 5. Spawn the session clock
//! 6. Drive bot turns until the session completes
//! 7. Log the result

mod bots;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use infiltration_core::config::LoggingConfig;
use infiltration_core::{ClockControl, GameConfig, SessionManager, spawn_session_clock};
use infiltration_types::{AbortReason, Phase, PlayerId, SessionId};

use crate::bots::{BotDriver, DemoConfig};
use crate::error::EngineError;

const CONFIG_PATH: &str = "infiltration-config.yaml";

/// Application entry point for the demo host.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the session
/// rejects one of the setup steps.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so the fallback to
    //    defaults is reported after step 2.
    let (config, from_file) = load_config()?;
    let demo = load_demo_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("infiltration-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = config.seed,
        tasks_to_win = config.tasks.tasks_to_win,
        tie_policy = ?config.voting.tie_policy,
        players = demo.players,
        "Configuration loaded"
    );

    // 3. Create the session.
    let manager = Arc::new(SessionManager::new());
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, |seed| StdRng::seed_from_u64(seed.wrapping_add(1)));
    let bots = bots::spawn_bots(demo.players, &mut rng);
    let Some(host) = bots.first().map(|b| b.id) else {
        return Err(EngineError::Demo {
            message: String::from("demo.players must be at least 1"),
        });
    };
    let control = Arc::new(ClockControl::from_timing(&config.timing));
    let session = manager.create_session(host, config).await?;
    info!(%session, %host, "Session created");

    // 4. Seat the bots and start.
    for bot in &bots {
        manager.join_session(session, bot.id, &bot.alias).await?;
        manager.set_ready(session, bot.id, true).await?;
    }
    manager.start_session(session).await?;
    manager.begin_tasks(session).await?;
    info!(bots = bots.len(), "Bots seated, task phase open");

    // 5. Spawn the session clock.
    let clock = spawn_session_clock(Arc::clone(&manager), session, Arc::clone(&control));
    info!(tick_interval_ms = control.tick_interval_ms(), "Session clock started");

    // 6. Drive bot turns.
    let mut driver = BotDriver::new(bots, rng, demo.clone());
    let turn = Duration::from_millis(demo.turn_interval_ms);
    run_bots(&manager, session, host, &mut driver, turn, demo.max_clock_secs).await?;

    control.request_stop();
    let exit = clock.await.map_err(|e| EngineError::ClockTask {
        message: e.to_string(),
    })??;
    info!(?exit, "Session clock finished");

    // 7. Log the result.
    log_result(&manager, session).await?;
    Ok(())
}

/// Play bot turns until the session completes, aborting it once the
/// session clock passes `max_clock_secs`.
async fn run_bots<R: rand::Rng>(
    manager: &SessionManager,
    session: SessionId,
    observer: PlayerId,
    driver: &mut BotDriver<R>,
    turn: Duration,
    max_clock_secs: u64,
) -> Result<(), EngineError> {
    let mut last_phase = Phase::Tasks;
    loop {
        tokio::time::sleep(turn).await;
        driver.play_turn(manager, session).await?;

        let view = manager.get_snapshot(session, observer).await?;
        if view.phase != last_phase {
            info!(
                from = ?last_phase,
                to = ?view.phase,
                clock_secs = view.clock_secs,
                progress = view.progress.completed,
                "Phase changed"
            );
            if let Some(reveal) = view.last_reveal.as_ref().filter(|_| view.phase == Phase::Reveal) {
                info!(
                    round = %reveal.round,
                    eliminated = ?reveal.eliminated_alias,
                    role = ?reveal.role,
                    "Round revealed"
                );
            }
            last_phase = view.phase;
        }
        if view.phase == Phase::Complete {
            return Ok(());
        }
        if view.clock_secs > max_clock_secs {
            warn!(clock_secs = view.clock_secs, max_clock_secs, "Demo ran too long, aborting");
            manager
                .abort_session(
                    session,
                    AbortReason::Requested {
                        message: String::from("demo clock limit reached"),
                    },
                )
                .await?;
            return Ok(());
        }
    }
}

async fn log_result(manager: &SessionManager, session: SessionId) -> Result<(), EngineError> {
    let Some(result) = manager.result(session).await? else {
        warn!(%session, "Session ended without a result");
        return Ok(());
    };

    info!(
        outcome = ?result.outcome,
        rounds = result.rounds.len(),
        tasks_completed = result.tasks.completed,
        tasks_total = result.tasks.total,
        sabotages = result.sabotages,
        duration_secs = result.duration_secs,
        "Session complete"
    );
    for player in &result.players {
        info!(
            alias = player.alias,
            role = ?player.role,
            alive = player.alive,
            won = player.won,
            xp = player.xp_gained,
            reputation = player.reputation_gained,
            "Player result"
        );
    }
    match serde_json::to_string(&result) {
        Ok(json) => info!(summary = %json, "Result summary"),
        Err(e) => warn!(error = %e, "Could not serialize result summary"),
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the session configuration, falling back to defaults when the file
/// is absent. The flag reports whether the file was read.
fn load_config() -> Result<(GameConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = GameConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = GameConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Load the `demo` section from `infiltration-config.yaml`.
///
/// A missing file or a missing `demo` key yields the defaults.
fn load_demo_config() -> Result<DemoConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Demo {
        message: format!("failed to read config file: {e}"),
    })?;

    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Demo {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    raw.get("demo").map_or_else(
        || Ok(DemoConfig::default()),
        |value| {
            serde_yml::from_value(value.clone()).map_err(|e| EngineError::Demo {
                message: format!("failed to parse demo config: {e}"),
            })
        },
    )
}
