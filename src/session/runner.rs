//! Real-Time Session Driver
//!
//! Drives a `SessionController` from tokio time. The loop sleeps until the
//! controller's next deadline (tick or spawn attempt) and wakes early for
//! taps or a shutdown signal. After every handled event the latest
//! `RenderSnapshot` is published on a watch channel.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::game::input::Tap;
use crate::session::clock::{Clock, MonotonicClock};
use crate::session::config::{ConfigError, SessionConfig};
use crate::session::controller::{FeedbackHooks, SessionController};
use crate::session::snapshot::{OutcomeRecord, RenderSnapshot};

/// Capacity of the tap channel.
pub const TAP_CHANNEL_CAPACITY: usize = 64;

/// Handle to a session running on the tokio runtime.
pub struct SessionHandle {
    /// Session identifier (also on the outcome record)
    pub session_id: Uuid,
    /// Tap input
    pub taps: mpsc::Sender<Tap>,
    /// Latest render snapshot
    pub snapshots: watch::Receiver<RenderSnapshot>,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Option<OutcomeRecord>>,
}

impl SessionHandle {
    /// Ask the session to stop (user exit). Pending timers are cancelled.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for the session to finish. `None` if it was exited before a
    /// terminal phase (or the task panicked).
    pub async fn join(self) -> Option<OutcomeRecord> {
        match self.task.await {
            Ok(record) => record,
            Err(e) => {
                warn!("session task failed: {}", e);
                None
            }
        }
    }
}

/// Build a controller and run it on a new task.
pub fn spawn_session<H>(config: SessionConfig, seed: u64, hooks: H) -> Result<SessionHandle, ConfigError>
where
    H: FeedbackHooks + 'static,
{
    let controller = SessionController::new(config, seed, hooks)?;
    let session_id = Uuid::new_v4();

    let (tap_tx, tap_rx) = mpsc::channel(TAP_CHANNEL_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot(0));
    let (shutdown_tx, _) = broadcast::channel(1);
    let shutdown_rx = shutdown_tx.subscribe();

    let task = tokio::spawn(run_session(session_id, controller, tap_rx, shutdown_rx, snapshot_tx));

    Ok(SessionHandle {
        session_id,
        taps: tap_tx,
        snapshots: snapshot_rx,
        shutdown_tx,
        task,
    })
}

/// Run a session to completion or until shutdown.
///
/// Taps are stamped no later than the current session time. Returns the
/// outcome record if the session reached WON or LOST.
#[instrument(skip_all, fields(session_id = %session_id))]
pub async fn run_session<H: FeedbackHooks>(
    session_id: Uuid,
    mut controller: SessionController<H>,
    mut taps: mpsc::Receiver<Tap>,
    mut shutdown: broadcast::Receiver<()>,
    snapshots: watch::Sender<RenderSnapshot>,
) -> Option<OutcomeRecord> {
    let clock = MonotonicClock::new();
    controller.start(clock.now_ms());
    snapshots.send_replace(controller.snapshot(clock.now_ms()));

    let mut taps_open = true;

    loop {
        let Some(deadline) = controller.next_deadline() else {
            break;
        };

        tokio::select! {
            _ = shutdown.recv() => {
                info!("session exited before completion");
                controller.shutdown();
            }
            tap = taps.recv(), if taps_open => {
                match tap {
                    Some(tap) => {
                        let now = clock.now_ms();
                        controller.handle_tap(Tap {
                            timestamp_ms: tap.timestamp_ms.min(now),
                            ..tap
                        });
                    }
                    None => {
                        warn!("tap channel closed");
                        taps_open = false;
                    }
                }
            }
            _ = tokio::time::sleep_until(clock.instant_at(deadline)) => {
                controller.advance(clock.now_ms());
            }
        }

        snapshots.send_replace(controller.snapshot(clock.now_ms()));
    }

    controller.outcome().cloned().map(|outcome| OutcomeRecord::new(session_id, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::game::profile::{DifficultyKey, DifficultyProfile};
    use crate::game::state::{LossReason, SessionPhase};

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_none() {
        let handle = spawn_session(SessionConfig::default(), 1, crate::session::NoopHooks).unwrap();
        tokio::time::sleep(Duration::from_millis(1_200)).await;
        handle.shutdown();

        assert!(handle.join().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_time_expiry() {
        let gentle = DifficultyProfile::new(0.8, (2400, 3600), 4, 0.001, 1.5, 1.2, 1.0).unwrap();
        let config = SessionConfig {
            profile_override: Some(gentle),
            time_limit_ms: 5_000,
            ..Default::default()
        };
        let handle = spawn_session(config, 9, crate::session::NoopHooks).unwrap();
        let session_id = handle.session_id;
        let mut snapshots = handle.snapshots.clone();

        let record = handle.join().await.unwrap();
        assert_eq!(record.session_id, session_id);
        assert!(!record.outcome.won);
        assert_eq!(record.outcome.loss_reason, Some(LossReason::TimeExpired));
        assert_eq!(record.outcome.difficulty, DifficultyKey::Medium);

        let last = snapshots.borrow_and_update().clone();
        assert_eq!(last.phase, SessionPhase::Lost);
        assert_eq!(last.time_remaining_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_reaches_controller() {
        let handle = spawn_session(SessionConfig::default(), 3, crate::session::NoopHooks).unwrap();
        let mut snapshots = handle.snapshots.clone();

        // First burst bat appears at start
        snapshots.changed().await.unwrap();
        let first = snapshots.borrow_and_update().clone();
        assert_eq!(first.entities.len(), 1);

        // Tap well away from any bat
        handle.taps.send(Tap::new(5.0, 5.0, 0)).await.unwrap();
        snapshots.changed().await.unwrap();
        let after = snapshots.borrow_and_update().clone();
        assert_eq!(after.stamina, 88.0);
        assert_eq!(after.combo_count, 0);

        handle.shutdown();
        assert!(handle.join().await.is_none());
    }
}
