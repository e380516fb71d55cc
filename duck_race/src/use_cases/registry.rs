// Race orchestration for spawning and managing running races.

use crate::domain::tuning::race::RaceTuning;
use crate::use_cases::race::{RaceController, RaceSetup, race_task};
use crate::use_cases::{FrameUpdate, RaceEvent, RaceState};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::{info, warn};

/// Shared configuration for spawning races.
#[derive(Debug, Clone)]
pub struct RaceSettings {
    /// Capacity for inbound player input events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast frames.
    pub frame_broadcast_capacity: usize,
    /// Interval at which the race loop requests frames.
    pub tick_interval: Duration,
    /// How long a finished race stays joinable before it is dropped.
    pub finished_linger: Duration,
}

/// Errors returned by race registry operations.
#[derive(Debug)]
pub enum RaceError {
    /// Race already exists and cannot be re-created.
    AlreadyExists,
    /// Levels start at 1.
    InvalidLevel,
}

/// Per-race channels.
#[derive(Debug, Clone)]
pub struct RaceHandle {
    /// Identifier clients use to target this race.
    pub race_id: Arc<str>,
    pub level: u32,
    /// Layout used to map player taps into simulation space.
    pub tuning: RaceTuning,
    /// Sender for player input into the race task.
    pub input_tx: mpsc::Sender<RaceEvent>,
    /// Broadcast sender for rendered frames.
    pub frame_tx: broadcast::Sender<FrameUpdate>,
    /// Broadcast sender for serialized frames.
    pub frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized frame.
    pub frame_latest_tx: watch::Sender<Utf8Bytes>,
    /// Watch sender for race lifecycle changes.
    pub race_state_tx: watch::Sender<RaceState>,
    /// Releases the race clock once a viewer attaches.
    pub start: Arc<Notify>,
    /// Stops the race task when the race is removed.
    pub shutdown: Arc<Notify>,
}

/// Thread-safe registry for active races.
#[derive(Debug)]
pub struct RaceRegistry {
    /// Global settings applied to newly created races.
    settings: RaceSettings,
    /// Map of race id to active handle.
    races: RwLock<HashMap<String, RaceHandle>>,
}

impl RaceRegistry {
    pub fn new(settings: RaceSettings) -> Self {
        Self {
            settings,
            races: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &RaceSettings {
        &self.settings
    }

    /// Creates a new race and spawns its task.
    pub async fn create_race(&self, race_id: String, setup: RaceSetup) -> Result<RaceHandle, RaceError> {
        if setup.level == 0 {
            return Err(RaceError::InvalidLevel);
        }

        let mut races = self.races.write().await;
        if races.contains_key(&race_id) {
            return Err(RaceError::AlreadyExists);
        }

        // Channel wiring for the race loop.
        let (input_tx, input_rx) = mpsc::channel::<RaceEvent>(self.settings.input_channel_capacity);
        let (frame_tx, _frame_rx) = broadcast::channel::<FrameUpdate>(self.settings.frame_broadcast_capacity);
        let (frame_bytes_tx, _frame_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.frame_broadcast_capacity);
        let (frame_latest_tx, _frame_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (race_state_tx, _race_state_rx) = watch::channel::<RaceState>(RaceState::Waiting);
        let start = Arc::new(Notify::new());
        let shutdown = Arc::new(Notify::new());

        let controller = RaceController::new(setup);
        let tuning = controller.tuning().race;

        tokio::spawn(race_task(
            controller,
            input_rx,
            frame_tx.clone(),
            race_state_tx.clone(),
            self.settings.tick_interval,
            start.clone(),
            shutdown.clone(),
        ));

        let race = RaceHandle {
            race_id: Arc::from(race_id.clone()),
            level: setup.level,
            tuning,
            input_tx,
            frame_tx,
            frame_bytes_tx,
            frame_latest_tx,
            race_state_tx,
            start,
            shutdown,
        };

        races.insert(race_id, race.clone());
        Ok(race)
    }

    /// Returns a race handle for the provided id, if it exists.
    pub async fn get_race(&self, race_id: &str) -> Option<RaceHandle> {
        let races = self.races.read().await;
        races.get(race_id).cloned()
    }

    /// Removes a race and signals its task to stop.
    pub async fn remove_race(&self, race_id: &str) -> bool {
        let removed = self.races.write().await.remove(race_id);
        match removed {
            Some(race) => {
                race.shutdown.notify_one();
                info!(race_id, "race removed");
                true
            }
            None => false,
        }
    }

    pub async fn race_count(&self) -> usize {
        self.races.read().await.len()
    }

    /// Drops the race from the registry once it has finished or its task has exited.
    pub fn spawn_race_end_watcher(self: &Arc<Self>, race_id: Arc<str>, mut race_state_rx: watch::Receiver<RaceState>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if race_state_rx.changed().await.is_err() {
                    warn!(race_id = %race_id, "race task exited without a result");
                    break;
                }
                let state = race_state_rx.borrow_and_update().clone();
                match state {
                    RaceState::Finished { winner, .. } => {
                        info!(race_id = %race_id, winner = %winner, "race ended");
                        tokio::time::sleep(registry.settings.finished_linger).await;
                        break;
                    }
                    RaceState::Stopped => break,
                    RaceState::Waiting | RaceState::Running => {}
                }
            }
            registry.remove_race(&race_id).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<RaceRegistry> {
        Arc::new(RaceRegistry::new(RaceSettings {
            input_channel_capacity: 16,
            frame_broadcast_capacity: 4,
            tick_interval: Duration::from_millis(16),
            finished_linger: Duration::from_millis(10),
        }))
    }

    #[tokio::test]
    async fn duplicate_and_invalid_races_are_rejected() {
        let registry = registry();
        let setup = RaceSetup { level: 1, seed: 1 };

        registry.create_race("a".into(), setup).await.expect("create");
        assert!(matches!(
            registry.create_race("a".into(), setup).await,
            Err(RaceError::AlreadyExists)
        ));
        assert!(matches!(
            registry.create_race("b".into(), RaceSetup { level: 0, seed: 1 }).await,
            Err(RaceError::InvalidLevel)
        ));
        assert_eq!(registry.race_count().await, 1);
    }

    #[tokio::test]
    async fn race_waits_for_a_viewer_before_stepping() {
        let registry = registry();
        let race = registry
            .create_race("idle".into(), RaceSetup { level: 1, seed: 1 })
            .await
            .expect("create");
        let mut frame_rx = race.frame_tx.subscribe();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(
            frame_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert!(matches!(*race.race_state_tx.borrow(), RaceState::Waiting));

        race.start.notify_one();
        let first = tokio::time::timeout(Duration::from_secs(1), frame_rx.recv())
            .await
            .expect("frame after start")
            .expect("frame channel open");
        assert_eq!(first.tick, 1);
        assert!(matches!(*race.race_state_tx.borrow(), RaceState::Running));
    }

    #[tokio::test]
    async fn stopped_race_is_dropped_by_the_watcher() {
        let registry = registry();
        let race = registry
            .create_race("stop-me".into(), RaceSetup { level: 1, seed: 1 })
            .await
            .expect("create");
        registry.spawn_race_end_watcher(race.race_id.clone(), race.race_state_tx.subscribe());
        let input_tx = race.input_tx.clone();
        drop(race);

        input_tx.send(RaceEvent::Stop).await.expect("send stop");
        for _ in 0..100 {
            if registry.get_race("stop-me").await.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("race was not removed");
    }
}
