use super::progression;
use super::render::{self, DisplayList};
use super::types::{FrameUpdate, PointerAction, RaceEvent, RaceOutcome, RaceState};
use crate::domain::systems::{bot, collisions, duck_movement, obstacles, splash};
use crate::domain::tuning::bot::BotTuning;
use crate::domain::tuning::fluid::FluidTuning;
use crate::domain::tuning::obstacle::ObstacleTuning;
use crate::domain::tuning::race::RaceTuning;
use crate::domain::{
    Duck, FluidSimulator, Obstacle, ObstacleKind, PlayerKind, Rgba, SlotPool, Splash, StepParams,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

pub const GARBAGE_LOSS: &str = "You hit the garbage!";

const ROSTER: [(&str, PlayerKind, Rgba); 3] = [
    ("You", PlayerKind::Human, Rgba::rgb(255, 215, 0)),
    ("Bot Alice", PlayerKind::Bot, Rgba::rgb(255, 105, 180)),
    ("Bot Bob", PlayerKind::Bot, Rgba::rgb(0, 191, 255)),
];

/// Parameters that pick one concrete race.
#[derive(Debug, Clone, Copy)]
pub struct RaceSetup {
    /// Difficulty level, 1-based.
    pub level: u32,
    /// Seed for spawning, bot decisions and starting rows.
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tunings {
    pub race: RaceTuning,
    pub fluid: FluidTuning,
    pub obstacle: ObstacleTuning,
    pub bot: BotTuning,
}

/// One race from the starting line to a result.
///
/// Owns the river, the ducks, the obstacles and the splash rings. `step`
/// advances everything by one frame and reports the outcome exactly once.
pub struct RaceController {
    level: u32,
    tuning: Tunings,
    fluid: FluidSimulator,
    ducks: Vec<Duck>,
    obstacles: SlotPool<Obstacle>,
    splashes: Vec<Splash>,
    rng: StdRng,

    splash_strength: f64,
    simulated_time: f64,
    spawn_clock: f64,
    next_obstacle_id: u64,
    outcome: Option<RaceOutcome>,
}

impl RaceController {
    pub fn new(setup: RaceSetup) -> Self {
        Self::with_tuning(setup, Tunings::default())
    }

    pub fn with_tuning(setup: RaceSetup, tuning: Tunings) -> Self {
        let mut rng = StdRng::seed_from_u64(setup.seed);
        let ducks = starting_roster(&tuning.race, &mut rng);
        Self::build(setup.level, tuning, ducks, rng)
    }

    /// Starts a race with a caller-chosen field instead of the default roster.
    pub fn with_ducks(setup: RaceSetup, tuning: Tunings, ducks: Vec<Duck>) -> Self {
        Self::build(setup.level, tuning, ducks, StdRng::seed_from_u64(setup.seed))
    }

    fn build(level: u32, tuning: Tunings, ducks: Vec<Duck>, rng: StdRng) -> Self {
        let h = tuning.race.sim_height / tuning.fluid.resolution as f64;
        let num_x = (tuning.race.sim_width() / h).floor() as usize;
        let fluid = FluidSimulator::new(tuning.fluid.density, num_x, tuning.fluid.resolution, h);

        debug!(level, ducks = ducks.len(), num_x, "race built");

        Self {
            level,
            tuning,
            fluid,
            ducks,
            obstacles: SlotPool::with_capacity(tuning.obstacle.max_obstacles),
            splashes: Vec::new(),
            rng,
            splash_strength: tuning.race.splash_strength,
            simulated_time: 0.0,
            spawn_clock: 0.0,
            next_obstacle_id: 1,
            outcome: None,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn tuning(&self) -> &Tunings {
        &self.tuning
    }

    pub fn fluid(&self) -> &FluidSimulator {
        &self.fluid
    }

    pub fn ducks(&self) -> &[Duck] {
        &self.ducks
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().map(|(_, o)| o)
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    pub fn splashes(&self) -> &[Splash] {
        &self.splashes
    }

    pub fn splash_strength(&self) -> f64 {
        self.splash_strength
    }

    pub fn outcome(&self) -> Option<&RaceOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Drops an obstacle into the water at (x, y) and returns its id.
    pub fn insert_obstacle(&mut self, kind: ObstacleKind, x: f64, y: f64, width: f64, height: f64) -> u64 {
        let id = self.take_obstacle_id();
        self.obstacles.insert(Obstacle::new(id, kind, x, y, width, height));
        id
    }

    fn take_obstacle_id(&mut self) -> u64 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        id
    }

    /// Clamped into the slider range; non-finite values are ignored.
    pub fn set_splash_strength(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        let (lo, hi) = self.tuning.race.splash_strength_range;
        self.splash_strength = value.clamp(lo, hi);
    }

    /// Player tap in simulation space: clears a tapped obstacle, otherwise splashes.
    pub fn pointer(&mut self, x: f64, y: f64) -> PointerAction {
        if self.is_over() {
            return PointerAction::Ignored;
        }

        if let Some(slot) = obstacles::obstacle_at(&self.obstacles, x, y) {
            self.obstacles.remove(slot);
            return PointerAction::RemovedObstacle;
        }

        let race = self.tuning.race;
        let Some(human) = self.ducks.iter_mut().find(|d| d.kind == PlayerKind::Human) else {
            return PointerAction::Ignored;
        };
        if human.is_stunned() || human.splash_cooldown > 0.0 {
            return PointerAction::Ignored;
        }
        human.splash_cooldown = race.splash_cooldown;

        splash::create_splash(&mut self.ducks, &mut self.splashes, x, y, self.splash_strength, &race);
        PointerAction::Splashed
    }

    /// Applies one host input. Returns false for `Stop`.
    pub fn handle_event(&mut self, event: RaceEvent) -> bool {
        match event {
            RaceEvent::Pointer { x, y } => {
                let action = self.pointer(x, y);
                debug!(x, y, ?action, "pointer");
                true
            }
            RaceEvent::SplashStrength { value } => {
                self.set_splash_strength(value);
                true
            }
            RaceEvent::Stop => false,
        }
    }

    /// Advances the race by one frame.
    ///
    /// `elapsed` is the real time since the previous frame and only drives
    /// cosmetic and countdown timers; physics always moves by the fixed step.
    /// Returns the outcome on the frame the race ends and `None` otherwise.
    pub fn step(&mut self, elapsed: f64) -> Option<RaceOutcome> {
        if self.is_over() {
            return None;
        }

        let Tunings {
            race,
            fluid: fluid_cfg,
            obstacle: obstacle_cfg,
            bot: bot_cfg,
        } = self.tuning;
        let dt = fluid_cfg.dt;
        let sim_width = race.sim_width();

        splash::tick_splashes(&mut self.splashes, elapsed, &race);

        self.simulated_time += elapsed;
        self.fluid.simulate(&StepParams {
            dt,
            gravity: fluid_cfg.gravity,
            num_iters: fluid_cfg.num_iters,
            over_relaxation: fluid_cfg.over_relaxation,
            flow_velocity: fluid_cfg.flow_velocity,
            simulated_time: self.simulated_time,
        });

        self.spawn_clock += elapsed;
        if self.spawn_clock > obstacle_cfg.spawn_interval && self.obstacles.len() < obstacle_cfg.max_obstacles {
            self.spawn_clock = 0.0;
            let id = self.take_obstacle_id();
            let spawned =
                obstacles::spawn_obstacle(id, self.level, sim_width, race.sim_height, &mut self.rng, &obstacle_cfg);
            debug!(obstacle_id = id, kind = ?spawned.kind, y = spawned.y, "obstacle spawned");
            self.obstacles.insert(spawned);
        }

        for index in 0..self.ducks.len() {
            let duck = &self.ducks[index];
            if duck.is_stunned() {
                duck_movement::recover(&mut self.ducks[index], elapsed, &race);
            } else if duck.kind == PlayerKind::Bot && duck.splash_cooldown <= 0.0 {
                let order = bot::decide(
                    index,
                    &self.ducks,
                    &self.obstacles,
                    sim_width,
                    race.sim_height,
                    race.splash_cooldown,
                    &mut self.rng,
                    &bot_cfg,
                );
                if let Some(order) = order {
                    self.ducks[index].splash_cooldown = order.cooldown;
                    splash::create_splash(&mut self.ducks, &mut self.splashes, order.x, order.y, order.strength, &race);
                }
            }
            duck_movement::tick_duck(&mut self.ducks[index], &self.fluid, elapsed, dt, &race);
        }

        obstacles::tick_obstacles(&mut self.obstacles, &self.fluid, sim_width, dt, &obstacle_cfg);

        // A finish crossing beats any contact on the same frame.
        if let Some(winner) = self.ducks.iter().find(|d| d.x / sim_width >= race.finish_line) {
            let outcome = RaceOutcome::Won {
                name: winner.name.clone(),
                kind: winner.kind,
            };
            return self.finish(outcome);
        }

        let report = collisions::tick_collisions(&mut self.ducks, &mut self.obstacles, self.level, &race);
        for duck_id in &report.eliminated {
            info!(duck_id, "duck eliminated");
        }
        if report.human_lost {
            return self.finish(RaceOutcome::HumanLost {
                reason: GARBAGE_LOSS.to_string(),
            });
        }

        None
    }

    fn finish(&mut self, outcome: RaceOutcome) -> Option<RaceOutcome> {
        info!(level = self.level, winner = outcome.winner_name(), "race finished");
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }
}

/// Default field on distinct tenth-unit rows so no two ducks start stacked.
fn starting_roster(cfg: &RaceTuning, rng: &mut impl Rng) -> Vec<Duck> {
    let start_x = cfg.start_x * cfg.sim_width();
    let mut taken_rows: Vec<i64> = Vec::with_capacity(ROSTER.len());
    let mut ducks = Vec::with_capacity(ROSTER.len());

    for (id, &(name, kind, color)) in ROSTER.iter().enumerate() {
        // The start band spans several rows, so a free one always turns up.
        let y = loop {
            let y = cfg.sim_height * (cfg.start_y.0 + rng.gen_range(0.0..cfg.start_y.1));
            let row = (y * 10.0).floor() as i64;
            if !taken_rows.contains(&row) {
                taken_rows.push(row);
                break y;
            }
        };
        ducks.push(Duck::new(id as u64 + 1, name, kind, color, start_x, y));
    }

    ducks
}

pub async fn race_task(
    mut controller: RaceController,
    mut input_rx: mpsc::Receiver<RaceEvent>,
    frame_tx: broadcast::Sender<FrameUpdate>,
    race_state_tx: watch::Sender<RaceState>,
    tick_interval: Duration,
    start: Arc<Notify>,
    shutdown: Arc<Notify>,
) {
    // The race clock stays parked until a viewer attaches.
    loop {
        tokio::select! {
            _ = start.notified() => break,
            _ = shutdown.notified() => {
                info!(level = controller.level(), "race shut down before start");
                let _ = race_state_tx.send(RaceState::Stopped);
                return;
            }
            event = input_rx.recv() => {
                let keep_waiting = match event {
                    Some(ev) => controller.handle_event(ev),
                    None => false,
                };
                if !keep_waiting {
                    info!(level = controller.level(), "race stopped before start");
                    let _ = race_state_tx.send(RaceState::Stopped);
                    return;
                }
            }
        }
    }

    let mut tick: u64 = 0;
    let _ = race_state_tx.send(RaceState::Running);
    debug!(level = controller.level(), "race started");

    // Frames are requested at the configured rate; the measured gap feeds the timers.
    let mut interval = tokio::time::interval(tick_interval);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!(level = controller.level(), "race shut down");
                let _ = race_state_tx.send(RaceState::Stopped);
                break;
            }
            _ = interval.tick() => {}
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;

        let mut stopped = false;
        while let Ok(ev) = input_rx.try_recv() {
            if !controller.handle_event(ev) {
                stopped = true;
            }
        }
        if stopped {
            info!(level = controller.level(), tick, "race stopped by host");
            let _ = race_state_tx.send(RaceState::Stopped);
            break;
        }

        let outcome = controller.step(elapsed);

        tick += 1;
        let mut frame = DisplayList::default();
        render::render(&controller, Some(&mut frame));
        let _ = frame_tx.send(FrameUpdate {
            tick,
            commands: frame.into_commands(),
        });

        if let Some(outcome) = outcome {
            let progress = progression::progress(controller.level(), &outcome);
            let _ = race_state_tx.send(RaceState::Finished {
                winner: outcome.winner_name().to_string(),
                progress,
            });
            break;
        }
    }
}
