/// Gameplay tuning for drifting obstacles.

#[derive(Debug, Clone, Copy)]
pub struct ObstacleTuning {
    /// Seconds between spawn attempts.
    pub spawn_interval: f64,

    /// Live obstacle cap; spawning pauses while it is reached.
    pub max_obstacles: usize,

    /// Width range in simulation units (min, spread).
    pub width: (f64, f64),

    /// Height range in simulation units (min, spread).
    pub height: (f64, f64),

    /// Spawn lane as fractions of the channel height (min, spread).
    pub lane: (f64, f64),

    /// Spawn x as a fraction of the channel width; negative is off-screen.
    pub entry_x: f64,

    /// How strongly the current pushes an obstacle (per step).
    pub fluid_force_factor: f64,

    /// Per-step velocity retention.
    pub damping: f64,

    /// Obstacles past `sim_width * despawn_margin` are culled.
    pub despawn_margin: f64,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            spawn_interval: 0.5,
            max_obstacles: 20,
            width: (0.08, 0.07),
            height: (0.03, 0.02),
            lane: (0.1, 0.8),
            entry_x: -0.1,
            fluid_force_factor: 1.0 / 60.0,
            damping: 0.99,
            despawn_margin: 1.1,
        }
    }
}
