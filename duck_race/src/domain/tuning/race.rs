/// Gameplay tuning for the race itself: ducks, splashes and the playfield.
///
/// Distances are simulation units unless a field says pixels. The canvas is the
/// logical drawing surface the renderer targets; clients scale it to their display.

#[derive(Debug, Clone, Copy)]
pub struct RaceTuning {
    /// Logical canvas size in pixels.
    pub canvas_width: f64,
    pub canvas_height: f64,

    /// Channel height in simulation units; the width follows from the canvas aspect.
    pub sim_height: f64,

    /// Duck body radius in pixels (collision radius is derived from it).
    pub duck_size: f64,

    /// Fraction of the simulation width that counts as the finish.
    pub finish_line: f64,

    /// Horizontal start position as a fraction of the width.
    pub start_x: f64,

    /// Start rows are drawn from `sim_height * (min + r * spread)`.
    pub start_y: (f64, f64),

    /// Ducks stay within these fractions of the channel height.
    pub channel: (f64, f64),

    /// Velocity factor applied on a channel wall bounce.
    pub wall_bounce: f64,

    /// Fraction of the local current added to a duck's velocity each step.
    pub fluid_force_factor: f64,

    /// Per-step velocity retention for ducks.
    pub damping: f64,

    /// Extra per-frame velocity retention while stunned.
    pub stunned_damping: f64,

    /// Seconds a duck stays stunned after a hit.
    pub stun_duration: f64,

    /// Velocity factor applied to vx when bouncing off a log.
    pub log_bounce: f64,

    /// Levels at or above this respawn ducks that touch garbage instead of eliminating them.
    pub soft_fail_level: u32,

    /// Player splash strength: default and allowed range.
    pub splash_strength: f64,
    pub splash_strength_range: (f64, f64),

    /// Reach of a splash impulse.
    pub splash_effect_radius: f64,

    /// Seconds between splashes for one duck.
    pub splash_cooldown: f64,

    /// Splash ring visuals: initial radius (px), growth (px/s), fade (opacity/s).
    pub splash_initial_radius: f64,
    pub splash_radius_rate: f64,
    pub splash_opacity_rate: f64,
}

impl Default for RaceTuning {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            canvas_height: 300.0,
            sim_height: 1.1,
            duck_size: 12.0,
            finish_line: 0.95,
            start_x: 0.1,
            start_y: (0.2, 0.6),
            channel: (0.05, 0.95),
            wall_bounce: -0.5,
            fluid_force_factor: 0.1,
            damping: 0.80,
            stunned_damping: 0.95,
            stun_duration: 1.5,
            log_bounce: -0.5,
            soft_fail_level: 2,
            splash_strength: 1.0,
            splash_strength_range: (0.2, 2.5),
            splash_effect_radius: 0.5,
            splash_cooldown: 1.0,
            splash_initial_radius: 10.0,
            splash_radius_rate: 60.0,
            splash_opacity_rate: 1.2,
        }
    }
}

impl RaceTuning {
    /// Pixels per simulation unit.
    pub fn scale(&self) -> f64 {
        self.canvas_height / self.sim_height
    }

    pub fn sim_width(&self) -> f64 {
        self.canvas_width / self.scale()
    }

    pub fn duck_radius(&self) -> f64 {
        self.duck_size / self.scale()
    }

    /// Maps a point on a displayed surface of the given size to simulation space.
    pub fn surface_to_sim(&self, x: f64, y: f64, surface_width: f64, surface_height: f64) -> (f64, f64) {
        let scale_x = self.canvas_width / surface_width;
        let scale_y = self.canvas_height / surface_height;
        (x * scale_x / self.scale(), y * scale_y / self.scale())
    }
}
