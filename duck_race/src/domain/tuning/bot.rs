/// Steering tuning for bot ducks.
///
/// None of these are load-bearing for correctness; they shape how lively the bots feel.

#[derive(Debug, Clone, Copy)]
pub struct BotTuning {
    /// Look-ahead distance for obstacles worth splashing away.
    pub avoid_distance: f64,

    /// Base impulse of a bot splash.
    pub splash_strength: f64,

    /// Multiplier applied to the base impulse when avoiding an obstacle.
    pub avoid_boost: f64,

    /// Bots trailing the leader by more than this fraction of the width splash to catch up.
    pub trail_margin: f64,

    /// Distance behind the duck for a propel splash (min, spread).
    pub propel_offset: (f64, f64),

    /// Vertical offset used to steer toward the channel centre (min, spread).
    pub steer_offset: (f64, f64),

    /// Cooldown after a bot splash is `base * (min + r * spread)`.
    pub cooldown_scale: (f64, f64),
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            avoid_distance: 0.25,
            splash_strength: 1.0,
            avoid_boost: 1.2,
            trail_margin: 0.02,
            propel_offset: (0.1, 0.05),
            steer_offset: (0.05, 0.1),
            cooldown_scale: (1.2, 1.0),
        }
    }
}
