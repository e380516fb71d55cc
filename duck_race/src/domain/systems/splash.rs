use crate::domain::state::{Duck, Splash};
use crate::domain::tuning::race::RaceTuning;

/// Velocity kick for a duck at offset (dx, dy) from a splash centre.
///
/// Repulsive, falling off linearly to zero at `effect_radius`. Ducks sitting
/// practically on the centre get nothing since there is no direction to push.
pub fn impulse(dx: f64, dy: f64, strength: f64, effect_radius: f64) -> Option<(f64, f64)> {
    let dist = dx.hypot(dy);
    if dist <= 0.01 || dist >= effect_radius {
        return None;
    }
    let falloff = 1.0 - dist / effect_radius;
    Some((dx / dist * strength * falloff, dy / dist * strength * falloff))
}

/// Records a splash ring at (x, y) and pushes every non-stunned duck in reach.
pub fn create_splash(
    ducks: &mut [Duck],
    splashes: &mut Vec<Splash>,
    x: f64,
    y: f64,
    strength: f64,
    cfg: &RaceTuning,
) {
    splashes.push(Splash {
        x,
        y,
        radius: cfg.splash_initial_radius,
        opacity: 1.0,
    });

    for duck in ducks.iter_mut().filter(|d| !d.is_stunned()) {
        if let Some((ix, iy)) = impulse(duck.x - x, duck.y - y, strength, cfg.splash_effect_radius) {
            duck.vx += ix;
            duck.vy += iy;
        }
    }
}

/// Grows and fades splash rings using real frame time; drops the invisible ones.
pub fn tick_splashes(splashes: &mut Vec<Splash>, elapsed: f64, cfg: &RaceTuning) {
    for splash in splashes.iter_mut() {
        splash.radius += cfg.splash_radius_rate * elapsed;
        splash.opacity -= cfg.splash_opacity_rate * elapsed;
    }
    splashes.retain(|s| s.opacity > 0.0);
}
