use crate::domain::fluid::FluidSimulator;
use crate::domain::state::Duck;
use crate::domain::tuning::race::RaceTuning;

/// Counts down a stun and bleeds off speed while the duck is dazed.
pub fn recover(duck: &mut Duck, elapsed: f64, cfg: &RaceTuning) {
    duck.stunned = (duck.stunned - elapsed).max(0.0);
    duck.vx *= cfg.stunned_damping;
    duck.vy *= cfg.stunned_damping;
}

/// Carries a duck along the current for one physics step.
///
/// `elapsed` is real frame time (cooldowns); `dt` is the fixed physics step.
pub fn tick_duck(duck: &mut Duck, fluid: &FluidSimulator, elapsed: f64, dt: f64, cfg: &RaceTuning) {
    duck.splash_cooldown = (duck.splash_cooldown - elapsed).max(0.0);

    let (fluid_vx, fluid_vy) = fluid.sample_velocity(duck.x, duck.y);
    duck.vx += fluid_vx * cfg.fluid_force_factor;
    duck.vy += fluid_vy * cfg.fluid_force_factor;

    duck.vx *= cfg.damping;
    duck.vy *= cfg.damping;

    duck.x += duck.vx * dt;
    duck.y += duck.vy * dt;

    bounce_off_banks(duck, cfg);
}

fn bounce_off_banks(duck: &mut Duck, cfg: &RaceTuning) {
    let top = cfg.channel.0 * cfg.sim_height;
    let bottom = cfg.channel.1 * cfg.sim_height;

    if duck.y < top {
        duck.y = top;
        duck.vy *= cfg.wall_bounce;
    }
    if duck.y > bottom {
        duck.y = bottom;
        duck.vy *= cfg.wall_bounce;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{PlayerKind, Rgba};

    fn still_water() -> FluidSimulator {
        FluidSimulator::new(1000.0, 20, 10, 0.11)
    }

    fn duck(x: f64, y: f64) -> Duck {
        Duck::new(0, "You", PlayerKind::Human, Rgba::rgb(255, 215, 0), x, y)
    }

    #[test]
    fn duck_bounces_off_the_top_bank() {
        let cfg = RaceTuning::default();
        let fluid = still_water();
        let mut d = duck(1.0, 0.06);
        d.vy = -3.0;

        tick_duck(&mut d, &fluid, 1.0 / 60.0, 1.0 / 60.0, &cfg);

        assert_eq!(d.y, 0.05 * cfg.sim_height);
        assert!(d.vy > 0.0);
    }

    #[test]
    fn damping_slows_a_drifting_duck_in_still_water() {
        let cfg = RaceTuning::default();
        let fluid = still_water();
        let mut d = duck(1.0, 0.5);
        d.vx = 1.0;

        tick_duck(&mut d, &fluid, 1.0 / 60.0, 1.0 / 60.0, &cfg);

        assert!((d.vx - 0.8).abs() < 1e-12);
        assert!((d.x - (1.0 + 0.8 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn stun_wears_off_and_never_goes_negative() {
        let cfg = RaceTuning::default();
        let mut d = duck(1.0, 0.5);
        d.stunned = 0.01;
        d.vx = 1.0;

        recover(&mut d, 1.0 / 60.0, &cfg);

        assert_eq!(d.stunned, 0.0);
        assert!((d.vx - 0.95).abs() < 1e-12);
    }
}
