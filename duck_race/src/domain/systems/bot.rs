use crate::domain::pool::SlotPool;
use crate::domain::state::{Duck, Obstacle};
use crate::domain::tuning::bot::BotTuning;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashReason {
    /// Push the duck away from an obstacle just ahead.
    Avoid,
    /// Kick the duck forward from behind to catch the leader.
    Propel,
}

/// A splash a bot has decided to make this frame.
#[derive(Debug, Clone, Copy)]
pub struct BotSplash {
    pub reason: SplashReason,
    pub x: f64,
    pub y: f64,
    pub strength: f64,
    /// Cooldown the bot takes on after splashing.
    pub cooldown: f64,
}

/// Steering policy for the bot at `ducks[index]`, run only while it is off cooldown.
#[allow(clippy::too_many_arguments)]
pub fn decide(
    index: usize,
    ducks: &[Duck],
    obstacles: &SlotPool<Obstacle>,
    sim_width: f64,
    sim_height: f64,
    base_cooldown: f64,
    rng: &mut impl Rng,
    cfg: &BotTuning,
) -> Option<BotSplash> {
    let duck = &ducks[index];

    let nearest_ahead = obstacles
        .iter()
        .map(|(_, o)| o)
        .filter(|o| o.x > duck.x && o.x - duck.x < cfg.avoid_distance)
        .map(|o| (o, (o.x - duck.x).hypot(o.y - duck.y)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let (reason, x, y) = match nearest_ahead {
        Some((o, dist)) if dist < cfg.avoid_distance => (SplashReason::Avoid, o.x, o.y),
        _ => {
            let leader_x = ducks.iter().map(|d| d.x).fold(f64::MIN, f64::max);
            if duck.x >= leader_x - cfg.trail_margin * sim_width {
                return None;
            }
            let x = duck.x - (cfg.propel_offset.0 + rng.gen_range(0.0..cfg.propel_offset.1));
            // Splash on the far side so the kick nudges the duck toward mid-channel.
            let steer = sign(sim_height / 2.0 - duck.y);
            let y = duck.y - steer * (cfg.steer_offset.0 + rng.gen_range(0.0..cfg.steer_offset.1));
            (SplashReason::Propel, x, y)
        }
    };

    let cooldown = base_cooldown * (cfg.cooldown_scale.0 + rng.gen_range(0.0..cfg.cooldown_scale.1));
    let strength = match reason {
        SplashReason::Avoid => cfg.splash_strength * cfg.avoid_boost,
        SplashReason::Propel => cfg.splash_strength,
    };

    Some(BotSplash {
        reason,
        x,
        y,
        strength,
        cooldown,
    })
}

// Like f64::signum, but 0 stays 0 so a centred duck is not steered.
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{ObstacleKind, PlayerKind, Rgba};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const WIDTH: f64 = 4.4;
    const HEIGHT: f64 = 1.1;

    fn bot(id: u64, x: f64, y: f64) -> Duck {
        Duck::new(id, format!("Bot {id}"), PlayerKind::Bot, Rgba::rgb(0, 0, 0), x, y)
    }

    fn decide_for(index: usize, ducks: &[Duck], obstacles: &SlotPool<Obstacle>) -> Option<BotSplash> {
        let mut rng = StdRng::seed_from_u64(3);
        decide(index, ducks, obstacles, WIDTH, HEIGHT, 1.0, &mut rng, &BotTuning::default())
    }

    #[test]
    fn bot_splashes_on_an_obstacle_just_ahead() {
        let ducks = vec![bot(1, 1.0, 0.5)];
        let mut obstacles = SlotPool::default();
        obstacles.insert(Obstacle::new(1, ObstacleKind::Log, 1.2, 0.52, 0.1, 0.04));
        obstacles.insert(Obstacle::new(2, ObstacleKind::Log, 1.1, 0.5, 0.1, 0.04));

        let splash = decide_for(0, &ducks, &obstacles).expect("bot should react");

        assert_eq!(splash.reason, SplashReason::Avoid);
        // Nearest wins.
        assert_eq!((splash.x, splash.y), (1.1, 0.5));
        assert!((splash.strength - 1.2).abs() < 1e-12);
        assert!(splash.cooldown >= 1.2 && splash.cooldown < 2.2);
    }

    #[test]
    fn obstacles_behind_or_far_ahead_are_ignored() {
        let ducks = vec![bot(1, 1.0, 0.5)];
        let mut obstacles = SlotPool::default();
        obstacles.insert(Obstacle::new(1, ObstacleKind::Log, 0.9, 0.5, 0.1, 0.04));
        obstacles.insert(Obstacle::new(2, ObstacleKind::Log, 1.4, 0.5, 0.1, 0.04));
        // Within range on x but too far off to the side.
        obstacles.insert(Obstacle::new(3, ObstacleKind::Log, 1.1, 0.9, 0.1, 0.04));

        // Sole duck leads, so there is nothing to catch up to either.
        assert!(decide_for(0, &ducks, &obstacles).is_none());
    }

    #[test]
    fn trailing_bot_propels_from_behind_toward_mid_channel() {
        let ducks = vec![bot(1, 1.0, 0.3), bot(2, 2.0, 0.5)];
        let obstacles = SlotPool::default();

        let splash = decide_for(0, &ducks, &obstacles).expect("trailing bot should splash");

        assert_eq!(splash.reason, SplashReason::Propel);
        assert!(splash.x < 1.0 - 0.1 + 1e-12 && splash.x >= 1.0 - 0.15);
        // Duck is above centre, so the splash lands above it to push it down.
        assert!(splash.y < 0.3);
        assert!((splash.strength - 1.0).abs() < 1e-12);
    }

    #[test]
    fn leader_pack_does_not_propel() {
        let ducks = vec![bot(1, 1.95, 0.3), bot(2, 2.0, 0.5)];
        let obstacles = SlotPool::default();
        assert!(decide_for(0, &ducks, &obstacles).is_none());
    }
}
