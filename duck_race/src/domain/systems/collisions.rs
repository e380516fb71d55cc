use crate::domain::pool::SlotPool;
use crate::domain::state::{Duck, Obstacle, ObstacleKind, PlayerKind};
use crate::domain::tuning::race::RaceTuning;
use tracing::debug;

/// What a duck-obstacle contact does to the duck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// Log hit: dazed and knocked back.
    Stunned,
    /// Garbage on a forgiving level: back to the start line, dazed.
    Respawned,
    /// Garbage on an early level: the bot is out of the race.
    Eliminated,
    /// Garbage on an early level: the human loses immediately.
    HumanLost,
}

/// Level-gated rule table for a contact.
pub fn outcome_for(kind: ObstacleKind, player: PlayerKind, level: u32, cfg: &RaceTuning) -> CollisionOutcome {
    match kind {
        ObstacleKind::Log => CollisionOutcome::Stunned,
        ObstacleKind::Garbage if level >= cfg.soft_fail_level => CollisionOutcome::Respawned,
        ObstacleKind::Garbage => match player {
            PlayerKind::Human => CollisionOutcome::HumanLost,
            PlayerKind::Bot => CollisionOutcome::Eliminated,
        },
    }
}

/// Applies the duck-side effects of an outcome.
pub fn apply(duck: &mut Duck, outcome: CollisionOutcome, cfg: &RaceTuning) {
    match outcome {
        CollisionOutcome::Stunned => {
            duck.stunned = cfg.stun_duration;
            duck.vx *= cfg.log_bounce;
        }
        CollisionOutcome::Respawned => {
            duck.reset_to_start();
            duck.stunned = cfg.stun_duration;
        }
        CollisionOutcome::Eliminated | CollisionOutcome::HumanLost => {}
    }
}

pub fn in_contact(duck: &Duck, obstacle: &Obstacle, cfg: &RaceTuning) -> bool {
    (duck.x - obstacle.x).hypot(duck.y - obstacle.y) < cfg.duck_radius() + obstacle.width / 2.0
}

#[derive(Debug, Default)]
pub struct CollisionReport {
    /// Set when the human touched garbage on an early level; the pass stops there.
    pub human_lost: bool,
    /// Bots removed from the roster this frame.
    pub eliminated: Vec<u64>,
}

/// Resolves every duck-obstacle contact for this frame.
///
/// Garbage that respawns or eliminates a duck is consumed; logs stay in the water.
pub fn tick_collisions(
    ducks: &mut Vec<Duck>,
    obstacles: &mut SlotPool<Obstacle>,
    level: u32,
    cfg: &RaceTuning,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    let mut consumed: Vec<usize> = Vec::new();

    'ducks: for duck in ducks.iter_mut() {
        for (slot, obstacle) in obstacles.iter() {
            if consumed.contains(&slot) || !in_contact(duck, obstacle, cfg) {
                continue;
            }

            let outcome = outcome_for(obstacle.kind, duck.kind, level, cfg);
            debug!(duck_id = duck.id, obstacle_id = obstacle.id, ?outcome, "collision");
            apply(duck, outcome, cfg);

            match outcome {
                CollisionOutcome::Stunned => {}
                CollisionOutcome::Respawned => consumed.push(slot),
                CollisionOutcome::Eliminated => {
                    consumed.push(slot);
                    report.eliminated.push(duck.id);
                    continue 'ducks;
                }
                CollisionOutcome::HumanLost => {
                    report.human_lost = true;
                    break 'ducks;
                }
            }
        }
    }

    for slot in consumed {
        obstacles.remove(slot);
    }
    if !report.eliminated.is_empty() {
        ducks.retain(|d| !report.eliminated.contains(&d.id));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Rgba;

    fn duck(id: u64, kind: PlayerKind, x: f64, y: f64) -> Duck {
        Duck::new(id, format!("duck-{id}"), kind, Rgba::rgb(0, 0, 0), x, y)
    }

    #[test]
    fn rule_table_is_gated_by_level() {
        let cfg = RaceTuning::default();
        use CollisionOutcome::*;
        use ObstacleKind::*;
        use PlayerKind::*;

        for level in 1..=4 {
            assert_eq!(outcome_for(Log, Human, level, &cfg), Stunned);
            assert_eq!(outcome_for(Log, Bot, level, &cfg), Stunned);
        }
        assert_eq!(outcome_for(Garbage, Human, 1, &cfg), HumanLost);
        assert_eq!(outcome_for(Garbage, Bot, 1, &cfg), Eliminated);
        assert_eq!(outcome_for(Garbage, Human, 2, &cfg), Respawned);
        assert_eq!(outcome_for(Garbage, Bot, 3, &cfg), Respawned);
    }

    #[test]
    fn identical_ducks_get_identical_outcomes() {
        let cfg = RaceTuning::default();
        let run = |kind: ObstacleKind, level: u32| {
            let mut d = duck(1, PlayerKind::Bot, 1.5, 0.5);
            d.vx = 0.4;
            let mut ducks = vec![d];
            let mut obstacles = SlotPool::default();
            obstacles.insert(Obstacle::new(9, kind, 1.52, 0.5, 0.1, 0.04));
            let report = tick_collisions(&mut ducks, &mut obstacles, level, &cfg);
            let state = ducks.first().map(|d| (d.x, d.y, d.vx, d.vy, d.stunned));
            (state, report.eliminated, obstacles.len())
        };

        for (kind, level) in [
            (ObstacleKind::Log, 1),
            (ObstacleKind::Garbage, 1),
            (ObstacleKind::Garbage, 2),
            (ObstacleKind::Garbage, 3),
        ] {
            assert_eq!(run(kind, level), run(kind, level));
        }
    }

    #[test]
    fn early_garbage_removes_bots_and_is_consumed() {
        let cfg = RaceTuning::default();
        let mut ducks = vec![duck(1, PlayerKind::Bot, 1.0, 0.5), duck(2, PlayerKind::Bot, 2.0, 0.5)];
        let mut obstacles = SlotPool::default();
        obstacles.insert(Obstacle::new(9, ObstacleKind::Garbage, 1.0, 0.5, 0.1, 0.04));

        let report = tick_collisions(&mut ducks, &mut obstacles, 1, &cfg);

        assert_eq!(report.eliminated, vec![1]);
        assert!(!report.human_lost);
        assert_eq!(ducks.len(), 1);
        assert_eq!(ducks[0].id, 2);
        assert!(obstacles.is_empty());
    }

    #[test]
    fn distant_obstacles_do_nothing() {
        let cfg = RaceTuning::default();
        let mut ducks = vec![duck(0, PlayerKind::Human, 1.0, 0.5)];
        let mut obstacles = SlotPool::default();
        obstacles.insert(Obstacle::new(9, ObstacleKind::Garbage, 1.3, 0.5, 0.1, 0.04));

        let report = tick_collisions(&mut ducks, &mut obstacles, 1, &cfg);

        assert!(!report.human_lost);
        assert_eq!(ducks[0].stunned, 0.0);
        assert_eq!(obstacles.len(), 1);
    }
}
