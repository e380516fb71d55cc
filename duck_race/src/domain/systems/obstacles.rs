use crate::domain::fluid::FluidSimulator;
use crate::domain::pool::SlotPool;
use crate::domain::state::{Obstacle, ObstacleKind};
use crate::domain::tuning::obstacle::ObstacleTuning;
use rand::Rng;
use std::f64::consts::TAU;

/// Obstacle mix per level: logs first, then garbage, then both.
pub fn kind_for_level(level: u32, rng: &mut impl Rng) -> ObstacleKind {
    match level {
        0 | 1 => ObstacleKind::Log,
        2 => ObstacleKind::Garbage,
        _ => {
            if rng.gen_bool(0.5) {
                ObstacleKind::Log
            } else {
                ObstacleKind::Garbage
            }
        }
    }
}

/// Builds an obstacle just off the left edge in a random lane.
pub fn spawn_obstacle(
    id: u64,
    level: u32,
    sim_width: f64,
    sim_height: f64,
    rng: &mut impl Rng,
    cfg: &ObstacleTuning,
) -> Obstacle {
    let kind = kind_for_level(level, rng);
    let y = sim_height * (cfg.lane.0 + rng.gen_range(0.0..cfg.lane.1));
    let width = cfg.width.0 + rng.gen_range(0.0..cfg.width.1);
    let height = cfg.height.0 + rng.gen_range(0.0..cfg.height.1);

    let mut obstacle = Obstacle::new(id, kind, cfg.entry_x * sim_width, y, width, height);
    obstacle.angle = rng.gen_range(0.0..TAU);
    obstacle
}

/// Culls obstacles that left the channel, then lets the current carry the rest.
pub fn tick_obstacles(
    obstacles: &mut SlotPool<Obstacle>,
    fluid: &FluidSimulator,
    sim_width: f64,
    dt: f64,
    cfg: &ObstacleTuning,
) {
    obstacles.retain(|o| o.x < sim_width * cfg.despawn_margin);

    for (_, obstacle) in obstacles.iter_mut() {
        let (fluid_vx, fluid_vy) = fluid.sample_velocity(obstacle.x, obstacle.y);
        obstacle.vx += fluid_vx * cfg.fluid_force_factor;
        obstacle.vy += fluid_vy * cfg.fluid_force_factor;
        obstacle.vx *= cfg.damping;
        obstacle.vy *= cfg.damping;
        obstacle.x += obstacle.vx * dt;
        obstacle.y += obstacle.vy * dt;
    }
}

/// Slot of the first obstacle whose footprint covers (x, y).
pub fn obstacle_at(obstacles: &SlotPool<Obstacle>, x: f64, y: f64) -> Option<usize> {
    obstacles
        .iter()
        .find(|(_, o)| o.contains(x, y))
        .map(|(slot, _)| slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn early_levels_have_a_single_obstacle_kind() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            assert_eq!(kind_for_level(1, &mut rng), ObstacleKind::Log);
            assert_eq!(kind_for_level(2, &mut rng), ObstacleKind::Garbage);
        }
    }

    #[test]
    fn later_levels_mix_both_kinds() {
        let mut rng = StdRng::seed_from_u64(7);
        let kinds: Vec<ObstacleKind> = (0..64).map(|_| kind_for_level(3, &mut rng)).collect();
        assert!(kinds.contains(&ObstacleKind::Log));
        assert!(kinds.contains(&ObstacleKind::Garbage));
    }

    #[test]
    fn spawned_obstacles_start_off_screen_within_lane_bounds() {
        let cfg = ObstacleTuning::default();
        let mut rng = StdRng::seed_from_u64(11);
        for id in 0..50 {
            let o = spawn_obstacle(id, 3, 4.4, 1.1, &mut rng, &cfg);
            assert!(o.x < 0.0);
            assert!(o.y >= 0.11 && o.y <= 0.99);
            assert!(o.width >= 0.08 && o.width < 0.15);
            assert!(o.height >= 0.03 && o.height < 0.05);
        }
    }

    #[test]
    fn spawn_lane_follows_tuning() {
        let cfg = ObstacleTuning {
            lane: (0.4, 0.1),
            entry_x: -0.2,
            ..ObstacleTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        for id in 0..50 {
            let o = spawn_obstacle(id, 1, 4.0, 1.0, &mut rng, &cfg);
            assert!((o.x + 0.8).abs() < 1e-12);
            assert!(o.y >= 0.4 && o.y < 0.5, "y {}", o.y);
        }
    }

    #[test]
    fn obstacles_past_the_outlet_are_culled() {
        let cfg = ObstacleTuning::default();
        let fluid = FluidSimulator::new(1000.0, 20, 10, 0.11);
        let mut pool = SlotPool::default();
        pool.insert(Obstacle::new(1, ObstacleKind::Log, 1.0, 0.5, 0.1, 0.04));
        pool.insert(Obstacle::new(2, ObstacleKind::Log, 4.9, 0.5, 0.1, 0.04));

        tick_obstacles(&mut pool, &fluid, 4.4, 1.0 / 60.0, &cfg);

        let ids: Vec<u64> = pool.iter().map(|(_, o)| o.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn tap_hits_only_inside_the_footprint() {
        let mut pool = SlotPool::default();
        let slot = pool.insert(Obstacle::new(1, ObstacleKind::Garbage, 1.0, 0.5, 0.1, 0.04));
        assert_eq!(obstacle_at(&pool, 1.03, 0.51), Some(slot));
        assert_eq!(obstacle_at(&pool, 1.2, 0.5), None);
    }
}
