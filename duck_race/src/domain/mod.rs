// Domain layer: the river simulation, race entities and rules.

pub mod fluid;
pub mod grid;
pub mod pool;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use fluid::{FluidSimulator, StepParams};
pub use grid::{FieldKind, Grid};
pub use pool::SlotPool;
pub use state::{Duck, Obstacle, ObstacleKind, PlayerKind, Rgba, Splash};
