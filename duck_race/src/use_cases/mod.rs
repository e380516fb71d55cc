// Use cases layer: race workflows driven by the host loop.

pub mod progression;
pub mod race;
pub mod registry;
pub mod render;
pub mod types;

pub use progression::RaceProgress;
pub use race::{RaceController, RaceSetup, Tunings, race_task};
pub use registry::{RaceError, RaceHandle, RaceRegistry, RaceSettings};
pub use render::{DisplayList, DrawCommand};
pub use types::{FrameUpdate, PointerAction, RaceEvent, RaceOutcome, RaceState};
