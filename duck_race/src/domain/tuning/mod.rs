// Gameplay tuning, kept apart from runtime/server configuration.

pub mod bot;
pub mod fluid;
pub mod obstacle;
pub mod race;
