// Per-frame race systems. Each one mutates a slice of the race state.

pub mod bot;
pub mod collisions;
pub mod duck_movement;
pub mod obstacles;
pub mod splash;
