// Network adapter modules split by client sockets vs race management routes.

pub mod client;
pub mod internal;

pub use client::{spawn_race_serializer, ws_handler};
pub use internal::create_race_handler;
