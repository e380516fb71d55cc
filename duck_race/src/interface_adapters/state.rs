use crate::use_cases::RaceRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Active races keyed by id.
    pub race_registry: Arc<RaceRegistry>,
    // Seed applied to every race that does not request one.
    pub seed_override: Option<u64>,
}
