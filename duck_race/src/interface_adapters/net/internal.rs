use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::net::client::spawn_race_serializer;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{RaceError, RaceSetup};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, serde::Deserialize)]
pub struct CreateRaceRequest {
    // Optional race id; when omitted the server generates one.
    #[serde(default)]
    race_id: Option<String>,
    // Difficulty level, defaults to 1.
    #[serde(default)]
    level: Option<u32>,
    // Fixed seed for a reproducible race.
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
struct CreateRaceResponse {
    race_id: String,
    level: u32,
    seed: u64,
}

pub async fn create_race_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRaceRequest>,
) -> impl IntoResponse {
    let race_id = payload
        .race_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("race-{}", rand_id()));
    let level = payload.level.unwrap_or(1);
    let seed = payload.seed.or(state.seed_override).unwrap_or_else(rand::random::<u64>);

    match state
        .race_registry
        .create_race(race_id.clone(), RaceSetup { level, seed })
        .await
    {
        Ok(race) => {
            // Create the serializer so clients can subscribe immediately.
            spawn_race_serializer(&race);
            // Drop the race from the registry once it ends.
            state
                .race_registry
                .spawn_race_end_watcher(race.race_id.clone(), race.race_state_tx.subscribe());
            info!(race_id = %race_id, level, seed, "race created");
            (StatusCode::CREATED, Json(CreateRaceResponse { race_id, level, seed })).into_response()
        }
        Err(RaceError::AlreadyExists) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "race already exists".to_string(),
            }),
        )
            .into_response(),
        Err(RaceError::InvalidLevel) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "level must be at least 1".to_string(),
            }),
        )
            .into_response(),
    }
}
