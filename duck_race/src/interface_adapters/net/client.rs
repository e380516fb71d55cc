use crate::domain::tuning::race::RaceTuning;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ClientMessage, FrameDto, PointerDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{FrameUpdate, RaceEvent, RaceHandle, RaceState};

use axum::{
    Error, Json,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    FramesClosed,
    RaceStateClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct RaceQuery {
    // The race the client wants to display.
    #[serde(default)]
    race_id: Option<String>,
}

pub async fn frame_serializer(
    mut frame_rx: broadcast::Receiver<FrameUpdate>,
    frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    frame_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each frame once and broadcast the shared bytes.
    loop {
        match frame_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::Frame(FrameDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize frame");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery.
                let _ = frame_latest_tx.send(bytes.clone());
                let _ = frame_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "frame serializer lagged; skipping to latest frame");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("frame channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_race_serializer(race: &RaceHandle) {
    tokio::spawn(frame_serializer(
        race.frame_tx.subscribe(),
        race.frame_bytes_tx.clone(),
        race.frame_latest_tx.clone(),
    ));
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RaceQuery>,
) -> impl IntoResponse {
    let Some(race_id) = query.race_id.filter(|id| !id.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "race_id is required");
    };

    let race = match state.race_registry.get_race(&race_id).await {
        Some(race) => race,
        None => return error_response(StatusCode::NOT_FOUND, "race not found"),
    };

    // Separate connection id for correlating logs across one socket.
    let conn_id = rand_id();
    let span = info_span!("conn", conn_id, race_id = %race.race_id);
    ws.on_upgrade(move |socket| handle_socket(socket, race).instrument(span))
}

async fn handle_socket(mut socket: WebSocket, race: RaceHandle) {
    let level = race.level;
    let bootstrapped = bootstrap_connection(&mut socket, &race).await;
    // Only the registry keeps the race's senders alive, so removal closes our receivers.
    drop(race);

    let mut ctx = match bootstrapped {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed").await;
            return;
        }
    };

    info!(level, "client connected");

    if ctx.race_over {
        let _ = send_close_with_reason(&mut socket, close_code::NORMAL, "race over").await;
        disconnect_cleanup(&ctx).await;
        return;
    }

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket.send(Message::Text(txt.into())).await.map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(socket: &mut WebSocket, code: u16, reason: &'static str) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

struct ConnCtx {
    pub input_tx: mpsc::Sender<RaceEvent>,
    // Canvas layout used to map pointer positions into the race.
    pub tuning: RaceTuning,
    pub frame_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub frame_latest_rx: watch::Receiver<Utf8Bytes>,
    pub race_state_rx: watch::Receiver<RaceState>,
    // Set once a terminal race state has been forwarded.
    pub race_over: bool,
    // Count lag recovery frames sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_frame_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(socket: &mut WebSocket, race: &RaceHandle) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let frame_bytes_rx = race.frame_bytes_tx.subscribe();
    let frame_latest_rx = race.frame_latest_tx.subscribe();
    let mut race_state_rx = race.race_state_tx.subscribe();

    let identity_msg = ServerMessage::Identity {
        race_id: race.race_id.to_string(),
        level: race.level,
    };
    let mut bytes_out = send_message(socket, &identity_msg).await? as u64;

    // Clone as soon as we borrow so the lock is not held across the send.
    let initial_state = race_state_rx.borrow_and_update().clone();
    let race_over = is_terminal(&initial_state);
    bytes_out += send_message(socket, &ServerMessage::RaceState(initial_state.into())).await? as u64;

    // A viewer is attached; the race clock may run.
    race.start.notify_one();

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        input_tx: race.input_tx.clone(),
        tuning: race.tuning,
        frame_bytes_rx,
        frame_latest_rx,
        race_state_rx,
        race_over,
        lag_recovery_count: 0,

        msgs_in: 0,
        msgs_out: 2,
        bytes_in: 0,
        bytes_out,

        invalid_json: 0,

        last_input_full_log: now,
        last_frame_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn is_terminal(state: &RaceState) -> bool {
    matches!(state, RaceState::Finished { .. } | RaceState::Stopped)
}

/// Maps a pointer on the client's surface into simulation space; rejects NaN/inf and empty surfaces.
fn sanitize_pointer(pointer: &PointerDto, tuning: &RaceTuning) -> Option<(f64, f64)> {
    let surface_width = pointer.surface_width.unwrap_or(tuning.canvas_width);
    let surface_height = pointer.surface_height.unwrap_or(tuning.canvas_height);
    let values = [pointer.x, pointer.y, surface_width, surface_height];
    if values.iter().any(|v| !v.is_finite()) || surface_width <= 0.0 || surface_height <= 0.0 {
        return None;
    }
    Some(tuning.surface_to_sim(pointer.x, pointer.y, surface_width, surface_height))
}

fn forward_event(ctx: &mut ConnCtx, event: RaceEvent) -> Result<LoopControl, NetError> {
    match ctx.input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(&mut ctx.last_input_full_log) {
                warn!("input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        // The race ended between frames; the state update follows.
        Err(mpsc::error::TrySendError::Closed(_evt)) if ctx.race_over => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame_msg = ctx.frame_bytes_rx.recv() => {
                match frame_msg {
                    Ok(bytes) => matches!(forward_frame_bytes(bytes, socket, ctx).await, LoopControl::Disconnect),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_frame_lag_log) {
                            warn!(missed = n, "frames lagged; sending latest frame");
                        }

                        // Resync strategy: skip straight to the newest frame.
                        let latest = ctx.frame_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            ctx.lag_recovery_count += 1;
                            matches!(forward_frame_bytes(latest, socket, ctx).await, LoopControl::Disconnect)
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // The race task is gone; pass on its final state before closing.
                        if !ctx.race_over {
                            forward_race_state(socket, ctx).await;
                        }
                        if !ctx.race_over {
                            fatal = Some(NetError::FramesClosed);
                        }
                        true
                    }
                }
            }

            changed_state = ctx.race_state_rx.changed() => {
                match changed_state {
                    Ok(()) => matches!(forward_race_state(socket, ctx).await, LoopControl::Disconnect),
                    Err(_) => {
                        if !ctx.race_over {
                            warn!("race state channel closed; disconnecting");
                            fatal = Some(NetError::RaceStateClosed);
                        }
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    disconnect_cleanup(ctx).await;

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(incoming: Option<Result<Message, Error>>, ctx: &mut ConnCtx) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Pointer(pointer)) => match sanitize_pointer(&pointer, &ctx.tuning) {
                        Some((x, y)) => forward_event(ctx, RaceEvent::Pointer { x, y }),
                        None => {
                            if should_log(&mut ctx.last_invalid_input_log) {
                                warn!("invalid pointer values; dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Ok(ClientMessage::SplashStrength(strength)) => {
                        if !strength.value.is_finite() {
                            if should_log(&mut ctx.last_invalid_input_log) {
                                warn!("invalid splash strength (NaN/inf); dropping");
                            }
                            return Ok(LoopControl::Continue);
                        }
                        forward_event(ctx, RaceEvent::SplashStrength { value: strength.value })
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(bytes = text.len(), error = %parse_err, "failed to parse client message");
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame_bytes(frame: Utf8Bytes, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let bytes_len = frame.len();
    match socket.send(Message::Text(frame)).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately.
            warn!(error = ?err, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

async fn forward_race_state(socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let state = ctx.race_state_rx.borrow_and_update().clone();
    let terminal = is_terminal(&state);
    if terminal {
        ctx.race_over = true;
    }
    match send_message(socket, &ServerMessage::RaceState(state.into())).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            if terminal {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: "race over".into(),
                });
                LoopControl::Disconnect
            } else {
                LoopControl::Continue
            }
        }
        Err(err) => {
            warn!(error = ?err, "failed to send race state");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) {
    if !ctx.race_over {
        // The display went away mid-race; stop requesting frames.
        if ctx.input_tx.send(RaceEvent::Stop).await.is_err() {
            debug!("race already ended before stop");
        }
    }

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(x: f64, y: f64, surface: Option<(f64, f64)>) -> PointerDto {
        PointerDto {
            x,
            y,
            surface_width: surface.map(|s| s.0),
            surface_height: surface.map(|s| s.1),
        }
    }

    #[test]
    fn pointer_maps_displayed_surface_into_simulation_space() {
        let tuning = RaceTuning::default();
        // Canvas shown at half size: the centre still maps to the centre.
        let (x, y) = sanitize_pointer(&pointer(300.0, 75.0, Some((600.0, 150.0))), &tuning).expect("valid");
        assert!((x - tuning.sim_width() / 2.0).abs() < 1e-9);
        assert!((y - tuning.sim_height / 2.0).abs() < 1e-9);

        // No surface size means native canvas pixels.
        let (x, _) = sanitize_pointer(&pointer(1200.0, 0.0, None), &tuning).expect("valid");
        assert!((x - tuning.sim_width()).abs() < 1e-9);
    }

    #[test]
    fn degenerate_pointers_are_rejected() {
        let tuning = RaceTuning::default();
        assert!(sanitize_pointer(&pointer(f64::NAN, 0.0, None), &tuning).is_none());
        assert!(sanitize_pointer(&pointer(1.0, 1.0, Some((0.0, 100.0))), &tuning).is_none());
        assert!(sanitize_pointer(&pointer(1.0, 1.0, Some((100.0, f64::INFINITY))), &tuning).is_none());
    }
}
