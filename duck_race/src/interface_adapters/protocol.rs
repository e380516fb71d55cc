// Wire protocol DTOs and conversions for public race server messages.

use crate::domain::Rgba;
use crate::use_cases::{DrawCommand, FrameUpdate, RaceProgress, RaceState};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Race the connection is attached to.
    Identity { race_id: String, level: u32 },
    // Display list for one frame.
    Frame(FrameDto),
    // Race lifecycle transitions (running, finished).
    RaceState(RaceStateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Tap or click on the displayed canvas.
    Pointer(PointerDto),
    // Splash strength slider moved.
    SplashStrength(SplashStrengthDto),
}

/// Pointer position in the coordinates of the surface the client displays.
#[derive(Debug, Clone, Deserialize)]
pub struct PointerDto {
    pub x: f64,
    pub y: f64,
    // Displayed surface size; omitted when the client draws at native canvas size.
    #[serde(default)]
    pub surface_width: Option<f64>,
    #[serde(default)]
    pub surface_height: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplashStrengthDto {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameDto {
    pub tick: u64,
    pub commands: Vec<DrawCommandDto>,
}

impl From<FrameUpdate> for FrameDto {
    fn from(update: FrameUpdate) -> Self {
        Self {
            tick: update.tick,
            commands: update.commands.into_iter().map(DrawCommandDto::from).collect(),
        }
    }
}

/// Canvas call with colours flattened to CSS strings.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommandDto {
    Clear {
        width: f64,
        height: f64,
    },
    Save,
    Restore,
    Translate {
        x: f64,
        y: f64,
    },
    Rotate {
        angle: f64,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: String,
    },
    FillCircle {
        x: f64,
        y: f64,
        radius: f64,
        color: String,
    },
    FillPolygon {
        points: Vec<[f64; 2]>,
        color: String,
    },
    // Column-major cell coverage bytes; the client scales `color`'s alpha by `coverage / 255`.
    FillCells {
        columns: usize,
        rows: usize,
        cell: f64,
        coverage: Vec<u8>,
        color: String,
    },
    StrokeArc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        line_width: f64,
        color: String,
    },
    DashedLine {
        from: [f64; 2],
        to: [f64; 2],
        line_width: f64,
        dash: f64,
        color: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        color: String,
    },
}

fn css(color: Rgba) -> String {
    format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, color.a)
}

impl From<DrawCommand> for DrawCommandDto {
    fn from(command: DrawCommand) -> Self {
        match command {
            DrawCommand::Clear { width, height } => DrawCommandDto::Clear { width, height },
            DrawCommand::Save => DrawCommandDto::Save,
            DrawCommand::Restore => DrawCommandDto::Restore,
            DrawCommand::Translate { x, y } => DrawCommandDto::Translate { x, y },
            DrawCommand::Rotate { angle } => DrawCommandDto::Rotate { angle },
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => DrawCommandDto::FillRect {
                x,
                y,
                width,
                height,
                color: css(color),
            },
            DrawCommand::FillCircle { x, y, radius, color } => DrawCommandDto::FillCircle {
                x,
                y,
                radius,
                color: css(color),
            },
            DrawCommand::FillPolygon { points, color } => DrawCommandDto::FillPolygon {
                points: points.into_iter().map(|(x, y)| [x, y]).collect(),
                color: css(color),
            },
            DrawCommand::FillCells {
                columns,
                rows,
                cell,
                coverage,
                color,
            } => DrawCommandDto::FillCells {
                columns,
                rows,
                cell,
                coverage,
                color: css(color),
            },
            DrawCommand::StrokeArc {
                x,
                y,
                radius,
                start,
                end,
                line_width,
                color,
            } => DrawCommandDto::StrokeArc {
                x,
                y,
                radius,
                start,
                end,
                line_width,
                color: css(color),
            },
            DrawCommand::DashedLine {
                from,
                to,
                line_width,
                dash,
                color,
            } => DrawCommandDto::DashedLine {
                from: [from.0, from.1],
                to: [to.0, to.1],
                line_width,
                dash,
                color: css(color),
            },
            DrawCommand::Text {
                x,
                y,
                text,
                size,
                color,
            } => DrawCommandDto::Text {
                x,
                y,
                text,
                size,
                color: css(color),
            },
        }
    }
}

/// Race lifecycle state sent to clients for UI flow.
#[derive(Debug, Clone, Serialize)]
pub enum RaceStateDto {
    Waiting,
    Running,
    Finished { winner: String, progress: RaceProgressDto },
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub enum RaceProgressDto {
    LevelComplete { next_level: u32 },
    Champion,
    GameOver,
}

impl From<RaceProgress> for RaceProgressDto {
    fn from(progress: RaceProgress) -> Self {
        match progress {
            RaceProgress::LevelComplete { next_level } => RaceProgressDto::LevelComplete { next_level },
            RaceProgress::Champion => RaceProgressDto::Champion,
            RaceProgress::GameOver => RaceProgressDto::GameOver,
        }
    }
}

impl From<RaceState> for RaceStateDto {
    fn from(state: RaceState) -> Self {
        match state {
            RaceState::Waiting => RaceStateDto::Waiting,
            RaceState::Running => RaceStateDto::Running,
            RaceState::Finished { winner, progress } => RaceStateDto::Finished {
                winner,
                progress: progress.into(),
            },
            RaceState::Stopped => RaceStateDto::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::{DisplayList, RaceController, RaceSetup, Tunings, render};

    #[test]
    fn client_messages_use_type_and_data_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Pointer","data":{"x":10.0,"y":20.0}}"#).expect("pointer");
        match msg {
            ClientMessage::Pointer(p) => {
                assert_eq!((p.x, p.y), (10.0, 20.0));
                assert!(p.surface_width.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"SplashStrength","data":{"value":1.5}}"#).expect("strength");
        assert!(matches!(msg, ClientMessage::SplashStrength(SplashStrengthDto { value }) if value == 1.5));
    }

    #[test]
    fn draw_commands_flatten_colours() {
        let dto = DrawCommandDto::from(DrawCommand::FillCircle {
            x: 1.0,
            y: 2.0,
            radius: 3.0,
            color: Rgba::rgb(255, 215, 0).with_alpha(0.5),
        });
        let json = serde_json::to_value(&dto).expect("serialize");
        assert_eq!(json["op"], "fill_circle");
        assert_eq!(json["color"], "rgba(255, 215, 0, 0.5)");
    }

    #[test]
    fn finished_state_carries_progress() {
        let msg = ServerMessage::RaceState(
            RaceState::Finished {
                winner: "You".to_string(),
                progress: RaceProgress::LevelComplete { next_level: 2 },
            }
            .into(),
        );
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["type"], "RaceState");
        assert_eq!(json["data"]["Finished"]["winner"], "You");
        assert_eq!(json["data"]["Finished"]["progress"]["LevelComplete"]["next_level"], 2);
    }

    #[test]
    fn frames_stay_compact_once_the_channel_is_washed_out() {
        // No ducks, so the race never ends and the current keeps flowing.
        let mut race = RaceController::with_ducks(RaceSetup { level: 1, seed: 1 }, Tunings::default(), Vec::new());
        for _ in 0..900 {
            race.step(1.0 / 60.0);
        }

        let mut list = DisplayList::default();
        render::render(&race, Some(&mut list));
        let commands = list.into_commands();
        assert!(commands.len() < 200, "{} commands", commands.len());

        let msg = ServerMessage::Frame(FrameDto::from(FrameUpdate { tick: 900, commands }));
        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(json.contains(r#""op":"fill_cells""#));
        assert!(json.len() < 40 * 1024, "{} bytes per frame", json.len());
    }
}
