// Frame rendering onto an abstract canvas.

use super::race::RaceController;
use crate::domain::ports::Canvas;
use crate::domain::tuning::race::RaceTuning;
use crate::domain::{Duck, FluidSimulator, Obstacle, ObstacleKind, Rgba};
use std::f64::consts::{FRAC_PI_4, PI, TAU};

const WHITE: Rgba = Rgba::rgb(255, 255, 255);
const BLACK: Rgba = Rgba::rgb(0, 0, 0);
const FINISH_RED: Rgba = Rgba::rgb(255, 0, 0);
const BEAK_ORANGE: Rgba = Rgba::rgb(255, 165, 0);
const DIZZY_GREY: Rgba = Rgba::rgb(0x33, 0x33, 0x33);
const LOG_BROWN: Rgba = Rgba::rgb(0x8B, 0x45, 0x13);
const GARBAGE_GREEN: Rgba = Rgba::rgb(0x55, 0x6B, 0x2F);
const GARBAGE_SCRAP: Rgba = Rgba::rgb(128, 128, 128).with_alpha(0.7);
const STOP_RED: Rgba = Rgba::rgb(0xDC, 0x26, 0x26);

// Displaced-water tint per unit of missing dye, and the cut-off below which a cell is skipped.
const DYE_ALPHA: f64 = 0.15;
const DYE_MIN_ALPHA: f64 = 0.01;

const STOP_RADIUS: f64 = 100.0;
const STOP_TEXT_SIZE: f64 = 80.0;

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Rotate { angle: f64 },
    FillRect { x: f64, y: f64, width: f64, height: f64, color: Rgba },
    FillCircle { x: f64, y: f64, radius: f64, color: Rgba },
    FillPolygon { points: Vec<(f64, f64)>, color: Rgba },
    FillCells {
        columns: usize,
        rows: usize,
        cell: f64,
        coverage: Vec<u8>,
        color: Rgba,
    },
    StrokeArc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        line_width: f64,
        color: Rgba,
    },
    DashedLine {
        from: (f64, f64),
        to: (f64, f64),
        line_width: f64,
        dash: f64,
        color: Rgba,
    },
    Text { x: f64, y: f64, text: String, size: f64, color: Rgba },
}

/// Canvas that records calls so a frame can be shipped to a remote display.
#[derive(Debug, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl Canvas for DisplayList {
    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::Translate { x, y });
    }

    fn rotate(&mut self, angle: f64) {
        self.commands.push(DrawCommand::Rotate { angle });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { x, y, radius, color });
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_cells(&mut self, columns: usize, rows: usize, cell: f64, coverage: &[u8], color: Rgba) {
        self.commands.push(DrawCommand::FillCells {
            columns,
            rows,
            cell,
            coverage: coverage.to_vec(),
            color,
        });
    }

    fn stroke_arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, line_width: f64, color: Rgba) {
        self.commands.push(DrawCommand::StrokeArc {
            x,
            y,
            radius,
            start,
            end,
            line_width,
            color,
        });
    }

    fn dashed_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, dash: f64, color: Rgba) {
        self.commands.push(DrawCommand::DashedLine {
            from,
            to,
            line_width,
            dash,
            color,
        });
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: f64, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            size,
            color,
        });
    }
}

/// Paints the current race state. Reads only; a missing target draws nothing.
pub fn render(race: &RaceController, target: Option<&mut dyn Canvas>) {
    let Some(canvas) = target else {
        return;
    };
    let cfg = race.tuning().race;
    let scale = cfg.scale();

    canvas.clear(cfg.canvas_width, cfg.canvas_height);
    draw_water(canvas, race.fluid(), scale);
    draw_finish_line(canvas, &cfg);

    for obstacle in race.obstacles() {
        draw_obstacle(canvas, obstacle, scale);
    }

    for splash in race.splashes() {
        canvas.stroke_arc(
            splash.x * scale,
            splash.y * scale,
            splash.radius,
            0.0,
            TAU,
            2.0,
            WHITE.with_alpha(splash.opacity),
        );
    }

    for duck in race.ducks() {
        draw_duck(canvas, duck, &cfg);
    }

    if race.is_over() {
        draw_stop_sign(canvas, &cfg);
    }
}

/// Lightens cells where the dye has been washed out, as one quantized cell field.
fn draw_water(canvas: &mut dyn Canvas, fluid: &FluidSimulator, scale: f64) {
    let grid = fluid.grid();
    let coverage: Vec<u8> = grid
        .m()
        .iter()
        .map(|&m| {
            let washed = (1.0 - m).clamp(0.0, 1.0);
            if washed * DYE_ALPHA > DYE_MIN_ALPHA {
                (washed * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();

    if coverage.iter().all(|&c| c == 0) {
        return;
    }
    canvas.fill_cells(
        grid.num_x(),
        grid.num_y(),
        grid.h() * scale,
        &coverage,
        WHITE.with_alpha(DYE_ALPHA),
    );
}

fn draw_finish_line(canvas: &mut dyn Canvas, cfg: &RaceTuning) {
    let x = cfg.finish_line * cfg.canvas_width;
    canvas.dashed_line((x, 0.0), (x, cfg.canvas_height), 3.0, 10.0, FINISH_RED);
}

fn draw_obstacle(canvas: &mut dyn Canvas, obstacle: &Obstacle, scale: f64) {
    let w = obstacle.width * scale;
    let h = obstacle.height * scale;

    canvas.save();
    canvas.translate(obstacle.x * scale, obstacle.y * scale);
    canvas.rotate(obstacle.angle);
    match obstacle.kind {
        ObstacleKind::Log => canvas.fill_rect(-w / 2.0, -h / 2.0, w, h, LOG_BROWN),
        ObstacleKind::Garbage => {
            canvas.fill_circle(0.0, 0.0, w / 2.0, GARBAGE_GREEN);
            canvas.fill_circle(w / 4.0, -w / 5.0, w / 6.0, GARBAGE_SCRAP);
        }
    }
    canvas.restore();
}

/// Body facing the direction of travel, with beak, eye and a stun countdown arc.
fn draw_duck(canvas: &mut dyn Canvas, duck: &Duck, cfg: &RaceTuning) {
    let scale = cfg.scale();
    let size = cfg.duck_size;

    canvas.save();
    canvas.translate(duck.x * scale, duck.y * scale);
    canvas.rotate(duck.vy.atan2(duck.vx));

    canvas.fill_circle(0.0, 0.0, size, duck.color);
    canvas.fill_polygon(
        &[(size - 2.0, 0.0), (size + 10.0, -4.0), (size + 10.0, 4.0)],
        BEAK_ORANGE,
    );
    canvas.fill_circle(size / 2.0, -size / 3.0, 2.0, BLACK);

    if duck.is_stunned() {
        let start = 1.5 * PI;
        let sweep = TAU * (duck.stunned / cfg.stun_duration);
        canvas.stroke_arc(0.0, -size, size * 0.8, start, start + sweep, 1.5, DIZZY_GREY);
    }
    canvas.restore();
}

fn draw_stop_sign(canvas: &mut dyn Canvas, cfg: &RaceTuning) {
    let cx = cfg.canvas_width / 2.0;
    let cy = cfg.canvas_height / 2.0;

    canvas.fill_rect(0.0, 0.0, cfg.canvas_width, cfg.canvas_height, BLACK.with_alpha(0.6));

    let octagon: Vec<(f64, f64)> = (0..8)
        .map(|k| {
            let angle = k as f64 * FRAC_PI_4;
            (cx + STOP_RADIUS * angle.cos(), cy + STOP_RADIUS * angle.sin())
        })
        .collect();
    canvas.fill_polygon(&octagon, STOP_RED);
    canvas.text(cx, cy, "STOP", STOP_TEXT_SIZE, WHITE);
}
