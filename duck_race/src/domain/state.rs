// Domain-level race entities.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Human,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Log,
    Garbage,
}

/// Straight-alpha colour in 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone)]
pub struct Duck {
    pub id: u64,
    pub name: String,
    pub kind: PlayerKind,
    pub color: Rgba,

    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,

    // Respawn point for soft fails.
    pub start_x: f64,
    pub start_y: f64,

    pub splash_cooldown: f64, // seconds until the next splash is allowed
    pub stunned: f64,         // seconds of stun remaining
}

impl Duck {
    pub fn new(id: u64, name: impl Into<String>, kind: PlayerKind, color: Rgba, x: f64, y: f64) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            color,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            start_x: x,
            start_y: y,
            splash_cooldown: 0.0,
            stunned: 0.0,
        }
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned > 0.0
    }

    pub fn reset_to_start(&mut self) {
        self.x = self.start_x;
        self.y = self.start_y;
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u64,
    pub kind: ObstacleKind,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl Obstacle {
    pub fn new(id: u64, kind: ObstacleKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            width,
            height,
            angle: 0.0,
        }
    }

    /// True when (x, y) falls within the obstacle's tap footprint.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).hypot(y - self.y) < self.width / 2.0
    }
}

/// Expanding ring left by a splash. Purely visual once created.
#[derive(Debug, Clone, Copy)]
pub struct Splash {
    pub x: f64,
    pub y: f64,
    pub radius: f64, // pixels
    pub opacity: f64,
}
