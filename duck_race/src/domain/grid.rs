// Staggered (MAC) grid storage for the river current.

/// Which staggered sample location a field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Horizontal velocity, sampled at the left face of a cell.
    U,
    /// Vertical velocity, sampled at the top face of a cell.
    V,
    /// Cell-centred scalars such as dye.
    Centered,
}

/// Dense column-major fields over `num_x * num_y` cells, border included.
///
/// `u`, `v`, `p` and `m` always share the same shape. The solid mask `s` is
/// fixed at construction: the left column and the top and bottom rows are
/// walls, everything else is fluid, so the right edge acts as an outlet.
#[derive(Debug, Clone)]
pub struct Grid {
    num_x: usize,
    num_y: usize,
    h: f64,

    pub(crate) u: Vec<f64>,
    pub(crate) v: Vec<f64>,
    pub(crate) p: Vec<f64>,
    pub(crate) s: Vec<f64>,
    pub(crate) m: Vec<f64>,
}

impl Grid {
    /// Builds a grid whose dimensions already include the one-cell border.
    pub fn new(num_x: usize, num_y: usize, h: f64) -> Self {
        let num_cells = num_x * num_y;
        let mut s = vec![1.0; num_cells];
        for i in 0..num_x {
            for j in 0..num_y {
                if i == 0 || j == 0 || j + 1 == num_y {
                    s[i * num_y + j] = 0.0;
                }
            }
        }

        Self {
            num_x,
            num_y,
            h,
            u: vec![0.0; num_cells],
            v: vec![0.0; num_cells],
            p: vec![0.0; num_cells],
            s,
            m: vec![1.0; num_cells],
        }
    }

    pub fn num_x(&self) -> usize {
        self.num_x
    }

    pub fn num_y(&self) -> usize {
        self.num_y
    }

    pub fn h(&self) -> f64 {
        self.h
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        i * self.num_y + j
    }

    pub fn u(&self) -> &[f64] {
        &self.u
    }

    pub fn v(&self) -> &[f64] {
        &self.v
    }

    pub fn p(&self) -> &[f64] {
        &self.p
    }

    pub fn s(&self) -> &[f64] {
        &self.s
    }

    pub fn m(&self) -> &[f64] {
        &self.m
    }

    pub fn is_fluid(&self, i: usize, j: usize) -> bool {
        self.s[self.idx(i, j)] != 0.0
    }

    /// Net outflow of cell (i, j); zero for an incompressible cell.
    pub fn divergence(&self, i: usize, j: usize) -> f64 {
        let n = self.num_y;
        self.u[(i + 1) * n + j] - self.u[i * n + j] + self.v[i * n + j + 1] - self.v[i * n + j]
    }

    /// Bilinearly samples `data` at world position (x, y).
    ///
    /// The point is clamped into the grid and shifted by the half-cell offset
    /// of `kind`, so sampling exactly at a stored sample point returns it.
    pub fn sample_field(&self, x: f64, y: f64, kind: FieldKind, data: &[f64]) -> f64 {
        let n = self.num_y;
        let h = self.h;
        let h1 = 1.0 / h;
        let h2 = 0.5 * h;

        let x = x.min(self.num_x as f64 * h).max(h);
        let y = y.min(self.num_y as f64 * h).max(h);

        let (dx, dy) = match kind {
            FieldKind::U => (0.0, h2),
            FieldKind::V => (h2, 0.0),
            FieldKind::Centered => (h2, h2),
        };

        // Clamped coordinates are at least h / 2 past the offset, so floor() is non-negative.
        let x0 = (((x - dx) * h1).floor() as usize).min(self.num_x - 2);
        let tx = ((x - dx) - x0 as f64 * h) * h1;
        let x1 = (x0 + 1).min(self.num_x - 2);

        let y0 = (((y - dy) * h1).floor() as usize).min(self.num_y - 2);
        let ty = ((y - dy) - y0 as f64 * h) * h1;
        let y1 = (y0 + 1).min(self.num_y - 2);

        let sx = 1.0 - tx;
        let sy = 1.0 - ty;

        sx * sy * data[x0 * n + y0]
            + tx * sy * data[x1 * n + y0]
            + tx * ty * data[x1 * n + y1]
            + sx * ty * data[x0 * n + y1]
    }
}
