// Eulerian fluid solver for the river current (semi-Lagrangian, staggered grid).

use super::grid::{FieldKind, Grid};

// The inlet covers this fraction of the padded channel height, centred.
const INLET_FRACTION: f64 = 0.8;
// Inflow pulses as `1 + WAVE_AMPLITUDE * cos(t * WAVE_FREQUENCY)`.
const WAVE_FREQUENCY: f64 = 2.0;
const WAVE_AMPLITUDE: f64 = 0.4;

/// Inputs for a single `simulate` step.
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub dt: f64,
    pub gravity: f64,
    pub num_iters: usize,
    pub over_relaxation: f64,
    pub flow_velocity: f64,
    /// Seconds since the race started; drives the inflow pulse.
    pub simulated_time: f64,
}

pub struct FluidSimulator {
    density: f64,
    grid: Grid,

    // Advection write buffers, swapped with the grid fields after each pass.
    new_u: Vec<f64>,
    new_v: Vec<f64>,
    new_m: Vec<f64>,

    inlet_min_j: usize,
    inlet_max_j: usize,
}

impl FluidSimulator {
    /// Creates a solver for `num_x * num_y` interior cells of size `h`.
    ///
    /// The grid is padded with a one-cell wall border; dimensions of zero are a
    /// caller error.
    pub fn new(density: f64, num_x: usize, num_y: usize, h: f64) -> Self {
        let grid = Grid::new(num_x + 2, num_y + 2, h);
        let num_cells = grid.num_x() * grid.num_y();

        let ny = grid.num_y() as f64;
        let pipe_h = INLET_FRACTION * ny;
        let inlet_min_j = ((0.5 * ny - 0.5 * pipe_h).floor() as usize).max(1);
        let inlet_max_j = ((0.5 * ny + 0.5 * pipe_h).floor() as usize).min(grid.num_y() - 1);

        Self {
            density,
            grid,
            new_u: vec![0.0; num_cells],
            new_v: vec![0.0; num_cells],
            new_m: vec![0.0; num_cells],
            inlet_min_j,
            inlet_max_j,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Rows `[min, max)` of the inlet band on the left wall.
    pub fn inlet_band(&self) -> (usize, usize) {
        (self.inlet_min_j, self.inlet_max_j)
    }

    /// Local current at a world position.
    pub fn sample_velocity(&self, x: f64, y: f64) -> (f64, f64) {
        let grid = &self.grid;
        (
            grid.sample_field(x, y, FieldKind::U, grid.u()),
            grid.sample_field(x, y, FieldKind::V, grid.v()),
        )
    }

    /// Advances the fluid by one step.
    pub fn simulate(&mut self, params: &StepParams) {
        self.apply_inflow(params.flow_velocity, params.simulated_time);
        self.integrate(params.dt, params.gravity);
        self.grid.p.fill(0.0);
        self.solve_incompressibility(params.num_iters, params.dt, params.over_relaxation);
        self.extrapolate();
        self.advect_velocity(params.dt);
        self.advect_dye(params.dt);
    }

    // Parabolic inflow profile whose peak pulses over time; marks inflow with dye 0.
    fn apply_inflow(&mut self, flow_velocity: f64, simulated_time: f64) {
        let n = self.grid.num_y();
        for j in 1..n - 1 {
            self.grid.u[n + j] = 0.0;
        }

        let centre = (self.inlet_min_j + self.inlet_max_j) as f64 / 2.0;
        let half_width = (self.inlet_max_j as f64 - self.inlet_min_j as f64) / 2.0;
        let peak = flow_velocity * (1.0 + WAVE_AMPLITUDE * (simulated_time * WAVE_FREQUENCY).cos());

        if half_width > 0.0 {
            for j in self.inlet_min_j..self.inlet_max_j {
                let rel = (j as f64 - centre) / half_width;
                self.grid.u[n + j] = (peak * (1.0 - rel * rel)).max(0.0);
            }
        }

        for j in self.inlet_min_j..self.inlet_max_j {
            self.grid.m[n + j] = 0.0;
        }
    }

    fn integrate(&mut self, dt: f64, gravity: f64) {
        if gravity == 0.0 {
            return;
        }
        let n = self.grid.num_y();
        for i in 1..self.grid.num_x() {
            for j in 1..n - 1 {
                if self.grid.s[i * n + j] != 0.0 && self.grid.s[i * n + j - 1] != 0.0 {
                    self.grid.v[i * n + j] += gravity * dt;
                }
            }
        }
    }

    /// Gauss-Seidel projection driving the divergence of every fluid cell toward zero.
    pub fn solve_incompressibility(&mut self, num_iters: usize, dt: f64, over_relaxation: f64) {
        let grid = &mut self.grid;
        let n = grid.num_y();
        let cp = self.density * grid.h() / dt;

        for _ in 0..num_iters {
            for i in 1..grid.num_x() - 1 {
                for j in 1..n - 1 {
                    if grid.s[i * n + j] == 0.0 {
                        continue;
                    }

                    let sx0 = grid.s[(i - 1) * n + j];
                    let sx1 = grid.s[(i + 1) * n + j];
                    let sy0 = grid.s[i * n + j - 1];
                    let sy1 = grid.s[i * n + j + 1];
                    let s_sum = sx0 + sx1 + sy0 + sy1;
                    // Fully enclosed cell: nothing can flow, leave it alone.
                    if s_sum == 0.0 {
                        continue;
                    }

                    let div = grid.u[(i + 1) * n + j] - grid.u[i * n + j] + grid.v[i * n + j + 1]
                        - grid.v[i * n + j];
                    let pressure_change = -div / s_sum * over_relaxation;
                    grid.p[i * n + j] += cp * pressure_change;

                    grid.u[i * n + j] -= sx0 * pressure_change;
                    grid.u[(i + 1) * n + j] += sx1 * pressure_change;
                    grid.v[i * n + j] -= sy0 * pressure_change;
                    grid.v[i * n + j + 1] += sy1 * pressure_change;
                }
            }
        }
    }

    // Free-slip border: copy the first interior row/column outward.
    fn extrapolate(&mut self) {
        let grid = &mut self.grid;
        let (nx, n) = (grid.num_x(), grid.num_y());
        for i in 0..nx {
            grid.u[i * n] = grid.u[i * n + 1];
            grid.u[i * n + n - 1] = grid.u[i * n + n - 2];
        }
        for j in 0..n {
            grid.v[j] = grid.v[n + j];
            grid.v[(nx - 1) * n + j] = grid.v[(nx - 2) * n + j];
        }
    }

    fn advect_velocity(&mut self, dt: f64) {
        self.new_u.copy_from_slice(&self.grid.u);
        self.new_v.copy_from_slice(&self.grid.v);

        let grid = &self.grid;
        let n = grid.num_y();
        let h = grid.h();
        let h2 = 0.5 * h;

        for i in 1..grid.num_x() - 1 {
            for j in 1..n - 1 {
                if grid.s[i * n + j] != 0.0 && grid.s[(i - 1) * n + j] != 0.0 {
                    let avg_v = (grid.v[(i - 1) * n + j]
                        + grid.v[i * n + j]
                        + grid.v[(i - 1) * n + j + 1]
                        + grid.v[i * n + j + 1])
                        * 0.25;
                    let x = i as f64 * h - dt * grid.u[i * n + j];
                    let y = j as f64 * h + h2 - dt * avg_v;
                    self.new_u[i * n + j] = grid.sample_field(x, y, FieldKind::U, &grid.u);
                }

                if grid.s[i * n + j] != 0.0 && grid.s[i * n + j - 1] != 0.0 {
                    let avg_u = (grid.u[i * n + j - 1]
                        + grid.u[i * n + j]
                        + grid.u[(i + 1) * n + j - 1]
                        + grid.u[(i + 1) * n + j])
                        * 0.25;
                    let x = i as f64 * h + h2 - dt * avg_u;
                    let y = j as f64 * h - dt * grid.v[i * n + j];
                    self.new_v[i * n + j] = grid.sample_field(x, y, FieldKind::V, &grid.v);
                }
            }
        }

        std::mem::swap(&mut self.grid.u, &mut self.new_u);
        std::mem::swap(&mut self.grid.v, &mut self.new_v);
    }

    fn advect_dye(&mut self, dt: f64) {
        self.new_m.copy_from_slice(&self.grid.m);

        let grid = &self.grid;
        let n = grid.num_y();
        let h = grid.h();
        let h2 = 0.5 * h;

        for i in 1..grid.num_x() - 1 {
            for j in 1..n - 1 {
                if grid.s[i * n + j] == 0.0 {
                    continue;
                }
                let u = (grid.u[i * n + j] + grid.u[(i + 1) * n + j]) * 0.5;
                let v = (grid.v[i * n + j] + grid.v[i * n + j + 1]) * 0.5;
                let x = i as f64 * h + h2 - dt * u;
                let y = j as f64 * h + h2 - dt * v;
                self.new_m[i * n + j] = grid.sample_field(x, y, FieldKind::Centered, &grid.m);
            }
        }

        std::mem::swap(&mut self.grid.m, &mut self.new_m);
    }
}
