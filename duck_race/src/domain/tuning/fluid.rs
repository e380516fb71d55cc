/// Tuning for the river current solver.

#[derive(Debug, Clone, Copy)]
pub struct FluidTuning {
    /// Fluid density used to scale the tracked pressure.
    pub density: f64,

    /// Interior cells across the channel height.
    pub resolution: usize,

    /// Fixed physics step in seconds.
    pub dt: f64,

    /// Gravity along +y. The river is viewed from above, so this stays 0.
    pub gravity: f64,

    /// Gauss-Seidel sweeps per projection.
    pub num_iters: usize,

    /// Over-relaxation applied to every pressure correction.
    pub over_relaxation: f64,

    /// Peak inflow speed at the inlet, before the wave pulse.
    pub flow_velocity: f64,
}

impl Default for FluidTuning {
    fn default() -> Self {
        Self {
            density: 1000.0,
            resolution: 30,
            dt: 1.0 / 60.0,
            gravity: 0.0,
            num_iters: 20,
            over_relaxation: 1.9,
            flow_velocity: 0.5,
        }
    }
}
