use crate::domain::state::Rgba;

// Port for the 2D draw target the renderer paints onto.
// Coordinates are canvas pixels; transforms stack like an HTML canvas context.
pub trait Canvas {
    fn clear(&mut self, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgba);
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba);
    /// Square cells from the origin, column-major. Each coverage byte scales `color`'s alpha (255 = as given).
    fn fill_cells(&mut self, columns: usize, rows: usize, cell: f64, coverage: &[u8], color: Rgba);
    #[allow(clippy::too_many_arguments)]
    fn stroke_arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, line_width: f64, color: Rgba);
    fn dashed_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, dash: f64, color: Rgba);
    fn text(&mut self, x: f64, y: f64, text: &str, size: f64, color: Rgba);
}
