//! Read-only render passes over session state.

use crate::canvas::{Canvas, Rgb};
use crate::marker::MarkerGrid;

pub const BACKGROUND: Rgb = Rgb::gray(30.0);

const PAUSE_BACKGROUND: Rgb = Rgb::new(204.0, 255.0, 255.0);
const PAUSE_TEXT_COLOR: Rgb = Rgb::new(34.0, 139.0, 34.0);
const PAUSE_TEXT_SIZE:  f32 = 90.0;
const PAUSE_FONT:       &str = "HWT Arabesque";
pub const PAUSE_PROMPT: &str = "Press the \"Space bar\" to start";

/// Every marker at its current size and colour on a dark background.
pub fn draw_markers(grid: &MarkerGrid, canvas: &mut dyn Canvas) {
    canvas.clear(BACKGROUND);
    for m in grid.markers() {
        canvas.draw_filled_circle(m.x(), m.y(), m.current_size(), m.current_color());
    }
}

/// Static pause screen with a centred prompt.
///
/// Laid out against `canvas` as given.  The window never resizes, so the
/// canvas is the configured `canvas_width` × `canvas_height` for the whole
/// session rather than following the display.
pub fn draw_paused(canvas: &mut dyn Canvas) {
    canvas.clear(PAUSE_BACKGROUND);
    // Shrink the prompt on narrow canvases so it stays on screen.
    let chars = PAUSE_PROMPT.chars().count() as f32;
    let fit = canvas.width() / (chars * 0.8);
    let size = PAUSE_TEXT_SIZE.min(fit);
    let (cx, cy) = (canvas.width() / 2.0, canvas.height() / 2.0);
    canvas.draw_text(PAUSE_PROMPT, cx, cy, size, PAUSE_FONT, PAUSE_TEXT_COLOR);
}
