use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Collect x positions where the horizontal line at `y` crosses any ring edge.
/// Half-open edge test so shared vertices are counted once (even-odd rule).
pub fn scanline_crossings(rings: &[Vec<DVec2>], y: f64, out: &mut Vec<f64>) {
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut prev = ring[ring.len() - 1];
        for &cur in ring {
            if (prev.y <= y) != (cur.y <= y) {
                let t = (y - prev.y) / (cur.y - prev.y);
                out.push(prev.x + t * (cur.x - prev.x));
            }
            prev = cur;
        }
    }
}
