use crate::braille::PixelCanvas;
use crate::config::StripeConfig;
use crate::style::{Fill, Rgb};

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut PixelCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y, color);

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

/// Draw a thicker line (selected region outline)
pub fn draw_thick_line(canvas: &mut PixelCanvas, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    draw_line(canvas, x0, y0, x1, y1, color);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1, color);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1, color);
}

/// Color of a fill at a canvas pixel. Stripes run along x + y = const,
/// tiled every `tile_size` pixels.
#[inline(always)]
pub fn fill_color_at(fill: Fill, stripes: &StripeConfig, x: i32, y: i32) -> Rgb {
    match fill {
        Fill::Solid(c) => c,
        Fill::Stripes { base, stripe } => {
            let tile = stripes.tile_size.max(1) as i32;
            let spacing = stripes.spacing.max(1) as i32;
            let diag = (x.rem_euclid(tile) + y.rem_euclid(tile)).rem_euclid(spacing);
            // Perpendicular distance to the nearest stripe center line
            let dist = diag.min(spacing - diag) as f64 / std::f64::consts::SQRT_2;
            if dist <= stripes.width / 2.0 {
                stripe
            } else {
                base
            }
        }
    }
}

/// Even-odd scanline fill of a set of rings given in canvas pixel coordinates.
/// Holes fall out of the parity rule without needing their winding.
pub fn fill_rings(canvas: &mut PixelCanvas, rings: &[Vec<(f64, f64)>], fill: Fill, stripes: &StripeConfig) {
    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let row_start = (min_y.floor() as i32).max(0);
    let row_end = (max_y.ceil() as i32).min(canvas.pixel_height() as i32 - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for row in row_start..=row_end {
        let sample_y = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            for edge in ring.windows(2) {
                let (x0, y0) = edge[0];
                let (x1, y1) = edge[1];
                if (y0 > sample_y) != (y1 > sample_y) {
                    crossings.push(x0 + (sample_y - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let x_start = (pair[0] - 0.5).ceil() as i32;
            let x_end = (pair[1] - 0.5).floor() as i32;
            if x_end >= x_start {
                canvas.fill_span(row, x_start, x_end, |x, y| fill_color_at(fill, stripes, x, y));
            }
        }
    }
}

/// Stroke every ring as a polyline
pub fn stroke_rings(canvas: &mut PixelCanvas, rings: &[Vec<(f64, f64)>], color: Rgb, heavy: bool) {
    for ring in rings {
        for edge in ring.windows(2) {
            let (x0, y0) = (edge[0].0.round() as i32, edge[0].1.round() as i32);
            let (x1, y1) = (edge[1].0.round() as i32, edge[1].1.round() as i32);
            if heavy {
                draw_thick_line(canvas, x0, y0, x1, y1, color);
            } else {
                draw_line(canvas, x0, y0, x1, y1, color);
            }
        }
    }
}

/// Draw a filled disk
pub fn fill_circle(canvas: &mut PixelCanvas, cx: f64, cy: f64, radius: f64, color: Rgb) {
    let r2 = radius * radius;
    let y_start = (cy - radius).floor() as i32;
    let y_end = (cy + radius).ceil() as i32;
    for y in y_start..=y_end {
        let dy = y as f64 + 0.5 - cy;
        let half = r2 - dy * dy;
        if half < 0.0 {
            continue;
        }
        let half = half.sqrt();
        let x0 = (cx - half - 0.5).ceil() as i32;
        let x1 = (cx + half - 0.5).floor() as i32;
        canvas.fill_span(y, x0, x1, |_, _| color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn stripes() -> StripeConfig {
        StripeConfig {
            tile_size: 32,
            spacing: 8,
            width: 4.0,
        }
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = PixelCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0, RED);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = PixelCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7, RED);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_square_solid() {
        let mut canvas = PixelCanvas::new(4, 2);
        let ring = vec![(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0), (0.0, 0.0)];
        fill_rings(&mut canvas, &[ring], Fill::Solid(RED), &stripes());
        assert_eq!(canvas.to_string(), "⣿⣿⣿⣿\n⣿⣿⣿⣿");
    }

    #[test]
    fn test_fill_leaves_hole_empty() {
        let mut canvas = PixelCanvas::new(6, 3);
        let outer = vec![(0.0, 0.0), (12.0, 0.0), (12.0, 12.0), (0.0, 12.0), (0.0, 0.0)];
        let hole = vec![(4.0, 4.0), (4.0, 8.0), (8.0, 8.0), (8.0, 4.0), (4.0, 4.0)];
        fill_rings(&mut canvas, &[outer, hole], Fill::Solid(RED), &stripes());
        assert_eq!(canvas.get_pixel(1, 1), Some(RED));
        assert_eq!(canvas.get_pixel(5, 5), None);
        assert_eq!(canvas.get_pixel(10, 10), Some(RED));
    }

    #[test]
    fn test_stripes_use_both_colors() {
        let fill = Fill::Stripes { base: RED, stripe: BLUE };
        let s = stripes();
        assert_eq!(fill_color_at(fill, &s, 0, 0), BLUE);
        assert_eq!(fill_color_at(fill, &s, 4, 0), RED);
        assert_eq!(fill_color_at(fill, &s, 2, 2), RED);
        assert_eq!(fill_color_at(fill, &s, 8, 0), BLUE);
        // Constant along the stripe direction
        assert_eq!(fill_color_at(fill, &s, 5, 3), fill_color_at(fill, &s, 3, 5));
    }

    #[test]
    fn test_empty_rings_no_panic() {
        let mut canvas = PixelCanvas::new(2, 2);
        fill_rings(&mut canvas, &[], Fill::Solid(RED), &stripes());
        fill_circle(&mut canvas, -50.0, -50.0, 3.0, RED);
        assert_eq!(canvas.cells().count(), 0);
    }

    #[test]
    fn test_fill_circle() {
        let mut canvas = PixelCanvas::new(4, 2);
        fill_circle(&mut canvas, 4.0, 4.0, 3.0, BLUE);
        assert_eq!(canvas.get_pixel(4, 4), Some(BLUE));
        assert_eq!(canvas.get_pixel(0, 0), None);
    }
}
