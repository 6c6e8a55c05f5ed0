use crate::style::Rgb;

/// Braille Unicode canvas with a color per dot.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct PixelCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    pixels: Vec<Option<Rgb>>, // Row-major, (width*2) x (height*4)
}

/// One rendered character cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    /// Most common color among the lit dots
    pub color: Rgb,
}

impl PixelCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width * 2 * height * 4],
        }
    }

    #[inline(always)]
    pub fn pixel_width(&self) -> usize {
        self.width * 2
    }

    #[inline(always)]
    pub fn pixel_height(&self) -> usize {
        self.height * 4
    }

    /// Paint a pixel; later paints overwrite earlier ones
    #[inline(always)]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return;
        }
        let idx = y * self.pixel_width() + x;
        self.pixels[idx] = Some(color);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    #[inline(always)]
    pub fn set_pixel_signed(&mut self, x: i32, y: i32, color: Rgb) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return None;
        }
        self.pixels[y * self.pixel_width() + x]
    }

    /// Fill the horizontal span [x0, x1] on row y with a per-pixel color
    pub fn fill_span(&mut self, y: i32, x0: i32, x1: i32, mut color_at: impl FnMut(i32, i32) -> Rgb) {
        if y < 0 || y as usize >= self.pixel_height() {
            return;
        }
        let start = x0.max(0);
        let end = x1.min(self.pixel_width() as i32 - 1);
        for x in start..=end {
            self.set_pixel(x as usize, y as usize, color_at(x, y));
        }
    }

    /// Braille character and dominant color for a character cell
    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        if col >= self.width || row >= self.height {
            return None;
        }

        // Braille dot layout per character:
        // (0,0) (1,0)   bits: 0x01 0x08
        // (0,1) (1,1)   bits: 0x02 0x10
        // (0,2) (1,2)   bits: 0x04 0x20
        // (0,3) (1,3)   bits: 0x40 0x80
        const BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

        let mut bits = 0u8;
        let mut counts: [(Option<Rgb>, u8); 8] = [(None, 0); 8];
        for (dx, column) in BITS.iter().enumerate() {
            for (dy, bit) in column.iter().enumerate() {
                let Some(color) = self.get_pixel(col * 2 + dx, row * 4 + dy) else {
                    continue;
                };
                bits |= bit;
                if let Some(slot) = counts.iter_mut().find(|(c, _)| c.is_none() || *c == Some(color)) {
                    slot.0 = Some(color);
                    slot.1 += 1;
                }
            }
        }

        let (color, _) = counts
            .iter()
            .filter_map(|(c, n)| c.map(|c| (c, *n)))
            .max_by_key(|(_, n)| *n)?;
        let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
        Some(Cell { ch, color })
    }

    /// Iterate over lit cells as (col, row, cell)
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        (0..self.height)
            .flat_map(move |row| (0..self.width).map(move |col| (col, row)))
            .filter_map(move |(col, row)| self.cell(col, row).map(|cell| (col, row, cell)))
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| self.cell(col, row).map(|c| c.ch).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn test_single_pixel() {
        let mut canvas = PixelCanvas::new(1, 1);
        canvas.set_pixel(0, 0, RED);
        assert_eq!(canvas.to_string(), "⠁"); // U+2801
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = PixelCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y, RED);
            }
        }
        assert_eq!(canvas.to_string(), "⣿"); // U+28FF (all dots)
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = PixelCanvas::new(2, 1);
        canvas.set_pixel(0, 0, RED);
        canvas.set_pixel(1, 1, RED);
        canvas.set_pixel(2, 2, RED);
        canvas.set_pixel(3, 3, RED);
        // First char: (0,0) and (1,1) = 0x01 | 0x10 = 0x11
        // Second char: (0,2) and (1,3) = 0x04 | 0x80 = 0x84
        assert_eq!(canvas.to_string(), "⠑⢄");
    }

    #[test]
    fn test_dominant_color() {
        let mut canvas = PixelCanvas::new(1, 1);
        canvas.set_pixel(0, 0, RED);
        canvas.set_pixel(0, 1, BLUE);
        canvas.set_pixel(1, 1, BLUE);
        let cell = canvas.cell(0, 0).unwrap();
        assert_eq!(cell.color, BLUE);
        assert!(canvas.cell(1, 0).is_none());
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = PixelCanvas::new(1, 1);
        canvas.set_pixel_signed(-1, 0, RED);
        canvas.set_pixel(2, 0, RED);
        canvas.fill_span(0, -5, 10, |_, _| RED);
        assert_eq!(canvas.to_string(), "⠉");
        assert_eq!(canvas.cells().count(), 1);
    }
}
