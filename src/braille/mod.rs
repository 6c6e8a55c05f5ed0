mod canvas;

pub use canvas::{Cell, PixelCanvas};
