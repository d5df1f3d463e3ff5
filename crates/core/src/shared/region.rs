use ndarray::{s, ArrayView2};

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// True when the rectangle lies fully inside a `width × height` image.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && (self.x as i64 + self.width as i64) <= width as i64
            && (self.y as i64 + self.height as i64) <= height as i64
    }

    /// Borrows the pixels of this region out of a grayscale plane.
    ///
    /// Returns `None` if the rectangle is empty or leaves the plane.
    pub fn crop<'a>(&self, plane: &ArrayView2<'a, u8>) -> Option<ArrayView2<'a, u8>> {
        let (rows, cols) = plane.dim();
        if !self.fits_within(cols, rows) {
            return None;
        }
        let (x, y) = (self.x as usize, self.y as usize);
        let (w, h) = (self.width as usize, self.height as usize);
        Some(plane.clone().slice_move(s![y..y + h, x..x + w]))
    }
}
