use ndarray::{s, ArrayView2};

/// Horizontal slices of a grayscale face crop.
///
/// The upper band spans rows `[⌊0.2h⌋, ⌊0.5h⌋)` and holds the eyes and
/// brows; the lower band spans `[⌊0.5h⌋, ⌊0.8h⌋)` and holds the mouth. Both
/// cover the full face width.
pub struct FaceBands<'a> {
    pub face: ArrayView2<'a, u8>,
    pub upper: ArrayView2<'a, u8>,
    pub lower: ArrayView2<'a, u8>,
}

impl<'a> FaceBands<'a> {
    pub fn split(face: ArrayView2<'a, u8>) -> Self {
        let h = face.nrows() as f64;
        let upper_top = (h * 0.2) as usize;
        let middle = (h * 0.5) as usize;
        let lower_bottom = (h * 0.8) as usize;
        Self {
            face,
            upper: face.slice_move(s![upper_top..middle, ..]),
            lower: face.slice_move(s![middle..lower_bottom, ..]),
        }
    }

    /// Bottom half of the lower band.
    pub fn cheeks(&self) -> ArrayView2<'a, u8> {
        let half = self.lower.nrows() / 2;
        self.lower.slice_move(s![half.., ..])
    }

    /// Top half of the upper band.
    pub fn brows(&self) -> ArrayView2<'a, u8> {
        let half = self.upper.nrows() / 2;
        self.upper.slice_move(s![..half, ..])
    }
}
