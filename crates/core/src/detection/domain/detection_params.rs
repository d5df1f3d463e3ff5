use serde::{Deserialize, Serialize};

/// Multi-scale search parameters for a cascade locator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Pyramid step between successive scales; must be > 1.
    pub scale_factor: f64,
    /// Minimum number of neighbouring raw hits a grouped detection needs.
    pub min_neighbors: u32,
    /// Smallest window `(width, height)` to report.
    pub min_size: (u32, u32),
}

impl DetectionParams {
    pub const fn new(scale_factor: f64, min_neighbors: u32, min_size: (u32, u32)) -> Self {
        Self {
            scale_factor,
            min_neighbors,
            min_size,
        }
    }

    /// Whole-frame face search.
    pub const FACE: Self = Self::new(1.1, 5, (30, 30));
    /// Eyes within the upper face band.
    pub const EYES: Self = Self::new(1.1, 4, (20, 20));
    /// First, stricter smile pass within the lower face band.
    pub const SMILE_PRIMARY: Self = Self::new(1.5, 15, (25, 25));
    /// Second, looser smile pass; results are concatenated with the first.
    pub const SMILE_SECONDARY: Self = Self::new(1.3, 10, (20, 20));
}
