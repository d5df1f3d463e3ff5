use ndarray::{s, ArrayView2};

use crate::shared::region::Region;

use super::edges::{canny, EdgeThresholds};

/// Mean pixel value; 0 for an empty region.
pub fn mean_intensity(region: ArrayView2<'_, u8>) -> f64 {
    if region.is_empty() {
        return 0.0;
    }
    region.iter().map(|&v| v as f64).sum::<f64>() / region.len() as f64
}

/// Population standard deviation of the pixel values; 0 for an empty
/// region.
pub fn std_intensity(region: ArrayView2<'_, u8>) -> f64 {
    if region.is_empty() {
        return 0.0;
    }
    let mean = mean_intensity(region);
    let var = region
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / region.len() as f64;
    var.sqrt()
}

/// Mean of the Canny edge map, in `[0, 255]`.
pub fn edge_intensity(region: ArrayView2<'_, u8>, thresholds: EdgeThresholds) -> f64 {
    let edges = canny(region, thresholds);
    mean_intensity(edges.view())
}

/// Average eye height divided by 100; 0 with fewer than two eyes.
pub fn eye_height_ratio(eyes: &[Region]) -> f64 {
    if eyes.len() < 2 {
        return 0.0;
    }
    let total: i64 = eyes.iter().map(|e| e.height as i64).sum();
    total as f64 / eyes.len() as f64 / 100.0
}

/// Edge density of the top half of the band minus that of the bottom half.
///
/// Negative values mean more edges low in the band, the downturned-mouth
/// signal. Returns 0 when either half is empty.
pub fn mouth_curve(lower_band: ArrayView2<'_, u8>, thresholds: EdgeThresholds) -> f64 {
    let edges = canny(lower_band, thresholds);
    let half = edges.nrows() / 2;
    let top = edges.slice(s![..half, ..]);
    let bottom = edges.slice(s![half.., ..]);
    if top.is_empty() || bottom.is_empty() {
        return 0.0;
    }
    mean_intensity(top) - mean_intensity(bottom)
}
