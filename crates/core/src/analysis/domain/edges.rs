use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::shared::constants::{CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD};

/// tan(22.5°) in 15-bit fixed point.
const TG22: i64 = 13573;
const SHIFT: u32 = 15;

/// Hysteresis thresholds on the L1 gradient magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeThresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            low: CANNY_LOW_THRESHOLD,
            high: CANNY_HIGH_THRESHOLD,
        }
    }
}

/// Binary Canny edge map: 255 on edges, 0 elsewhere.
///
/// Gradients come from a 3×3 Sobel with replicated borders and are
/// combined as `|dx| + |dy|`. The input is not smoothed first. A pixel is a
/// candidate when it survives non-maximum suppression with magnitude above
/// `low`; candidates 8-connected to a pixel above `high` become edges.
pub fn canny(image: ArrayView2<'_, u8>, thresholds: EdgeThresholds) -> Array2<u8> {
    let (rows, cols) = image.dim();
    let mut edges = Array2::<u8>::zeros((rows, cols));
    if rows == 0 || cols == 0 {
        return edges;
    }

    let (dx, dy, mag) = sobel(image);
    let low = thresholds.low.floor() as i32;
    let high = thresholds.high.floor() as i32;
    let mag_at = |y: isize, x: isize| -> i32 {
        if y < 0 || x < 0 || y >= rows as isize || x >= cols as isize {
            0
        } else {
            mag[[y as usize, x as usize]]
        }
    };

    // 0: not an edge, 1: weak candidate, 2: edge
    let mut state = Array2::<u8>::zeros((rows, cols));
    let mut stack = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let m = mag[[y, x]];
            if m <= low {
                continue;
            }
            let (yi, xi) = (y as isize, x as isize);
            let gx = dx[[y, x]] as i64;
            let gy = dy[[y, x]] as i64;
            let ax = gx.abs();
            let ay = gy.abs() << SHIFT;
            let tg22x = ax * TG22;

            let is_max = if ay < tg22x {
                m > mag_at(yi, xi - 1) && m >= mag_at(yi, xi + 1)
            } else {
                let tg67x = tg22x + (ax << (SHIFT + 1));
                if ay > tg67x {
                    m > mag_at(yi - 1, xi) && m >= mag_at(yi + 1, xi)
                } else {
                    let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
                    m > mag_at(yi - 1, xi - s) && m > mag_at(yi + 1, xi + s)
                }
            };
            if !is_max {
                continue;
            }

            if m > high {
                state[[y, x]] = 2;
                stack.push((y, x));
            } else {
                state[[y, x]] = 1;
            }
        }
    }

    while let Some((y, x)) = stack.pop() {
        edges[[y, x]] = 255;
        for ny in y.saturating_sub(1)..=(y + 1).min(rows - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(cols - 1) {
                if state[[ny, nx]] == 1 {
                    state[[ny, nx]] = 2;
                    stack.push((ny, nx));
                }
            }
        }
    }

    edges
}

fn sobel(image: ArrayView2<'_, u8>) -> (Array2<i32>, Array2<i32>, Array2<i32>) {
    let (rows, cols) = image.dim();
    let px = |y: isize, x: isize| -> i32 {
        let y = y.clamp(0, rows as isize - 1) as usize;
        let x = x.clamp(0, cols as isize - 1) as usize;
        image[[y, x]] as i32
    };

    let mut dx = Array2::<i32>::zeros((rows, cols));
    let mut dy = Array2::<i32>::zeros((rows, cols));
    let mut mag = Array2::<i32>::zeros((rows, cols));
    for y in 0..rows as isize {
        for x in 0..cols as isize {
            let gx = (px(y - 1, x + 1) + 2 * px(y, x + 1) + px(y + 1, x + 1))
                - (px(y - 1, x - 1) + 2 * px(y, x - 1) + px(y + 1, x - 1));
            let gy = (px(y + 1, x - 1) + 2 * px(y + 1, x) + px(y + 1, x + 1))
                - (px(y - 1, x - 1) + 2 * px(y - 1, x) + px(y - 1, x + 1));
            let idx = [y as usize, x as usize];
            dx[idx] = gx;
            dy[idx] = gy;
            mag[idx] = gx.abs() + gy.abs();
        }
    }
    (dx, dy, mag)
}
