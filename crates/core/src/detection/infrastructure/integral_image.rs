/// Summed-area tables over one grayscale plane.
///
/// `sum` and `sq_sum` are the classic upright tables of size
/// `(height + 1) × (width + 1)`. The optional `tilted` table holds 45°
/// cone sums: `T(X, Y)` covers, for every row `py < Y`, the pixels
/// `X - (Y - py) ..= X + (Y - py) - 1`. Columns are padded by
/// `height + 1` on both sides so cones that start outside the image
/// still resolve.
pub struct IntegralImages {
    width: usize,
    height: usize,
    sum: Vec<i64>,
    sq_sum: Vec<i64>,
    tilted: Option<Vec<i64>>,
    tilted_pad: usize,
}

impl IntegralImages {
    pub fn new(pixels: &[u8], width: usize, height: usize, with_tilted: bool) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        let stride = width + 1;
        let mut sum = vec![0i64; stride * (height + 1)];
        let mut sq_sum = vec![0i64; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = 0i64;
            let mut row_sq = 0i64;
            for x in 0..width {
                let v = pixels[y * width + x] as i64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[y * stride + x + 1] + row_sum;
                sq_sum[idx] = sq_sum[y * stride + x + 1] + row_sq;
            }
        }

        let tilted_pad = height + 1;
        let tilted = with_tilted.then(|| tilted_table(pixels, width, height, tilted_pad));

        Self {
            width,
            height,
            sum,
            sq_sum,
            tilted,
            tilted_pad,
        }
    }

    /// Sum of pixels in the upright rectangle `[x, x+w) × [y, y+h)`.
    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        corner_sum(&self.sum, self.width + 1, x, y, w, h)
    }

    /// Sum of squared pixels in the upright rectangle `[x, x+w) × [y, y+h)`.
    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        corner_sum(&self.sq_sum, self.width + 1, x, y, w, h)
    }

    /// Sum over a 45° rectangle whose top corner is `(x, y)`, extending `w`
    /// steps down-right and `h` steps down-left.
    ///
    /// Returns 0 when the tilted table was not built.
    pub fn tilted_sum(&self, x: i64, y: i64, w: i64, h: i64) -> i64 {
        let Some(table) = self.tilted.as_ref() else {
            return 0;
        };
        let at = |px: i64, py: i64| self.tilted_at(table, px, py);
        at(x, y) - at(x - h, y + h) - at(x + w, y + w) + at(x + w - h, y + w + h)
    }

    fn tilted_at(&self, table: &[i64], x: i64, y: i64) -> i64 {
        let stride = (self.width + 2 * self.tilted_pad + 1) as i64;
        let col = x + self.tilted_pad as i64;
        if y < 0 || y > self.height as i64 || col < 0 || col >= stride {
            return 0;
        }
        table[(y * stride + col) as usize]
    }
}

fn corner_sum(table: &[i64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> i64 {
    let top_left = table[y * stride + x];
    let top_right = table[y * stride + x + w];
    let bottom_left = table[(y + h) * stride + x];
    let bottom_right = table[(y + h) * stride + x + w];
    bottom_right - top_right - bottom_left + top_left
}

// T(X, Y) = T(X-1, Y-1) + T(X+1, Y-1) - T(X, Y-2) + p(X-1, Y-1) + p(X, Y-1)
fn tilted_table(pixels: &[u8], width: usize, height: usize, pad: usize) -> Vec<i64> {
    let stride = width + 2 * pad + 1;
    let mut table = vec![0i64; stride * (height + 1)];
    let pixel = |x: i64, y: usize| -> i64 {
        if x < 0 || x >= width as i64 {
            0
        } else {
            pixels[y * width + x as usize] as i64
        }
    };

    for y in 1..=height {
        for col in 0..stride {
            let x = col as i64 - pad as i64;
            let up_left = if col > 0 {
                table[(y - 1) * stride + col - 1]
            } else {
                0
            };
            let up_right = if col + 1 < stride {
                table[(y - 1) * stride + col + 1]
            } else {
                0
            };
            let two_up = if y >= 2 { table[(y - 2) * stride + col] } else { 0 };
            table[y * stride + col] =
                up_left + up_right - two_up + pixel(x - 1, y - 1) + pixel(x, y - 1);
        }
    }
    table
}
