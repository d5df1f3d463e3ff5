use ndarray::Array2;

// Fixed-point BT.601 luma weights (14-bit), matching the usual RGB→gray
// conversion used by classical cascade pipelines.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// A single image or camera frame: interleaved bytes in row-major order.
///
/// Supported layouts are gray (1 channel), RGB (3) and RGBA (4). Format
/// conversion happens at I/O boundaries; annotated output is always RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True when the frame carries no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Grayscale plane with shape `(height, width)`.
    ///
    /// Returns `None` for channel layouts other than gray, RGB and RGBA.
    pub fn to_gray(&self) -> Option<Array2<u8>> {
        let pixels = (self.width as usize) * (self.height as usize);
        let gray: Vec<u8> = match self.channels {
            1 => self.data.clone(),
            3 | 4 => self
                .data
                .chunks_exact(self.channels as usize)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
            _ => return None,
        };
        debug_assert_eq!(gray.len(), pixels);
        Array2::from_shape_vec((self.height as usize, self.width as usize), gray).ok()
    }

    /// Copy of this frame converted to 3-channel RGB.
    ///
    /// Gray pixels are replicated across channels and alpha is dropped.
    /// Returns `None` for unsupported channel layouts.
    pub fn to_rgb(&self) -> Option<Frame> {
        let data: Vec<u8> = match self.channels {
            3 => self.data.clone(),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            _ => return None,
        };
        Some(Frame::new(data, self.width, self.height, 3, self.index))
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    let round = 1 << (LUMA_SHIFT - 1);
    let y = (r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B + round) >> LUMA_SHIFT;
    y.min(255) as u8
}
