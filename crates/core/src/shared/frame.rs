use ndarray::ArrayView3;

/// Channels per pixel. Sources convert to RGB24 at the I/O boundary.
pub const RGB_CHANNELS: usize = 3;

/// A single decoded frame: tightly packed RGB bytes in row-major order,
/// tagged with its position in the source sequence.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGB_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A uniformly coloured frame. Handy for sources that synthesise frames.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * RGB_CHANNELS).collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channel)` view over the pixel buffer.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, RGB_CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Mean of all channel values, 0.0 for an empty frame.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| v as u64).sum();
        sum as f64 / self.data.len() as f64
    }
}
