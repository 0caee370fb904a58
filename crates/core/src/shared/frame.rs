use ndarray::{ArrayView3, ArrayViewMut3};

const RGB_CHANNELS: usize = 3;

/// One decoded camera frame: packed RGB bytes in row-major order.
///
/// A frame with zero width or height stands for a stream whose first
/// frame has not been decoded yet.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGB_CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// A frame filled with a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u64) -> Self {
        let pixels = (width as usize) * (height as usize);
        let data = rgb.iter().copied().cycle().take(pixels * RGB_CHANNELS).collect();
        Self::new(data, width, height, sequence)
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

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `(height, width, channel)` view of the pixel data.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, RGB_CHANNELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame_repeats_colour() {
        let frame = VideoFrame::filled(2, 2, [10, 20, 30], 7);
        assert_eq!(frame.data().len(), 12);
        assert_eq!(&frame.data()[9..12], &[10, 20, 30]);
        assert_eq!(frame.sequence(), 7);
    }

    #[test]
    fn test_zero_sized_frame_is_empty() {
        assert!(VideoFrame::new(Vec::new(), 0, 480, 0).is_empty());
        assert!(VideoFrame::new(Vec::new(), 640, 0, 0).is_empty());
        assert!(!VideoFrame::filled(1, 1, [0, 0, 0], 0).is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        VideoFrame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_ndarray_is_row_major_rgb() {
        let mut frame = VideoFrame::filled(4, 2, [0, 0, 0], 0);
        frame.as_ndarray_mut()[[1, 3, 2]] = 200;
        let view = frame.as_ndarray();
        assert_eq!(view.shape(), &[2, 4, 3]);
        assert_eq!(frame.data()[(4 + 3) * 3 + 2], 200);
    }
}
