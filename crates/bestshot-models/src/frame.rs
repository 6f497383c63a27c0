//! Decoded frame types produced by the frame source.

/// Decoded pixel buffer for one sampled frame (tightly packed RGB8).
#[derive(Debug, Clone, PartialEq)]
pub struct FramePixels {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw RGB8 bytes, row-major, `width * height * 3` long
    pub data: Vec<u8>,
}

impl FramePixels {
    /// Create a pixel buffer, checking that the byte length matches the
    /// declared dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Number of pixels in the buffer.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Convert to 8-bit luma using the BT.601 weighting.
    ///
    /// CPU scorers (sharpness, exposure) operate on grayscale.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(3)
            .map(|px| {
                let y = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

/// One sampled, timestamped frame of the input video.
///
/// Immutable once produced by the frame source. The pixel buffer is dropped
/// after scoring; only scores and content keys travel further down the
/// pipeline.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the sampled sequence (0-based)
    pub index: usize,
    /// Timestamp in seconds from the start of the video
    pub timestamp: f64,
    /// Decoded pixels
    pub pixels: FramePixels,
    /// Stable hash of the pixel content, used to address the embedding cache
    pub content_key: String,
}

/// The full ordered output of a frame-source extraction.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    /// Total duration of the source video in seconds
    pub video_duration: f64,
    /// Frames in sampling order with strictly increasing timestamps
    pub frames: Vec<Frame>,
}

impl FrameBatch {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}
