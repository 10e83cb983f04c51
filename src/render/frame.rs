// src/render/frame.rs
//! Decoded video frames.
//!
//! A producer hands frames over as `Arc<FrameBuffer>`. The render path wraps a
//! borrowed buffer in a `VideoFrame` for the duration of one render call and
//! never keeps its own reference.

use std::fmt;
use std::time::Instant;

/// Pixel layout of a `FrameBuffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0: full-size Y plane, then quarter-size U and V planes.
    I420,
    /// Packed 8-bit B, G, R, A.
    Bgra,
}

impl PixelFormat {
    /// Bytes needed for a `width` x `height` image in this layout.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            PixelFormat::I420 => {
                let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
                w * h + 2 * cw * ch
            }
            PixelFormat::Bgra => w * h * 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    ZeroSized,
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ZeroSized => write!(f, "frame has no pixels"),
            FrameError::SizeMismatch { expected, actual } => write!(
                f,
                "frame data is {} bytes, layout requires {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// An immutable decoded picture.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroSized);
        }
        let expected = format.buffer_len(width, height);
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// A BGRA frame filled with one colour.
    pub fn solid_bgra(width: u32, height: u32, bgra: [u8; 4]) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        Self::new(width, height, PixelFormat::Bgra, bgra.repeat(pixels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Y, U and V planes of an I420 frame. `None` for packed formats.
    pub fn i420_planes(&self) -> Option<(&[u8], &[u8], &[u8])> {
        if self.format != PixelFormat::I420 {
            return None;
        }
        let luma = self.width as usize * self.height as usize;
        let chroma = self.chroma_width() as usize * self.height.div_ceil(2) as usize;
        let (y, rest) = self.data.split_at(luma);
        let (u, v) = rest.split_at(chroma);
        Some((y, u, v))
    }

    pub(crate) fn chroma_width(&self) -> u32 {
        self.width.div_ceil(2)
    }
}

// Pixel data is not worth printing.
impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Renderer-side container for one frame, borrowing the producer's buffer.
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    buffer: &'a FrameBuffer,
    received_at: Instant,
}

impl<'a> VideoFrame<'a> {
    pub fn new(buffer: &'a FrameBuffer) -> Self {
        Self {
            buffer,
            received_at: Instant::now(),
        }
    }

    pub fn buffer(&self) -> &'a FrameBuffer {
        self.buffer
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i420_length_rounds_chroma_up() {
        assert_eq!(PixelFormat::I420.buffer_len(4, 4), 16 + 2 * 4);
        assert_eq!(PixelFormat::I420.buffer_len(3, 3), 9 + 2 * 4);
        assert_eq!(PixelFormat::Bgra.buffer_len(3, 3), 36);
    }

    #[test]
    fn constructor_validates_geometry() {
        assert_eq!(
            FrameBuffer::new(0, 4, PixelFormat::Bgra, Vec::new()),
            Err(FrameError::ZeroSized)
        );
        assert_eq!(
            FrameBuffer::new(2, 2, PixelFormat::Bgra, vec![0; 15]),
            Err(FrameError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn i420_planes_split_at_plane_boundaries() {
        let mut data = vec![1u8; 6 * 4];
        data.extend(vec![2u8; 3 * 2]);
        data.extend(vec![3u8; 3 * 2]);
        let frame = FrameBuffer::new(6, 4, PixelFormat::I420, data).unwrap();

        let (y, u, v) = frame.i420_planes().unwrap();
        assert_eq!(y.len(), 24);
        assert!(y.iter().all(|&b| b == 1));
        assert!(u.iter().all(|&b| b == 2));
        assert!(v.iter().all(|&b| b == 3));
        assert_eq!(v.len(), 6);
    }

    #[test]
    fn packed_frames_have_no_planes() {
        let frame = FrameBuffer::solid_bgra(2, 2, [1, 2, 3, 4]).unwrap();
        assert!(frame.i420_planes().is_none());
        assert_eq!(&frame.data()[4..8], &[1, 2, 3, 4]);
    }
}
