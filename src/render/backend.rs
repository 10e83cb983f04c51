// src/render/backend.rs
//! VideoRender trait - the render backend a `RenderSession` drives.
//!
//! A backend is bound to one native window and multiplexes incoming streams
//! into it, each stream identified by a `RenderStreamId` and placed in a
//! normalized viewport. Dropping the boxed backend destroys it.

use crate::display::NativeWindowHandle;
use crate::render::frame::VideoFrame;
use crate::stream_id::RenderStreamId;
use std::fmt;

/// Module tag every backend instance is created with.
///
/// The tag is a fixed session constant; it is not the per-renderer stream id.
pub const RENDER_MODULE_TAG: i32 = 1337;

/// Render path a backend should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderType {
    /// Let the backend pick its platform default.
    Default,
    /// Draw straight into a native X11 window.
    X11,
}

/// Rectangle in 0..1 coordinates relative to the window's full extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Viewport {
    pub const FULL: Viewport = Viewport {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    pub fn is_valid(&self) -> bool {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        in_range(self.left)
            && in_range(self.top)
            && in_range(self.right)
            && in_range(self.bottom)
            && self.left < self.right
            && self.top < self.bottom
    }

    /// Pixel rectangle covered by this viewport in a `width` x `height` window.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let scale = |v: f32, extent: u32| ((v * extent as f32).round() as u32).min(extent);
        let (x0, x1) = (scale(self.left, width), scale(self.right, width));
        let (y0, y1) = (scale(self.top, height), scale(self.bottom, height));
        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A stream registered inside a backend.
///
/// Only meaningful while the backend that issued it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingStream {
    id: RenderStreamId,
}

impl IncomingStream {
    pub fn new(id: RenderStreamId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> RenderStreamId {
        self.id
    }
}

/// Why a backend refused an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendFault {
    NoWindow,
    UnknownStream(RenderStreamId),
    DuplicateStream(RenderStreamId),
    InvalidViewport,
    Native(String),
}

impl fmt::Display for BackendFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendFault::NoWindow => write!(f, "no native window to render into"),
            BackendFault::UnknownStream(id) => write!(f, "stream {} is not registered", id),
            BackendFault::DuplicateStream(id) => write!(f, "stream {} is already registered", id),
            BackendFault::InvalidViewport => write!(f, "viewport is outside the unit square"),
            BackendFault::Native(reason) => write!(f, "native render failure: {}", reason),
        }
    }
}

impl std::error::Error for BackendFault {}

/// A render backend bound to one window.
pub trait VideoRender: Send {
    fn add_incoming_render_stream(
        &mut self,
        id: RenderStreamId,
        z_order: u32,
        viewport: Viewport,
    ) -> Result<IncomingStream, BackendFault>;

    fn delete_incoming_render_stream(&mut self, id: RenderStreamId) -> Result<(), BackendFault>;

    fn start_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault>;

    fn stop_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault>;

    /// Displays `frame` in the stream's viewport immediately.
    fn render_frame(
        &mut self,
        id: RenderStreamId,
        frame: &VideoFrame<'_>,
    ) -> Result<(), BackendFault>;
}

/// Instantiates render backends.
pub trait VideoRenderFactory {
    fn create(
        &self,
        tag: i32,
        window: NativeWindowHandle,
        fullscreen: bool,
        render_type: RenderType,
    ) -> Result<Box<dyn VideoRender>, BackendFault>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_viewport_covers_the_window() {
        assert!(Viewport::FULL.is_valid());
        assert_eq!(
            Viewport::FULL.to_pixels(600, 480),
            PixelRect {
                x: 0,
                y: 0,
                width: 600,
                height: 480
            }
        );
    }

    #[test]
    fn partial_viewport_maps_to_a_sub_rectangle() {
        let right_half = Viewport {
            left: 0.5,
            top: 0.0,
            right: 1.0,
            bottom: 0.5,
        };
        assert_eq!(
            right_half.to_pixels(600, 480),
            PixelRect {
                x: 300,
                y: 0,
                width: 300,
                height: 240
            }
        );
    }

    #[test]
    fn inverted_or_out_of_range_viewports_are_invalid() {
        let inverted = Viewport {
            left: 0.8,
            top: 0.0,
            right: 0.2,
            bottom: 1.0,
        };
        let outside = Viewport {
            left: 0.0,
            top: 0.0,
            right: 1.5,
            bottom: 1.0,
        };
        assert!(!inverted.is_valid());
        assert!(!outside.is_valid());
    }
}
