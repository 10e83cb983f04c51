// src/lib.rs
//! Single-window video output for X11.
//!
//! `WindowRenderer` creates a native window, binds a video render backend to
//! it and renders the frames pushed into it until end-of-stream.

pub mod cancel;
pub mod config;
pub mod display;
pub mod error;
pub mod render;
pub mod source;
pub mod stream_id;
pub mod window_renderer;

pub use cancel::CancelToken;
pub use config::{RendererConfig, SurfaceConfig, DEFAULT_CONFIG};
pub use error::RendererError;
pub use render::{FrameBuffer, PixelFormat};
pub use source::{MediaSink, MediaSourceEvent, TestPatternSource};
pub use stream_id::{RenderStreamId, StreamIdIssuer};
pub use window_renderer::{Collaborators, WindowRenderer};
