// src/render/mod.rs
//! Video rendering into the output window.
//!
//! - VideoRender / VideoRenderFactory: backend seam (X11, mock)
//! - RenderSession: one stream's lifecycle inside a backend
//! - FrameBuffer / VideoFrame: decoded pictures and their render-side wrapper

pub mod backend;
pub mod convert;
pub mod frame;
pub mod mock;
pub mod session;
pub mod x11;

#[cfg(test)]
mod tests;

pub use backend::{
    BackendFault, IncomingStream, RenderType, VideoRender, VideoRenderFactory, Viewport,
    RENDER_MODULE_TAG,
};
pub use frame::{FrameBuffer, FrameError, PixelFormat, VideoFrame};
pub use mock::{MockRenderFactory, RenderCall};
pub use session::RenderSession;
pub use x11::{X11RenderFactory, X11VideoRender};
