// src/display/mod.rs
//! Display surface management.
//!
//! - DisplayConnector / DisplayConnection: windowing-system primitives (X11, mock)
//! - SurfaceManager: the window creation and map handshake
//! - Surface: RAII owner of the created window

pub mod driver;
pub mod drivers;
pub mod manager;

#[cfg(test)]
mod tests;

pub use driver::{DisplayConnection, DisplayConnector, NativeWindowHandle, SurfaceEvent};
pub use drivers::{MockDisplayConnector, X11DisplayConnector};
pub use manager::{MapWait, Surface, SurfaceManager, VISUAL_DEPTH};
