// src/error.rs
//! Construction failures surfaced by `WindowRenderer`.
//!
//! Only the first failure of the construction sequence is reported. Frame
//! submission and teardown never fail, so they have no error type here.

use std::fmt;
use std::time::Duration;

/// Why a `WindowRenderer` could not be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererError {
    /// No connection to the windowing system could be opened.
    DisplayUnavailable,

    /// The display is reachable but the window could not be allocated. Covers
    /// both a missing 24-bit TrueColor visual and a failed window creation.
    WindowCreationFailed,

    /// The video-render backend could not be instantiated for the window.
    BackendCreationFailed,

    /// The backend rejected the incoming render stream.
    StreamAttachFailed,

    /// The stream is attached but the backend refused to start rendering.
    RenderStartFailed,

    /// The caller cancelled the wait for the window to be mapped.
    MapWaitCancelled,

    /// The window was not mapped within the configured deadline.
    MapWaitTimedOut(Duration),
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererError::DisplayUnavailable => {
                write!(f, "unable to connect to the X11 display")
            }
            RendererError::WindowCreationFailed => write!(f, "unable to create window"),
            RendererError::BackendCreationFailed => {
                write!(f, "unable to create video render backend")
            }
            RendererError::StreamAttachFailed => write!(f, "unable to create renderer stream"),
            RendererError::RenderStartFailed => write!(f, "unable to start renderer"),
            RendererError::MapWaitCancelled => {
                write!(f, "cancelled while waiting for the window to be mapped")
            }
            RendererError::MapWaitTimedOut(timeout) => write!(
                f,
                "window was not mapped within {} ms",
                timeout.as_millis()
            ),
        }
    }
}

impl std::error::Error for RendererError {}
