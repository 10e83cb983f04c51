// src/display/driver.rs
//! Windowing-system seam used by `SurfaceManager`.
//!
//! The manager owns the surface-creation algorithm; a `DisplayConnection`
//! only exposes the primitives it needs (visual lookup, colormap and window
//! allocation, naming, mapping, event polling). `X11DisplayConnector` is the
//! real implementation; `MockDisplayConnector` scripts it for tests.
//!
//! ## Threading Model
//! A connection is created, used and dropped by whoever owns the `Surface`.
//! It may move between threads (`Send`) but is never shared.

use bitflags::bitflags;
use std::fmt;
use std::time::Duration;

/// Native window identifier. Zero means "no window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeWindowHandle(u64);

impl NativeWindowHandle {
    pub const NONE: NativeWindowHandle = NativeWindowHandle(0);

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NativeWindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Colormap identifier on the display server.
pub type Colormap = u64;

/// A visual resolved on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualInfo {
    pub id: u64,
    pub depth: u32,
}

bitflags! {
    /// Event notifications requested on a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u32 {
        const STRUCTURE_NOTIFY = 1 << 0;
        const EXPOSURE = 1 << 1;
    }
}

bitflags! {
    /// Which fields of `WindowAttributes` the server should honour.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeMask: u32 {
        const BACK_PIXEL = 1 << 0;
        const BORDER_PIXEL = 1 << 1;
        const COLORMAP = 1 << 2;
        const EVENT_MASK = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub background_pixel: u64,
    pub border_pixel: u64,
    pub colormap: Colormap,
    pub event_mask: EventMask,
}

/// Everything needed to allocate a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub border_width: u32,
    pub visual: VisualInfo,
    pub attributes: WindowAttributes,
    pub mask: AttributeMask,
}

/// Display-server notifications relevant to surface creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The window became viewable (MapNotify). `window` is the event window.
    Mapped { window: NativeWindowHandle },
    Exposed { window: NativeWindowHandle },
    Configured { window: NativeWindowHandle },
    Other,
}

/// Opens connections to a windowing system.
pub trait DisplayConnector {
    /// Returns `None` when no connection can be established.
    fn open(&self) -> Option<Box<dyn DisplayConnection>>;
}

/// An open connection to a windowing system.
///
/// Dropping the connection closes it; the server then reclaims any window
/// still owned by it.
pub trait DisplayConnection: Send {
    fn default_screen(&self) -> i32;

    /// Resolves a TrueColor visual of exactly `depth` bits. No fallback.
    fn match_true_color_visual(&mut self, screen: i32, depth: u32) -> Option<VisualInfo>;

    /// Allocates a colormap for `visual` against the screen's root window.
    fn create_colormap(&mut self, screen: i32, visual: VisualInfo) -> Colormap;

    fn free_colormap(&mut self, colormap: Colormap);

    /// Returns `None` if the server refused the window.
    fn create_window(&mut self, screen: i32, request: &WindowRequest)
        -> Option<NativeWindowHandle>;

    /// Sets both the window title and its icon name.
    fn set_names(&mut self, window: NativeWindowHandle, name: &str);

    fn select_input(&mut self, window: NativeWindowHandle, mask: EventMask);

    fn map_window(&mut self, window: NativeWindowHandle);

    /// Waits at most `slice` for the next queued event.
    fn poll_event(&mut self, slice: Duration) -> Option<SurfaceEvent>;

    fn destroy_window(&mut self, window: NativeWindowHandle);
}
