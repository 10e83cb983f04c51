// src/display/manager.rs
//! SurfaceManager - creates the single output window and waits until it is
//! visible.

use crate::cancel::CancelToken;
use crate::config::SurfaceConfig;
use crate::display::driver::{
    AttributeMask, Colormap, DisplayConnection, DisplayConnector, EventMask, NativeWindowHandle,
    SurfaceEvent, WindowAttributes, WindowRequest,
};
use crate::error::RendererError;
use log::{debug, error, info, trace, warn};
use std::time::{Duration, Instant};

/// Colour depth of the visual every surface is created with.
pub const VISUAL_DEPTH: u32 = 24;

/// Upper bound on a single wait for display events. Cancellation and the
/// optional deadline are checked between slices.
const MAP_POLL_SLICE: Duration = Duration::from_millis(100);

/// How long, and under what cancellation, to wait for the window to be mapped.
#[derive(Debug, Clone, Copy)]
pub struct MapWait<'a> {
    pub cancel: &'a CancelToken,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// A created, mapped window together with the connection that owns it.
///
/// Dropping the surface destroys the window, frees its colormap and closes the
/// connection, in that order.
pub struct Surface {
    connection: Box<dyn DisplayConnection>,
    window: NativeWindowHandle,
    colormap: Colormap,
}

impl Surface {
    pub fn window(&self) -> NativeWindowHandle {
        self.window
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        info!("Surface: releasing window {}", self.window);
        self.connection.destroy_window(self.window);
        self.connection.free_colormap(self.colormap);
    }
}

/// Drives a `DisplayConnector` through window creation.
pub struct SurfaceManager<'a> {
    connector: &'a dyn DisplayConnector,
}

impl<'a> SurfaceManager<'a> {
    pub fn new(connector: &'a dyn DisplayConnector) -> Self {
        Self { connector }
    }

    /// Opens the display, creates a `config`-sized window with a 24-bit
    /// TrueColor visual, maps it and blocks until the map is confirmed.
    ///
    /// Anything acquired before a failure is released before returning.
    pub fn create(
        &self,
        config: &SurfaceConfig,
        wait: MapWait<'_>,
    ) -> Result<Surface, RendererError> {
        info!(
            "SurfaceManager: creating {}x{} surface '{}'",
            config.width, config.height, config.title
        );

        // X reports bad geometry asynchronously, and the default error
        // handler exits the process. Reject it before anything is allocated.
        if let Err(e) = config.validate() {
            error!("SurfaceManager: {}", e);
            return Err(RendererError::WindowCreationFailed);
        }

        let mut connection = self.connector.open().ok_or_else(|| {
            error!("SurfaceManager: unable to open a display connection");
            RendererError::DisplayUnavailable
        })?;

        let screen = connection.default_screen();
        let visual = connection
            .match_true_color_visual(screen, VISUAL_DEPTH)
            .ok_or_else(|| {
                warn!(
                    "SurfaceManager: no {}-bit TrueColor visual on screen {}",
                    VISUAL_DEPTH, screen
                );
                RendererError::WindowCreationFailed
            })?;
        debug!(
            "SurfaceManager: matched visual 0x{:x} (depth {}) on screen {}",
            visual.id, visual.depth, screen
        );

        let colormap = connection.create_colormap(screen, visual);
        let request = WindowRequest {
            x: 0,
            y: 0,
            width: config.width,
            height: config.height,
            border_width: 0,
            visual,
            attributes: WindowAttributes {
                background_pixel: 0,
                border_pixel: 0,
                colormap,
                event_mask: EventMask::STRUCTURE_NOTIFY | EventMask::EXPOSURE,
            },
            mask: AttributeMask::BACK_PIXEL
                | AttributeMask::BORDER_PIXEL
                | AttributeMask::COLORMAP
                | AttributeMask::EVENT_MASK,
        };

        let window = match connection.create_window(screen, &request) {
            Some(window) if !window.is_none() => window,
            _ => {
                error!("SurfaceManager: window creation failed");
                connection.free_colormap(colormap);
                return Err(RendererError::WindowCreationFailed);
            }
        };
        debug!("SurfaceManager: created window {}", window);

        let mut surface = Surface {
            connection,
            window,
            colormap,
        };
        surface.connection.set_names(window, &config.title);
        surface
            .connection
            .select_input(window, EventMask::STRUCTURE_NOTIFY);
        surface.connection.map_window(window);

        wait_for_map(surface.connection.as_mut(), window, wait)?;
        info!("SurfaceManager: window {} is mapped", window);
        Ok(surface)
    }
}

/// Drains display events until `window` is reported mapped.
fn wait_for_map(
    connection: &mut dyn DisplayConnection,
    window: NativeWindowHandle,
    wait: MapWait<'_>,
) -> Result<(), RendererError> {
    let deadline = wait.timeout.map(|timeout| (Instant::now() + timeout, timeout));
    debug!(
        "SurfaceManager: waiting for window {} to be mapped (timeout: {:?})",
        window, wait.timeout
    );

    loop {
        if wait.cancel.is_cancelled() {
            warn!("SurfaceManager: map wait for window {} cancelled", window);
            return Err(RendererError::MapWaitCancelled);
        }

        let slice = match deadline {
            Some((at, timeout)) => {
                let now = Instant::now();
                if now >= at {
                    warn!(
                        "SurfaceManager: window {} not mapped within {:?}",
                        window, timeout
                    );
                    return Err(RendererError::MapWaitTimedOut(timeout));
                }
                MAP_POLL_SLICE.min(at - now)
            }
            None => MAP_POLL_SLICE,
        };

        match connection.poll_event(slice) {
            Some(SurfaceEvent::Mapped { window: mapped }) if mapped == window => return Ok(()),
            Some(event) => trace!("SurfaceManager: skipping {:?} while waiting for map", event),
            None => {}
        }
    }
}
