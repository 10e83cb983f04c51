// src/window_renderer.rs
//! WindowRenderer - one video stream shown in one native window.
//!
//! Construction opens the window (`SurfaceManager`), waits for it to be
//! mapped, then binds a render backend to it (`RenderSession`). Frames and
//! end-of-stream arrive through `MediaSink::on_event`, from any thread.

use crate::cancel::CancelToken;
use crate::config::{RendererConfig, SurfaceConfig, DEFAULT_CONFIG};
use crate::display::{
    DisplayConnector, MapWait, NativeWindowHandle, Surface, SurfaceManager, X11DisplayConnector,
};
use crate::error::RendererError;
use crate::render::{FrameBuffer, RenderSession, VideoRenderFactory, X11RenderFactory};
use crate::source::{MediaSink, MediaSourceEvent};
use crate::stream_id::{RenderStreamId, StreamIdIssuer};
use anyhow::Context;
use log::{error, info, trace};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The external systems a renderer is built against.
pub struct Collaborators<'a> {
    pub display: &'a dyn DisplayConnector,
    pub render: &'a dyn VideoRenderFactory,
    pub ids: &'a StreamIdIssuer,
    /// Aborts the window-map wait when cancelled from another thread.
    pub cancel: CancelToken,
}

pub struct WindowRenderer {
    id: RenderStreamId,
    config: SurfaceConfig,
    // Stopped explicitly in `drop` before the surface goes away.
    session: RenderSession,
    surface: Mutex<Surface>,
}

impl WindowRenderer {
    /// Builds a renderer on the default X display using the X11 backend.
    pub fn new(config: &RendererConfig) -> Result<Self, RendererError> {
        Self::with_collaborators(
            config,
            Collaborators {
                display: &X11DisplayConnector,
                render: &X11RenderFactory,
                ids: StreamIdIssuer::global(),
                cancel: CancelToken::new(),
            },
        )
    }

    /// Builds a renderer from a binding-layer property bag (`width`, `height`,
    /// `fullscreen`), with every other setting taken from the defaults.
    pub fn from_properties(properties: &Value) -> anyhow::Result<Self> {
        let mut config = DEFAULT_CONFIG.clone();
        config.surface = SurfaceConfig::from_properties(properties)
            .context("Invalid renderer properties")?;
        Self::new(&config).context("Failed to construct window renderer")
    }

    /// Creates and maps the window, then starts rendering into it.
    ///
    /// Blocks until the window is mapped, `collaborators.cancel` is cancelled
    /// or the configured map timeout elapses. On failure everything acquired
    /// so far is released before the error is returned.
    pub fn with_collaborators(
        config: &RendererConfig,
        collaborators: Collaborators<'_>,
    ) -> Result<Self, RendererError> {
        let id = collaborators.ids.issue();
        let surface_config = config.surface.clone();
        info!(
            "WindowRenderer {}: constructing {}x{} (fullscreen: {})",
            id, surface_config.width, surface_config.height, surface_config.fullscreen
        );

        let wait = MapWait {
            cancel: &collaborators.cancel,
            timeout: config.map_timeout(),
        };
        let surface = SurfaceManager::new(collaborators.display)
            .create(&surface_config, wait)
            .map_err(|e| {
                error!("WindowRenderer {}: {}", id, e);
                e
            })?;

        let window = surface.window();
        let renderer = WindowRenderer {
            id,
            config: surface_config,
            session: RenderSession::new(id),
            surface: Mutex::new(surface),
        };

        // On error `renderer` is dropped here, stopping the session and then
        // destroying the window.
        renderer
            .session
            .start(collaborators.render, window, renderer.config.fullscreen)
            .map_err(|e| {
                error!("WindowRenderer {}: {}", id, e);
                e
            })?;

        info!("WindowRenderer {}: ready on window {}", id, window);
        Ok(renderer)
    }

    pub fn id(&self) -> RenderStreamId {
        self.id
    }

    /// The output window. Stays valid until the renderer is dropped, even
    /// after `end()`.
    pub fn window(&self) -> NativeWindowHandle {
        self.surface().window()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn is_rendering(&self) -> bool {
        self.session.is_active()
    }

    /// Renders one frame, or silently drops it once rendering has stopped.
    pub fn submit_frame(&self, frame: &FrameBuffer) {
        self.session.submit_frame(frame);
    }

    /// Stops rendering and releases the backend. Idempotent.
    pub fn end(&self) {
        info!("WindowRenderer {}: end of stream", self.id);
        self.session.stop();
    }

    fn surface(&self) -> MutexGuard<'_, Surface> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaSink for WindowRenderer {
    fn on_event(&self, event: MediaSourceEvent) {
        match event {
            MediaSourceEvent::Frame(frame) => self.submit_frame(&frame),
            MediaSourceEvent::End => self.end(),
            MediaSourceEvent::Other { kind } => {
                trace!("WindowRenderer {}: ignoring event kind {}", self.id, kind)
            }
        }
    }
}

impl Drop for WindowRenderer {
    fn drop(&mut self) {
        info!("WindowRenderer {}: destroying", self.id);
        self.session.stop();
        // `surface` drops after this, destroying the window.
    }
}
