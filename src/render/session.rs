// src/render/session.rs
//! RenderSession - one stream rendered into one window.
//!
//! The backend and the attached stream live behind a mutex, so frame
//! submission, `stop()` and teardown on drop serialize even when end-of-stream
//! arrives on a different thread than the frames.

use crate::display::NativeWindowHandle;
use crate::error::RendererError;
use crate::render::backend::{
    IncomingStream, RenderType, VideoRender, VideoRenderFactory, Viewport, RENDER_MODULE_TAG,
};
use crate::render::frame::{FrameBuffer, VideoFrame};
use crate::stream_id::RenderStreamId;
use log::{debug, error, info, trace, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct ActiveRender {
    backend: Option<Box<dyn VideoRender>>,
    stream: Option<IncomingStream>,
}

pub struct RenderSession {
    id: RenderStreamId,
    state: Mutex<ActiveRender>,
}

impl RenderSession {
    pub fn new(id: RenderStreamId) -> Self {
        Self {
            id,
            state: Mutex::new(ActiveRender::default()),
        }
    }

    pub fn id(&self) -> RenderStreamId {
        self.id
    }

    /// Creates a backend for `window`, attaches this session's stream over the
    /// full window and starts rendering it.
    ///
    /// Whatever succeeded before a failure stays recorded: a start failure
    /// leaves the stream attached, and `stop()` (or drop) releases it.
    pub fn start(
        &self,
        factory: &dyn VideoRenderFactory,
        window: NativeWindowHandle,
        fullscreen: bool,
    ) -> Result<(), RendererError> {
        let mut state = self.lock();
        if state.backend.is_some() {
            warn!("RenderSession {}: start called twice; ignoring", self.id);
            return Ok(());
        }

        info!(
            "RenderSession {}: creating backend for window {} (fullscreen: {})",
            self.id, window, fullscreen
        );
        let mut backend = factory
            .create(RENDER_MODULE_TAG, window, fullscreen, RenderType::X11)
            .map_err(|fault| {
                error!("RenderSession {}: backend creation failed: {}", self.id, fault);
                RendererError::BackendCreationFailed
            })?;

        let attached = backend.add_incoming_render_stream(self.id, 0, Viewport::FULL);
        let stream = match attached {
            Ok(stream) => stream,
            Err(fault) => {
                error!("RenderSession {}: stream attach failed: {}", self.id, fault);
                state.backend = Some(backend);
                return Err(RendererError::StreamAttachFailed);
            }
        };
        debug!("RenderSession {}: stream attached", self.id);

        let started = backend.start_render(stream.id());
        state.backend = Some(backend);
        state.stream = Some(stream);

        started.map_err(|fault| {
            error!("RenderSession {}: start render failed: {}", self.id, fault);
            RendererError::RenderStartFailed
        })?;
        info!("RenderSession {}: rendering", self.id);
        Ok(())
    }

    /// Forwards one frame to the backend, or drops it if nothing is attached.
    pub fn submit_frame(&self, buffer: &FrameBuffer) {
        let frame = VideoFrame::new(buffer);
        let mut state = self.lock();
        let ActiveRender {
            backend: Some(backend),
            stream: Some(stream),
        } = &mut *state
        else {
            trace!("RenderSession {}: no renderer attached, frame dropped", self.id);
            return;
        };

        if let Err(fault) = backend.render_frame(stream.id(), &frame) {
            debug!("RenderSession {}: frame not rendered: {}", self.id, fault);
        }
    }

    /// Stops the stream, removes it and destroys the backend. Idempotent.
    pub fn stop(&self) {
        let mut state = self.lock();
        let stream = state.stream.take();
        let Some(mut backend) = state.backend.take() else {
            trace!("RenderSession {}: already stopped", self.id);
            return;
        };

        if let Some(stream) = stream {
            if let Err(fault) = backend.stop_render(stream.id()) {
                warn!("RenderSession {}: stop render failed: {}", self.id, fault);
            }
            if let Err(fault) = backend.delete_incoming_render_stream(stream.id()) {
                warn!("RenderSession {}: stream removal failed: {}", self.id, fault);
            }
        }
        drop(backend);
        info!("RenderSession {}: stopped", self.id);
    }

    /// True while a stream is attached to a live backend.
    pub fn is_active(&self) -> bool {
        let state = self.lock();
        state.backend.is_some() && state.stream.is_some()
    }

    pub fn has_backend(&self) -> bool {
        self.lock().backend.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, ActiveRender> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.stop();
    }
}
