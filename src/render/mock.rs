// src/render/mock.rs

use crate::display::NativeWindowHandle;
use crate::render::backend::{
    BackendFault, IncomingStream, RenderType, VideoRender, VideoRenderFactory, Viewport,
};
use crate::render::frame::VideoFrame;
use crate::stream_id::RenderStreamId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Backend calls recorded by the mock, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Create {
        tag: i32,
        window: NativeWindowHandle,
        fullscreen: bool,
        render_type: RenderType,
    },
    AddStream {
        id: RenderStreamId,
        z_order: u32,
        viewport: Viewport,
    },
    StartRender(RenderStreamId),
    RenderFrame {
        id: RenderStreamId,
        width: u32,
        height: u32,
    },
    StopRender(RenderStreamId),
    DeleteStream(RenderStreamId),
    Destroy,
}

#[derive(Debug, Default)]
struct MockRenderState {
    calls: Vec<RenderCall>,
    fail_create: bool,
    fail_attach: bool,
    fail_start: bool,
    live_backends: usize,
}

/// Scriptable render backend factory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRenderFactory {
    state: Arc<Mutex<MockRenderState>>,
}

impl MockRenderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(self) -> Self {
        self.lock().fail_create = true;
        self
    }

    pub fn failing_attach(self) -> Self {
        self.lock().fail_attach = true;
        self
    }

    pub fn failing_start(self) -> Self {
        self.lock().fail_start = true;
        self
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.lock().calls.clone()
    }

    /// Number of backends created (successfully or not).
    pub fn creations(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::Create { .. }))
    }

    pub fn frames_rendered(&self, id: RenderStreamId) -> usize {
        self.count(|call| matches!(call, RenderCall::RenderFrame { id: frame_id, .. } if *frame_id == id))
    }

    pub fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Backends created and not yet destroyed.
    pub fn live_backends(&self) -> usize {
        self.lock().live_backends
    }

    fn lock(&self) -> MutexGuard<'_, MockRenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VideoRenderFactory for MockRenderFactory {
    fn create(
        &self,
        tag: i32,
        window: NativeWindowHandle,
        fullscreen: bool,
        render_type: RenderType,
    ) -> Result<Box<dyn VideoRender>, BackendFault> {
        let mut state = self.lock();
        state.calls.push(RenderCall::Create {
            tag,
            window,
            fullscreen,
            render_type,
        });
        if state.fail_create {
            return Err(BackendFault::Native("scripted creation failure".to_string()));
        }
        state.live_backends += 1;
        Ok(Box::new(MockVideoRender {
            state: Arc::clone(&self.state),
            streams: HashMap::new(),
        }))
    }
}

struct MockVideoRender {
    state: Arc<Mutex<MockRenderState>>,
    // Stream id -> started.
    streams: HashMap<RenderStreamId, bool>,
}

impl MockVideoRender {
    fn lock(&self) -> MutexGuard<'_, MockRenderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VideoRender for MockVideoRender {
    fn add_incoming_render_stream(
        &mut self,
        id: RenderStreamId,
        z_order: u32,
        viewport: Viewport,
    ) -> Result<IncomingStream, BackendFault> {
        let fail = {
            let mut state = self.lock();
            state.calls.push(RenderCall::AddStream {
                id,
                z_order,
                viewport,
            });
            state.fail_attach
        };
        if fail {
            return Err(BackendFault::Native("scripted attach failure".to_string()));
        }
        if self.streams.insert(id, false).is_some() {
            return Err(BackendFault::DuplicateStream(id));
        }
        Ok(IncomingStream::new(id))
    }

    fn delete_incoming_render_stream(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        self.lock().calls.push(RenderCall::DeleteStream(id));
        self.streams
            .remove(&id)
            .map(|_| ())
            .ok_or(BackendFault::UnknownStream(id))
    }

    fn start_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        let fail = {
            let mut state = self.lock();
            state.calls.push(RenderCall::StartRender(id));
            state.fail_start
        };
        if fail {
            return Err(BackendFault::Native("scripted start failure".to_string()));
        }
        let started = self
            .streams
            .get_mut(&id)
            .ok_or(BackendFault::UnknownStream(id))?;
        *started = true;
        Ok(())
    }

    fn stop_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        self.lock().calls.push(RenderCall::StopRender(id));
        let started = self
            .streams
            .get_mut(&id)
            .ok_or(BackendFault::UnknownStream(id))?;
        *started = false;
        Ok(())
    }

    fn render_frame(
        &mut self,
        id: RenderStreamId,
        frame: &VideoFrame<'_>,
    ) -> Result<(), BackendFault> {
        if !self.streams.contains_key(&id) {
            return Err(BackendFault::UnknownStream(id));
        }
        let buffer = frame.buffer();
        self.lock().calls.push(RenderCall::RenderFrame {
            id,
            width: buffer.width(),
            height: buffer.height(),
        });
        Ok(())
    }
}

impl Drop for MockVideoRender {
    fn drop(&mut self) {
        let mut state = self.lock();
        state.calls.push(RenderCall::Destroy);
        state.live_backends -= 1;
    }
}
