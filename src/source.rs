// src/source.rs
//! Media-source signals and the push interface renderers expose.
//!
//! A frame producer pushes `MediaSourceEvent`s into a `MediaSink`. Only frames
//! and end-of-stream mean anything to a renderer; other kinds are ignored.

use crate::render::frame::{FrameBuffer, PixelFormat};
use log::{debug, info};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A signal pushed by a frame producer.
#[derive(Debug, Clone)]
pub enum MediaSourceEvent {
    /// A decoded frame. The producer keeps shared ownership of the buffer.
    Frame(Arc<FrameBuffer>),
    /// The producer will send no more frames.
    End,
    /// Any signal kind a renderer does not handle.
    Other { kind: u32 },
}

/// Receives media-source signals. May be called from any thread.
pub trait MediaSink {
    fn on_event(&self, event: MediaSourceEvent);
}

/// Produces a moving colour-bar pattern as I420 frames.
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frames: u32,
    interval: Duration,
}

/// Luma / chroma triples for white, yellow, cyan, green, magenta, red, blue, black.
const BARS: [(u8, u8, u8); 8] = [
    (235, 128, 128),
    (210, 16, 146),
    (170, 166, 16),
    (145, 54, 34),
    (106, 202, 222),
    (81, 90, 240),
    (41, 240, 110),
    (16, 128, 128),
];

impl TestPatternSource {
    pub fn new(width: u32, height: u32, frames: u32, fps: u32) -> Self {
        Self {
            width: width.max(2),
            height: height.max(2),
            frames,
            interval: Duration::from_secs(1) / fps.max(1),
        }
    }

    /// Frame `index` of the pattern: eight vertical bars scrolled left by
    /// `index` pixels.
    pub fn frame(&self, index: u32) -> FrameBuffer {
        let (w, h) = (self.width as usize, self.height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let bar_width = w.div_ceil(BARS.len()).max(1);
        let bar_at = |x: usize| BARS[((x + index as usize) / bar_width) % BARS.len()];

        let mut data = Vec::with_capacity(PixelFormat::I420.buffer_len(self.width, self.height));
        for _ in 0..h {
            data.extend((0..w).map(|x| bar_at(x).0));
        }
        for _ in 0..ch {
            data.extend((0..cw).map(|cx| bar_at(cx * 2).1));
        }
        for _ in 0..ch {
            data.extend((0..cw).map(|cx| bar_at(cx * 2).2));
        }

        // Plane sizes are computed from the same geometry the constructor checks.
        FrameBuffer::new(self.width, self.height, PixelFormat::I420, data)
            .unwrap_or_else(|e| unreachable!("test pattern geometry is consistent: {}", e))
    }

    /// Pushes every frame at the configured rate, then `End`.
    pub fn run(&self, sink: &dyn MediaSink) {
        info!(
            "TestPatternSource: {} frames of {}x{} every {:?}",
            self.frames, self.width, self.height, self.interval
        );
        let started = Instant::now();
        for index in 0..self.frames {
            sink.on_event(MediaSourceEvent::Frame(Arc::new(self.frame(index))));

            let due = self.interval * (index + 1);
            if let Some(wait) = due.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
        }
        debug!("TestPatternSource: finished after {:?}", started.elapsed());
        sink.on_event(MediaSourceEvent::End);
    }
}
