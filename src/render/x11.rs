// src/render/x11.rs
//! X11 video render backend.
//!
//! Opens its own connection to the X server (window ids are server-global),
//! keeps a BGRA canvas the size of the window, and presents each frame by
//! scaling it into its stream's viewport and blitting via `XPutImage`.

use crate::display::drivers::x11::init_xlib_threads;
use crate::display::NativeWindowHandle;
use crate::render::backend::{
    BackendFault, IncomingStream, RenderType, VideoRender, VideoRenderFactory, Viewport,
};
use crate::render::convert::{self, BYTES_PER_PIXEL};
use crate::render::frame::VideoFrame;
use crate::stream_id::RenderStreamId;
use libc::{c_char, c_int, c_uint};
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::mem;
use std::ptr;
use x11::xlib;

/// Creates `X11VideoRender` instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct X11RenderFactory;

impl VideoRenderFactory for X11RenderFactory {
    fn create(
        &self,
        tag: i32,
        window: NativeWindowHandle,
        fullscreen: bool,
        render_type: RenderType,
    ) -> Result<Box<dyn VideoRender>, BackendFault> {
        info!(
            "X11RenderFactory: module {} for window {} ({:?}, fullscreen: {})",
            tag, window, render_type, fullscreen
        );
        if window.is_none() {
            return Err(BackendFault::NoWindow);
        }
        let render = X11VideoRender::new(window, fullscreen)?;
        Ok(Box::new(render))
    }
}

#[derive(Debug)]
struct StreamEntry {
    z_order: u32,
    viewport: Viewport,
    started: bool,
}

pub struct X11VideoRender {
    display: *mut xlib::Display,
    window: xlib::Window,
    gc: xlib::GC,
    visual: *mut xlib::Visual,
    depth: c_int,
    width: u32,
    height: u32,
    fullscreen: bool,
    canvas: Vec<u8>,
    streams: HashMap<RenderStreamId, StreamEntry>,
}

// SAFETY: `new` initializes Xlib thread support before opening the private
// connection, so Xlib locks its process-wide state. The connection and GC are
// only reached through `&mut self`, which `RenderSession` serializes.
unsafe impl Send for X11VideoRender {}

impl X11VideoRender {
    /// Binds a renderer to an existing window. The window keeps the geometry
    /// it was created with; `fullscreen` is recorded, not applied, since the
    /// window is never reconfigured after creation.
    pub fn new(window: NativeWindowHandle, fullscreen: bool) -> Result<Self, BackendFault> {
        if !init_xlib_threads() {
            return Err(BackendFault::Native("XInitThreads failed".to_string()));
        }
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(BackendFault::Native(
                "unable to open X display for rendering".to_string(),
            ));
        }

        let mut attributes: xlib::XWindowAttributes = unsafe { mem::zeroed() };
        let status = unsafe { xlib::XGetWindowAttributes(display, window.raw(), &mut attributes) };
        if status == 0 || attributes.width <= 0 || attributes.height <= 0 {
            unsafe { xlib::XCloseDisplay(display) };
            return Err(BackendFault::Native(format!(
                "cannot query attributes of window {}",
                window
            )));
        }

        let gc = unsafe { xlib::XCreateGC(display, window.raw(), 0, ptr::null_mut()) };
        if gc.is_null() {
            unsafe { xlib::XCloseDisplay(display) };
            return Err(BackendFault::Native("XCreateGC failed".to_string()));
        }

        let (width, height) = (attributes.width as u32, attributes.height as u32);
        if attributes.depth != 24 && attributes.depth != 32 {
            warn!(
                "X11VideoRender: window depth {} is not 24/32 bit; colours will be wrong",
                attributes.depth
            );
        }
        debug!(
            "X11VideoRender: bound to window {} ({}x{}, depth {})",
            window, width, height, attributes.depth
        );

        Ok(Self {
            display,
            window: window.raw(),
            gc,
            visual: attributes.visual,
            depth: attributes.depth,
            width,
            height,
            fullscreen,
            canvas: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
            streams: HashMap::new(),
        })
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Copies a region of the canvas to the same position in the window.
    fn present(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<(), BackendFault> {
        unsafe {
            let image = xlib::XCreateImage(
                self.display,
                self.visual,
                self.depth as c_uint,
                xlib::ZPixmap,
                0,
                self.canvas.as_mut_ptr() as *mut c_char,
                self.width,
                self.height,
                32, // bitmap_pad
                0,  // bytes_per_line (computed)
            );
            if image.is_null() {
                return Err(BackendFault::Native("XCreateImage failed".to_string()));
            }

            xlib::XPutImage(
                self.display,
                self.window,
                self.gc,
                image,
                x as c_int,
                y as c_int,
                x as c_int,
                y as c_int,
                width,
                height,
            );

            // The canvas still owns the pixels.
            (*image).data = ptr::null_mut();
            xlib::XDestroyImage(image);
            xlib::XFlush(self.display);
        }
        Ok(())
    }

    fn entry(&mut self, id: RenderStreamId) -> Result<&mut StreamEntry, BackendFault> {
        self.streams
            .get_mut(&id)
            .ok_or(BackendFault::UnknownStream(id))
    }
}

impl VideoRender for X11VideoRender {
    fn add_incoming_render_stream(
        &mut self,
        id: RenderStreamId,
        z_order: u32,
        viewport: Viewport,
    ) -> Result<IncomingStream, BackendFault> {
        if !viewport.is_valid() {
            return Err(BackendFault::InvalidViewport);
        }
        if self.streams.contains_key(&id) {
            return Err(BackendFault::DuplicateStream(id));
        }
        debug!(
            "X11VideoRender: stream {} added at z {} with {:?}",
            id, z_order, viewport
        );
        self.streams.insert(
            id,
            StreamEntry {
                z_order,
                viewport,
                started: false,
            },
        );
        Ok(IncomingStream::new(id))
    }

    fn delete_incoming_render_stream(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        self.streams
            .remove(&id)
            .map(|entry| debug!("X11VideoRender: stream {} removed (z {})", id, entry.z_order))
            .ok_or(BackendFault::UnknownStream(id))
    }

    fn start_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        self.entry(id)?.started = true;
        Ok(())
    }

    fn stop_render(&mut self, id: RenderStreamId) -> Result<(), BackendFault> {
        self.entry(id)?.started = false;
        Ok(())
    }

    fn render_frame(
        &mut self,
        id: RenderStreamId,
        frame: &VideoFrame<'_>,
    ) -> Result<(), BackendFault> {
        let (width, height) = (self.width, self.height);
        let entry = self.entry(id)?;
        if !entry.started {
            trace!("X11VideoRender: stream {} not started, frame skipped", id);
            return Ok(());
        }
        let rect = entry.viewport.to_pixels(width, height);

        convert::blit_scaled(frame.buffer(), &mut self.canvas, width, rect);
        self.present(rect.x, rect.y, rect.width, rect.height)
    }
}

impl Drop for X11VideoRender {
    fn drop(&mut self) {
        info!("X11VideoRender: destroying renderer for window 0x{:x}", self.window);
        unsafe {
            if !self.gc.is_null() {
                xlib::XFreeGC(self.display, self.gc);
            }
            if !self.display.is_null() {
                xlib::XCloseDisplay(self.display);
            }
        }
    }
}
