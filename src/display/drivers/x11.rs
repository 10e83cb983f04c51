// src/display/drivers/x11.rs
#![allow(non_upper_case_globals)]

//! Xlib implementation of the windowing-system seam.
//!
//! - Connection via `XOpenDisplay` (honours `DISPLAY`)
//! - TrueColor visual lookup, colormap and window allocation
//! - Event polling on the connection fd, so waits can be bounded

use crate::display::driver::{
    AttributeMask, Colormap, DisplayConnection, DisplayConnector, EventMask, NativeWindowHandle,
    SurfaceEvent, VisualInfo, WindowRequest,
};
use libc::{c_char, c_int, c_long, c_uint, c_ulong};
use log::{debug, error, info, trace, warn};
use once_cell::sync::Lazy;
use std::ffi::CString;
use std::mem;
use std::ptr;
use std::time::Duration;
use x11::xlib;

static XLIB_THREADS: Lazy<bool> = Lazy::new(|| {
    let ok = unsafe { xlib::XInitThreads() } != 0;
    if ok {
        debug!("Xlib thread support initialized");
    } else {
        error!("XInitThreads failed");
    }
    ok
});

/// Enables Xlib's internal locking. Runs `XInitThreads` once per process and
/// must precede every `XOpenDisplay`. False if Xlib refused.
pub(crate) fn init_xlib_threads() -> bool {
    *XLIB_THREADS
}

/// Connects to the X server named by `DISPLAY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct X11DisplayConnector;

impl DisplayConnector for X11DisplayConnector {
    fn open(&self) -> Option<Box<dyn DisplayConnection>> {
        X11Connection::open().map(|connection| Box::new(connection) as Box<dyn DisplayConnection>)
    }
}

/// An Xlib display connection, closed on drop.
#[derive(Debug)]
pub struct X11Connection {
    display: *mut xlib::Display,
    // Last visual resolved by `match_true_color_visual`; carries the Visual pointer.
    matched: Option<xlib::XVisualInfo>,
}

// SAFETY: `open` initializes Xlib thread support before connecting, so Xlib
// locks its process-wide state. The connection itself is owned by exactly one
// `Surface` and only used through that owner.
unsafe impl Send for X11Connection {}

impl X11Connection {
    pub fn open() -> Option<Self> {
        if !init_xlib_threads() {
            return None;
        }
        // NULL: use the DISPLAY environment variable.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            warn!("XOpenDisplay failed. Check DISPLAY environment variable or X server status.");
            return None;
        }
        debug!("X display opened: {:p}", display);
        Some(Self {
            display,
            matched: None,
        })
    }

    fn visual_ptr(&self, screen: i32, visual: VisualInfo) -> *mut xlib::Visual {
        match self.matched {
            Some(info) if info.visualid == visual.id => info.visual,
            _ => {
                warn!(
                    "Visual 0x{:x} was not matched on this connection; using the screen default.",
                    visual.id
                );
                unsafe { xlib::XDefaultVisual(self.display, screen) }
            }
        }
    }

    fn connection_fd(&self) -> c_int {
        unsafe { xlib::XConnectionNumber(self.display) }
    }

    /// Blocks on the connection fd for at most `slice`. True if readable.
    fn wait_readable(&self, slice: Duration) -> bool {
        let mut fds = libc::pollfd {
            fd: self.connection_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = slice.as_millis().min(c_int::MAX as u128) as c_int;
        let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if ready < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                warn!("poll on X connection failed: {}", err);
            }
            return false;
        }
        ready > 0
    }
}

fn x_event_mask(mask: EventMask) -> c_long {
    let mut bits: c_long = 0;
    if mask.contains(EventMask::STRUCTURE_NOTIFY) {
        bits |= xlib::StructureNotifyMask;
    }
    if mask.contains(EventMask::EXPOSURE) {
        bits |= xlib::ExposureMask;
    }
    bits
}

fn x_attribute_mask(mask: AttributeMask) -> c_ulong {
    let mut bits: c_ulong = 0;
    if mask.contains(AttributeMask::BACK_PIXEL) {
        bits |= xlib::CWBackPixel;
    }
    if mask.contains(AttributeMask::BORDER_PIXEL) {
        bits |= xlib::CWBorderPixel;
    }
    if mask.contains(AttributeMask::COLORMAP) {
        bits |= xlib::CWColormap;
    }
    if mask.contains(AttributeMask::EVENT_MASK) {
        bits |= xlib::CWEventMask;
    }
    bits
}

fn convert_event(event: &xlib::XEvent) -> SurfaceEvent {
    // SAFETY: each union member is read only after checking the event type.
    unsafe {
        match event.get_type() {
            xlib::MapNotify => SurfaceEvent::Mapped {
                window: NativeWindowHandle::from_raw(event.map.event),
            },
            xlib::Expose => SurfaceEvent::Exposed {
                window: NativeWindowHandle::from_raw(event.expose.window),
            },
            xlib::ConfigureNotify => SurfaceEvent::Configured {
                window: NativeWindowHandle::from_raw(event.configure.window),
            },
            _ => SurfaceEvent::Other,
        }
    }
}

impl DisplayConnection for X11Connection {
    fn default_screen(&self) -> i32 {
        unsafe { xlib::XDefaultScreen(self.display) }
    }

    fn match_true_color_visual(&mut self, screen: i32, depth: u32) -> Option<VisualInfo> {
        let mut info: xlib::XVisualInfo = unsafe { mem::zeroed() };
        let status = unsafe {
            xlib::XMatchVisualInfo(
                self.display,
                screen,
                depth as c_int,
                xlib::TrueColor,
                &mut info,
            )
        };
        if status == 0 {
            return None;
        }
        self.matched = Some(info);
        Some(VisualInfo {
            id: info.visualid,
            depth: info.depth as u32,
        })
    }

    fn create_colormap(&mut self, screen: i32, visual: VisualInfo) -> Colormap {
        let visual_ptr = self.visual_ptr(screen, visual);
        unsafe {
            let root = xlib::XRootWindow(self.display, screen);
            xlib::XCreateColormap(self.display, root, visual_ptr, xlib::AllocNone)
        }
    }

    fn free_colormap(&mut self, colormap: Colormap) {
        if colormap != 0 {
            unsafe { xlib::XFreeColormap(self.display, colormap) };
        }
    }

    fn create_window(
        &mut self,
        screen: i32,
        request: &WindowRequest,
    ) -> Option<NativeWindowHandle> {
        let visual_ptr = self.visual_ptr(screen, request.visual);
        let window = unsafe {
            let root = xlib::XRootWindow(self.display, screen);
            let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
            attributes.background_pixel = request.attributes.background_pixel;
            attributes.border_pixel = request.attributes.border_pixel;
            attributes.colormap = request.attributes.colormap;
            attributes.event_mask = x_event_mask(request.attributes.event_mask);

            xlib::XCreateWindow(
                self.display,
                root,
                request.x,
                request.y,
                request.width as c_uint,
                request.height as c_uint,
                request.border_width as c_uint,
                request.visual.depth as c_int,
                xlib::InputOutput as c_uint,
                visual_ptr,
                x_attribute_mask(request.mask),
                &mut attributes,
            )
        };

        if window == 0 {
            None
        } else {
            Some(NativeWindowHandle::from_raw(window))
        }
    }

    fn set_names(&mut self, window: NativeWindowHandle, name: &str) {
        let name = match CString::new(name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Window name contains a NUL byte, leaving window unnamed: {}", e);
                return;
            }
        };
        unsafe {
            xlib::XStoreName(self.display, window.raw(), name.as_ptr() as *const c_char);
            xlib::XSetIconName(self.display, window.raw(), name.as_ptr() as *const c_char);
        }
    }

    fn select_input(&mut self, window: NativeWindowHandle, mask: EventMask) {
        unsafe { xlib::XSelectInput(self.display, window.raw(), x_event_mask(mask)) };
    }

    fn map_window(&mut self, window: NativeWindowHandle) {
        unsafe {
            xlib::XMapWindow(self.display, window.raw());
            xlib::XFlush(self.display);
        }
    }

    fn poll_event(&mut self, slice: Duration) -> Option<SurfaceEvent> {
        // XPending flushes the output buffer and reads whatever has arrived.
        if unsafe { xlib::XPending(self.display) } == 0 {
            if !self.wait_readable(slice) {
                return None;
            }
            if unsafe { xlib::XPending(self.display) } == 0 {
                return None;
            }
        }

        let mut event: xlib::XEvent = unsafe { mem::zeroed() };
        unsafe { xlib::XNextEvent(self.display, &mut event) };
        let converted = convert_event(&event);
        trace!("X event type {} -> {:?}", event.get_type(), converted);
        Some(converted)
    }

    fn destroy_window(&mut self, window: NativeWindowHandle) {
        if window.is_none() {
            return;
        }
        unsafe {
            xlib::XDestroyWindow(self.display, window.raw());
            xlib::XFlush(self.display);
        }
    }
}

impl Drop for X11Connection {
    fn drop(&mut self) {
        if !self.display.is_null() {
            info!("Closing X11 display connection: {:p}", self.display);
            unsafe { xlib::XCloseDisplay(self.display) };
            self.display = ptr::null_mut();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xlib_thread_support_initializes_once() {
        assert!(init_xlib_threads());
        assert!(init_xlib_threads());
    }

    #[test]
    fn attribute_mask_maps_to_cw_bits() {
        let all = x_attribute_mask(AttributeMask::all());
        assert_eq!(
            all,
            xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWColormap | xlib::CWEventMask
        );
        assert_eq!(x_attribute_mask(AttributeMask::empty()), 0);
    }

    #[test]
    fn event_mask_maps_to_x_masks() {
        assert_eq!(
            x_event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::EXPOSURE),
            xlib::StructureNotifyMask | xlib::ExposureMask
        );
        assert_eq!(
            x_event_mask(EventMask::STRUCTURE_NOTIFY),
            xlib::StructureNotifyMask
        );
    }

    #[test]
    fn map_notify_reports_the_event_window() {
        let mut event: xlib::XEvent = unsafe { mem::zeroed() };
        event.map = xlib::XMapEvent {
            type_: xlib::MapNotify,
            serial: 0,
            send_event: 0,
            display: ptr::null_mut(),
            event: 42,
            window: 42,
            override_redirect: 0,
        };
        assert_eq!(
            convert_event(&event),
            SurfaceEvent::Mapped {
                window: NativeWindowHandle::from_raw(42)
            }
        );
    }
}
