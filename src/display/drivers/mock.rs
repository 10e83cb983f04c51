// src/display/drivers/mock.rs

use crate::display::driver::{
    AttributeMask, Colormap, DisplayConnection, DisplayConnector, EventMask, NativeWindowHandle,
    SurfaceEvent, VisualInfo, WindowRequest,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

const MOCK_VISUAL: VisualInfo = VisualInfo { id: 0x21, depth: 24 };
const FIRST_WINDOW_ID: u64 = 0x0040_0001;

/// Calls recorded by the mock windowing system, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Open,
    MatchVisual { depth: u32 },
    CreateColormap(Colormap),
    CreateWindow {
        width: u32,
        height: u32,
        depth: u32,
        mask: AttributeMask,
        event_mask: EventMask,
    },
    SetNames(String),
    SelectInput(EventMask),
    Map(NativeWindowHandle),
    DestroyWindow(NativeWindowHandle),
    FreeColormap(Colormap),
    Close,
}

/// How the mock window manager reacts to a map request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapBehaviour {
    /// MapNotify for the window is the next event.
    Immediate,
    /// Unrelated events (including another window's MapNotify) arrive first.
    AfterNoise,
    /// The window is never reported mapped.
    Never,
}

#[derive(Debug)]
struct MockDisplayState {
    calls: Vec<DisplayCall>,
    fail_open: bool,
    fail_visual: bool,
    fail_window: bool,
    map_behaviour: MapBehaviour,
    next_window: u64,
    live_windows: Vec<NativeWindowHandle>,
    open_connections: usize,
}

/// Scriptable stand-in for an X server.
///
/// Clones share state, so a test can keep one clone for assertions while the
/// renderer under test uses another.
#[derive(Debug, Clone)]
pub struct MockDisplayConnector {
    state: Arc<Mutex<MockDisplayState>>,
}

impl MockDisplayConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDisplayState {
                calls: Vec::new(),
                fail_open: false,
                fail_visual: false,
                fail_window: false,
                map_behaviour: MapBehaviour::Immediate,
                next_window: FIRST_WINDOW_ID,
                live_windows: Vec::new(),
                open_connections: 0,
            })),
        }
    }

    pub fn unreachable(self) -> Self {
        self.lock().fail_open = true;
        self
    }

    pub fn without_true_color(self) -> Self {
        self.lock().fail_visual = true;
        self
    }

    pub fn refusing_windows(self) -> Self {
        self.lock().fail_window = true;
        self
    }

    pub fn with_map_behaviour(self, behaviour: MapBehaviour) -> Self {
        self.lock().map_behaviour = behaviour;
        self
    }

    pub fn calls(&self) -> Vec<DisplayCall> {
        self.lock().calls.clone()
    }

    /// Windows created and not yet destroyed.
    pub fn live_windows(&self) -> Vec<NativeWindowHandle> {
        self.lock().live_windows.clone()
    }

    pub fn open_connections(&self) -> usize {
        self.lock().open_connections
    }

    fn lock(&self) -> MutexGuard<'_, MockDisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockDisplayConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayConnector for MockDisplayConnector {
    fn open(&self) -> Option<Box<dyn DisplayConnection>> {
        let mut state = self.lock();
        state.calls.push(DisplayCall::Open);
        if state.fail_open {
            return None;
        }
        state.open_connections += 1;
        Some(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            queue: VecDeque::new(),
            next_colormap: 1,
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockDisplayState>>,
    queue: VecDeque<SurfaceEvent>,
    next_colormap: Colormap,
}

impl MockConnection {
    fn lock(&self) -> MutexGuard<'_, MockDisplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplayConnection for MockConnection {
    fn default_screen(&self) -> i32 {
        0
    }

    fn match_true_color_visual(&mut self, _screen: i32, depth: u32) -> Option<VisualInfo> {
        let mut state = self.lock();
        state.calls.push(DisplayCall::MatchVisual { depth });
        if state.fail_visual || depth != MOCK_VISUAL.depth {
            None
        } else {
            Some(MOCK_VISUAL)
        }
    }

    fn create_colormap(&mut self, _screen: i32, _visual: VisualInfo) -> Colormap {
        let colormap = self.next_colormap;
        self.next_colormap += 1;
        self.lock().calls.push(DisplayCall::CreateColormap(colormap));
        colormap
    }

    fn free_colormap(&mut self, colormap: Colormap) {
        self.lock().calls.push(DisplayCall::FreeColormap(colormap));
    }

    fn create_window(
        &mut self,
        _screen: i32,
        request: &WindowRequest,
    ) -> Option<NativeWindowHandle> {
        let mut state = self.lock();
        state.calls.push(DisplayCall::CreateWindow {
            width: request.width,
            height: request.height,
            depth: request.visual.depth,
            mask: request.mask,
            event_mask: request.attributes.event_mask,
        });
        if state.fail_window {
            return None;
        }
        let window = NativeWindowHandle::from_raw(state.next_window);
        state.next_window += 1;
        state.live_windows.push(window);
        Some(window)
    }

    fn set_names(&mut self, _window: NativeWindowHandle, name: &str) {
        self.lock().calls.push(DisplayCall::SetNames(name.to_string()));
    }

    fn select_input(&mut self, _window: NativeWindowHandle, mask: EventMask) {
        self.lock().calls.push(DisplayCall::SelectInput(mask));
    }

    fn map_window(&mut self, window: NativeWindowHandle) {
        let behaviour = {
            let mut state = self.lock();
            state.calls.push(DisplayCall::Map(window));
            state.map_behaviour
        };
        match behaviour {
            MapBehaviour::Immediate => self.queue.push_back(SurfaceEvent::Mapped { window }),
            MapBehaviour::AfterNoise => {
                let stranger = NativeWindowHandle::from_raw(window.raw() + 0x1000);
                self.queue.extend([
                    SurfaceEvent::Configured { window },
                    SurfaceEvent::Mapped { window: stranger },
                    SurfaceEvent::Other,
                    SurfaceEvent::Exposed { window },
                    SurfaceEvent::Mapped { window },
                ]);
            }
            MapBehaviour::Never => self.queue.push_back(SurfaceEvent::Configured { window }),
        }
    }

    fn poll_event(&mut self, slice: Duration) -> Option<SurfaceEvent> {
        let event = self.queue.pop_front();
        if event.is_none() {
            // Nothing will ever arrive; behave like an idle server.
            thread::sleep(slice);
        }
        event
    }

    fn destroy_window(&mut self, window: NativeWindowHandle) {
        let mut state = self.lock();
        state.calls.push(DisplayCall::DestroyWindow(window));
        state.live_windows.retain(|live| *live != window);
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        let mut state = self.lock();
        state.calls.push(DisplayCall::Close);
        state.open_connections -= 1;
    }
}
