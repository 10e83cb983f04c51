// src/display/drivers/mod.rs

pub mod mock;
pub mod x11;

pub use mock::{DisplayCall, MapBehaviour, MockDisplayConnector};
pub use x11::X11DisplayConnector;
