//! Orrery application: window, event loop, frame loop and keyboard controls.

pub mod controls;
pub mod frame_loop;
pub mod platform;
pub mod window;
