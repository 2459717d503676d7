// Floating reminder: placement arithmetic, heartbeat scheduling and drag tracking
// Everything here is window-system agnostic; shell.rs wires it to real windows

pub mod drag;
pub mod geometry;
pub mod heartbeat;
