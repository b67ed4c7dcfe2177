//! Frame timing.
//!
//! One `FrameClock` per render loop; `tick()` once per redraw.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
