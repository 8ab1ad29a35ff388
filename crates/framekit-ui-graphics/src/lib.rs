//! Pure geometry data used by framekit frame decoration.
//!
//! This crate holds the integer box model types and the decoder for the
//! packed frame encoding that style sheets publish for legacy hosts.

mod frame_info;
mod geometry;

pub use frame_info::*;
pub use geometry::*;

pub mod prelude {
    pub use crate::frame_info::{FrameInfo, FrameOrientation, FrameShape};
    pub use crate::geometry::{CornerRadii, Sides};
}
