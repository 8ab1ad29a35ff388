//! Widget catalog

pub mod button;
pub mod component;
pub mod container;
pub mod file_button;
pub mod header;
pub mod panel;

pub use button::*;
pub use component::*;
pub use container::*;
pub use file_button::*;
pub use header::*;
pub use panel::*;

#[cfg(test)]
#[path = "tests/widgets_tests.rs"]
mod tests;
