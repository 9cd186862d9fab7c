//! Terminal output: an in-place redrawn `Screen` and the `Renderer` thread
//! that is its only writer.

mod renderer;
mod screen;
mod truncate;

pub use renderer::{apply, Renderer};
pub use screen::Screen;
pub use truncate::{truncate_visible, visible_width};
