//! Scene files and headless rendering
//!
//! A scene describes device state plus a list of draw calls in RON. Rendering
//! one drives a fresh `Device` through its public operations.

mod description;
mod loader;
mod render;

pub use description::*;
pub use loader::*;
pub use render::*;
