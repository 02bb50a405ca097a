//! Exploration report model, rendering and content dumps

pub mod dump;
pub mod models;
pub mod render;

pub use dump::ContentDump;
pub use models::*;
pub use render::{render, RenderOptions, Rendered};
