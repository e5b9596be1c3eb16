//! Headless GPU plumbing: device/queue context and offscreen render
//! targets.

pub mod render_context;
pub mod texture;

pub use render_context::{RenderContext, RenderContextError};
pub use texture::RenderTarget;
