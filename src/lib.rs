//! Composite a stack of toggleable image layers into a live panel display.
//!
//! A [`Worker`] thread flips layers on and off through
//! [`VisibilityHandles`]. Each flip travels over a [`CommandChannel`] to the
//! [`RenderLoop`], which applies it on the display thread, recomposites the
//! [`LayerStore`] and hands the result to a [`DisplaySurface`].

mod application;
mod command;
mod compositor;
mod error;
mod handle;
mod layer;
mod render_loop;
mod worker;

pub mod settings;
pub mod surface;
pub mod work;

#[cfg(test)]
mod test_util;

pub use application::Application;
pub use command::{CommandChannel, CommandSender, VisibilityCommand};
pub use compositor::{compose, CompositeImage};
pub use error::{
    CompositeError, DimensionMismatch, LoadError, RenderError, ShutdownError, WorkerError,
};
pub use handle::{VisibilityHandle, VisibilityHandles};
pub use layer::{Layer, LayerStore};
pub use render_loop::{RenderLoop, RenderStats, Tick};
pub use settings::{Settings, WindowSettings};
pub use surface::{DisplaySurface, HeadlessSurface, ViewId, Wake};
pub use worker::{ErrorPolicy, Work, Worker, WorkerState};
