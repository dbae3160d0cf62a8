use std::io;
use std::path::PathBuf;
use std::time::Duration;

use image::ImageError;
use thiserror::Error;

/// A layer whose pixel dimensions differ from the base layer's.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "layer `{layer}` is {}x{} but the base layer is {}x{}",
    .found.0, .found.1, .expected.0, .expected.1
)]
pub struct DimensionMismatch {
    pub layer: String,
    pub expected: (u32, u32),
    pub found: (u32, u32),
}

/// Failure to build a [`LayerStore`].
///
/// [`LayerStore`]: struct.LayerStore.html
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read layer directory {path:?}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not decode layer image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("layer directory {0:?} contains no usable images")]
    Empty(PathBuf),
    #[error("no layers were given")]
    NoLayers,
    #[error("more than one layer is named `{0}`")]
    DuplicateName(String),
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    #[error("there are no layers to composite")]
    NoLayers,
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),
}

/// Failure inside the render loop. Both variants are fatal.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("composite failed")]
    Composite(#[from] CompositeError),
    #[error("display surface failed")]
    Surface(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker `{0}` was already started")]
    AlreadyStarted(String),
    #[error("could not spawn worker thread `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("worker did not exit within {0:?}")]
    Timeout(Duration),
    #[error("worker thread panicked")]
    Panicked,
    #[error("worker stopped after its work failed")]
    WorkFailed(#[source] anyhow::Error),
}
