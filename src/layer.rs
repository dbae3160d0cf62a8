use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::{DimensionMismatch, LoadError};

/// One named, independently toggleable bitmap.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    pixels: RgbaImage,
    pub(crate) visible: bool,
}

impl Layer {
    /// Creates a new, visible [`Layer`].
    ///
    /// [`Layer`]: struct.Layer.html
    pub fn new<N: Into<String>>(name: N, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
            visible: true,
        }
    }

    /// Same as [`Layer::new`] but with an explicit starting visibility.
    ///
    /// [`Layer::new`]: struct.Layer.html#method.new
    pub fn with_visibility<N: Into<String>>(name: N, pixels: RgbaImage, visible: bool) -> Self {
        Self {
            name: name.into(),
            pixels,
            visible,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// The ordered set of layers, bottom first.
///
/// Membership and order are fixed once the store is built. Only the
/// visibility of individual layers changes afterwards.
#[derive(Debug)]
pub struct LayerStore {
    layers: Vec<Layer>,
    index: HashMap<String, usize>,
}

impl LayerStore {
    /// Loads every image in `dir` as a layer.
    ///
    /// Files are ordered by file name and named after their file stem.
    /// Hidden files and files without a known image extension are skipped.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, LoadError> {
        let dir = dir.as_ref();

        let read_dir_err = |source| LoadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            let file_type = entry.file_type().map_err(read_dir_err)?;
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            if is_hidden(&path) || ImageFormat::from_path(&path).is_err() {
                log::debug!("skipping non-image entry {:?}", path);
                continue;
            }
            paths.push(path);
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if paths.is_empty() {
            return Err(LoadError::Empty(dir.to_path_buf()));
        }

        let mut layers = Vec::with_capacity(paths.len());
        for path in paths {
            let name = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().into_owned(),
                None => continue,
            };

            log::info!("adding layer {} from {:?}", name, path);

            let pixels = image::open(&path)
                .map_err(|source| LoadError::Decode {
                    path: path.clone(),
                    source,
                })?
                .into_rgba8();

            layers.push(Layer::new(name, pixels));
        }

        Self::from_layers(layers)
    }

    /// Builds a store from layers that are already in memory.
    ///
    /// The first layer is the base. All layers must have unique names and the
    /// same dimensions as the base.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, LoadError> {
        let base_dimensions = match layers.first() {
            Some(base) => base.dimensions(),
            None => return Err(LoadError::NoLayers),
        };

        let mut index = HashMap::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            if layer.dimensions() != base_dimensions {
                return Err(DimensionMismatch {
                    layer: layer.name.clone(),
                    expected: base_dimensions,
                    found: layer.dimensions(),
                }
                .into());
            }

            if index.insert(layer.name.clone(), i).is_some() {
                return Err(LoadError::DuplicateName(layer.name.clone()));
            }
        }

        Ok(Self { layers, index })
    }

    /// All layers, bottom to top.
    pub fn ordered_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Shows or hides the layer called `name`.
    ///
    /// Returns `false` and changes nothing if there is no such layer.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.layers[i].visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&i| &self.layers[i])
    }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.get(name).map(Layer::is_visible)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(Layer::name)
    }

    /// Names of the layers whose visibility flag is set, bottom to top.
    ///
    /// The base layer is listed only if its own flag is set, even though the
    /// compositor always draws it.
    pub fn visible_names(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .map(Layer::name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always `false`: a store holds at least the base layer.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Width and height shared by every layer.
    pub fn dimensions(&self) -> (u32, u32) {
        self.layers[0].dimensions()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
