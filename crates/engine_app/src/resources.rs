//! Named texture lookup.
//!
//! Textures are registered under their file stem, so
//! `assets/textures/bomb_high_res.png` is fetched as `"bomb_high_res"`.
//! Pixel data is left to the surface backend; the manager only tracks what
//! exists and where.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

const TEXTURE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to read resource folder {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no texture named `{0}` has been loaded")]
    UnknownTexture(String),
}

/// A texture known to the resource manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct ResourceManager {
    textures: HashMap<String, Texture>,
}

impl ResourceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every image file directly inside `dir` under its stem and
    /// returns how many were added. Files with other extensions are skipped.
    /// When two files share a stem the one sorting last by path wins.
    pub fn preload_textures_from_folder(&mut self, dir: &Path) -> Result<usize, ResourceError> {
        let io_error = |source| ResourceError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && has_texture_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = 0usize;
        for path in paths {
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(path = %path.display(), "skipping texture with a non UTF-8 name");
                continue;
            };
            let name = name.to_owned();
            debug!(texture = %name, path = %path.display(), "texture registered");
            if let Some(previous) = self.insert_texture(Texture { name, path }) {
                warn!(
                    texture = %previous.name,
                    replaced = %previous.path.display(),
                    "texture name registered twice"
                );
            }
            loaded += 1;
        }

        info!(folder = %dir.display(), loaded, "textures preloaded");
        Ok(loaded)
    }

    /// Registers a texture directly, returning any texture it replaces.
    pub fn insert_texture(&mut self, texture: Texture) -> Option<Texture> {
        self.textures.insert(texture.name.clone(), texture)
    }

    pub fn texture(&self, name: &str) -> Result<&Texture, ResourceError> {
        self.textures
            .get(name)
            .ok_or_else(|| ResourceError::UnknownTexture(name.to_owned()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

fn has_texture_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TEXTURE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
