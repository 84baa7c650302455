//! Settings persistence and the game's window configuration.
//!
//! [`Settings`] is a flat key/value file in JSON. [`GameConfig`] maps its
//! window fields onto a handful of keys in that file.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use engine_math::{FloatRect, UVec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::surface::View;

/// Errors raised while reading or writing settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    /// A key holds a value of the wrong kind or out of range.
    #[error("setting `{key}` must be {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Text(String),
}

/// Ordered key/value settings backed by a JSON object on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from `path`. A missing file yields empty settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings to `path`, replacing any previous contents.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Returns the integer stored under `key`, or `None` if absent.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(SettingValue::Int(value)) => Ok(Some(*value)),
            Some(SettingValue::Text(_)) => Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                expected: "an integer",
            }),
        }
    }

    /// Returns the string stored under `key`, or `None` if absent.
    pub fn get_string(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(SettingValue::Text(value)) => Ok(Some(value)),
            Some(SettingValue::Int(_)) => Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                expected: "a string",
            }),
        }
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), SettingValue::Int(value));
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), SettingValue::Text(value.into()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Window dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMode {
    pub width: u32,
    pub height: u32,
}

impl VideoMode {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A mode with a zero dimension cannot back a window.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[must_use]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

const FULLSCREEN_WIDTH: &str = "fullscreen_width";
const FULLSCREEN_HEIGHT: &str = "fullscreen_height";
const WINDOWED_WIDTH: &str = "windowed_width";
const WINDOWED_HEIGHT: &str = "windowed_height";
const IS_FULLSCREEN: &str = "is_fullscreen";

/// Window configuration persisted in the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub fullscreen_mode: VideoMode,
    pub windowed_mode: VideoMode,
    pub is_fullscreen: bool,
    /// Fraction of the window the game world is drawn into.
    pub game_world_viewport: FloatRect,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fullscreen_mode: VideoMode::new(800, 600),
            windowed_mode: VideoMode::new(800, 600),
            is_fullscreen: true,
            game_world_viewport: FloatRect::new(0.125, 0.0, 0.75, 1.0),
        }
    }
}

impl GameConfig {
    /// Overwrites fields with the values found in `path`. Keys that are
    /// absent keep their current value. On error nothing is changed.
    pub fn read_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let settings = Settings::load(path)?;
        let mut loaded = self.clone();

        if let Some(width) = read_dimension(&settings, FULLSCREEN_WIDTH)? {
            loaded.fullscreen_mode.width = width;
        }
        if let Some(height) = read_dimension(&settings, FULLSCREEN_HEIGHT)? {
            loaded.fullscreen_mode.height = height;
        }
        if let Some(width) = read_dimension(&settings, WINDOWED_WIDTH)? {
            loaded.windowed_mode.width = width;
        }
        if let Some(height) = read_dimension(&settings, WINDOWED_HEIGHT)? {
            loaded.windowed_mode.height = height;
        }
        if let Some(flag) = settings.get_int(IS_FULLSCREEN)? {
            loaded.is_fullscreen = flag != 0;
        }

        *self = loaded;
        info!(
            path = %path.display(),
            fullscreen = self.is_fullscreen,
            windowed = ?self.windowed_mode,
            "game config loaded"
        );
        Ok(())
    }

    /// Stores the config fields in `path`, keeping any unrelated keys
    /// already in the file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let mut settings = Settings::load(path)?;
        settings.set_int(FULLSCREEN_WIDTH, self.fullscreen_mode.width.into());
        settings.set_int(FULLSCREEN_HEIGHT, self.fullscreen_mode.height.into());
        settings.set_int(WINDOWED_WIDTH, self.windowed_mode.width.into());
        settings.set_int(WINDOWED_HEIGHT, self.windowed_mode.height.into());
        settings.set_int(IS_FULLSCREEN, i64::from(self.is_fullscreen));
        settings.save(path)?;
        debug!(path = %path.display(), "game config written");
        Ok(())
    }

    /// The mode the window opens in.
    #[must_use]
    pub fn active_mode(&self) -> VideoMode {
        if self.is_fullscreen {
            self.fullscreen_mode
        } else {
            self.windowed_mode
        }
    }

    /// View that draws the game world into its viewport fraction of a
    /// window of `window_size`, one world unit per pixel.
    #[must_use]
    pub fn game_world_view(&self, window_size: UVec2) -> View {
        let area = self.game_world_viewport.scaled(window_size.as_vec2());
        View {
            center: area.size() * 0.5,
            size: area.size(),
            viewport: self.game_world_viewport,
        }
    }

    /// View covering the whole window in pixel coordinates.
    #[must_use]
    pub fn window_view(&self, window_size: UVec2) -> View {
        View::full_window(window_size)
    }
}

fn read_dimension(settings: &Settings, key: &str) -> Result<Option<u32>, ConfigError> {
    settings
        .get_int(key)?
        .map(|value| {
            u32::try_from(value).map_err(|_| ConfigError::InvalidValue {
                key: key.to_owned(),
                expected: "a non-negative integer that fits in 32 bits",
            })
        })
        .transpose()
}
