use std::path::Path;

use serde::de::Error as SerdeDeError;

use super::FilterbankLayerConfig;
use crate::error::ConfigError;

impl FilterbankLayerConfig {
    /// Flat TOML table with base and filterbank keys side by side.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a flat JSON object; omitted optional keys take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a layer config; `.json` files are read as JSON, anything else as TOML.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if is_json(path) {
            return serde_json::from_slice(&bytes).map_err(|source| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            });
        }
        let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: SerdeDeError::custom(source),
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as TOML, or JSON for `.json` paths.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let data = if is_json(path) {
            self.to_json_string()
                .map_err(|source| ConfigError::SerializeJson {
                    path: path.to_path_buf(),
                    source,
                })?
        } else {
            self.to_toml_string()
                .map_err(|source| ConfigError::SerializeToml {
                    path: path.to_path_buf(),
                    source,
                })?
        };
        std::fs::write(path, data).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
