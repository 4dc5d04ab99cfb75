//! Configuration file support
//!
//! Config file location: `~/.config/panesync/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [diff]
//! algorithm = "histogram"
//! word_level = true
//!
//! [scroll]
//! wheel_multiplier = 4.0
//!
//! [view]
//! line_height = 16.0
//! char_width = 8.0
//! middle_area_width = 42.0
//! button_size = 16.0
//! ```

use crate::diff::{DiffAlgorithm, DiffEngine};
use crate::geometry::ViewMetrics;
use crate::scroll::DEFAULT_WHEEL_MULTIPLIER;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Line and word diff settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub algorithm: DiffAlgorithm,
    /// Compute word highlights inside hunks
    pub word_level: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            algorithm: DiffAlgorithm::default(),
            word_level: true,
        }
    }
}

/// Scroll synchronization settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Step increments per wheel notch
    pub wheel_multiplier: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            wheel_multiplier: DEFAULT_WHEEL_MULTIPLIER,
        }
    }
}

/// Pane and middle-area geometry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub line_height: f64,
    pub char_width: f64,
    /// Width of the area between two panes holding connectors and buttons
    pub middle_area_width: f64,
    pub button_size: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        let metrics = ViewMetrics::default();
        Self {
            line_height: metrics.line_height,
            char_width: metrics.char_width,
            middle_area_width: 42.0,
            button_size: 16.0,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub diff: DiffConfig,
    pub scroll: ScrollConfig,
    pub view: ViewConfig,
}

/// First `panesync/config.toml` that exists under one of `roots`
fn find_in(roots: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    roots
        .into_iter()
        .map(|root| root.join("panesync").join("config.toml"))
        .find(|candidate| candidate.is_file())
}

impl Config {
    /// Read `panesync/config.toml` from the first config root that has one:
    /// `$XDG_CONFIG_HOME`, then `~/.config`, then the platform config dir.
    ///
    /// A missing file gives the defaults. An unreadable or malformed file is
    /// logged and also gives the defaults.
    pub fn load() -> Self {
        let roots = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .into_iter()
            .chain(dirs::home_dir().map(|home| home.join(".config")))
            .chain(dirs::config_dir());
        let Some(path) = find_in(roots) else {
            return Self::default();
        };
        Self::from_path(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            Self::default()
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn metrics(&self) -> ViewMetrics {
        ViewMetrics {
            line_height: self.view.line_height,
            char_width: self.view.char_width,
        }
    }

    pub fn engine(&self) -> DiffEngine {
        DiffEngine::new().with_algorithm(self.diff.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.diff.algorithm, DiffAlgorithm::Histogram);
        assert!(config.diff.word_level);
        assert_eq!(config.scroll.wheel_multiplier, 4.0);
        assert_eq!(config.view.middle_area_width, 42.0);
        assert_eq!(config.metrics(), ViewMetrics::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [diff]
            algorithm = "myers-minimal"

            [view]
            line_height = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.engine().algorithm(), DiffAlgorithm::MyersMinimal);
        assert!(config.diff.word_level);
        assert_eq!(config.metrics().line_height, 20.0);
        assert_eq!(config.metrics().char_width, 8.0);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let err = Config::from_toml_str("[diff]\nalgorithm = \"patience\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_path(Path::new("/nonexistent/panesync/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_lookup_takes_first_root_with_a_file() {
        let base = std::env::temp_dir().join(format!("panesync-lookup-{}", std::process::id()));
        let empty = base.join("empty");
        let second = base.join("second");
        let third = base.join("third");
        for root in [&second, &third] {
            std::fs::create_dir_all(root.join("panesync")).unwrap();
            std::fs::write(root.join("panesync").join("config.toml"), "").unwrap();
        }

        let found = find_in([empty.clone(), second.clone(), third]);
        assert_eq!(found, Some(second.join("panesync").join("config.toml")));
        assert_eq!(find_in([empty]), None);

        std::fs::remove_dir_all(&base).unwrap();
    }
}
