use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::dialect;
use crate::error::{GosqlfmtError, Result};
use crate::mode::Mode;

/// Config file names, in lookup order within one directory.
pub const CONFIG_FILE_NAMES: &[&str] = &[".gosqlfmt.toml", "gosqlfmt.toml"];

/// Settings a config file may carry. Absent keys keep the built-in defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub write: Option<bool>,
    pub indent: Option<usize>,
    pub newline: Option<bool>,
    pub dialect: Option<String>,
    pub exclude: Option<Vec<String>>,
}

/// Load gosqlfmt configuration. Searches `start` and its ancestors when no
/// config path is given; a missing explicit path is an error.
pub fn load_config(start: &Path, config_path: Option<&Path>) -> Result<Mode> {
    let mut mode = Mode::default();

    let config_file = match config_path {
        Some(path) => {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                return Err(GosqlfmtError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        None => find_config_file(start),
    };

    if let Some(path) = config_file {
        debug!(path = %path.display(), "loading config");
        let config = load_config_from_path(&path)?;
        apply_config(&mut mode, &config)?;
    }

    Ok(mode)
}

/// The nearest config file in `start` or one of its ancestors.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

fn load_config_from_path(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| GosqlfmtError::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Apply configuration values to a Mode.
fn apply_config(mode: &mut Mode, config: &FileConfig) -> Result<()> {
    if let Some(write) = config.write {
        mode.write = write;
    }
    if let Some(indent) = config.indent {
        mode.indent = indent;
    }
    if let Some(newline) = config.newline {
        mode.newline = newline;
    }
    if let Some(name) = &config.dialect {
        dialect::dialect_from_name(name)?;
        mode.dialect_name = name.clone();
    }
    if let Some(exclude) = &config.exclude {
        mode.exclude = exclude.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_config() {
        let mut mode = Mode::default();
        let config: FileConfig = toml::from_str(
            "write = true\nindent = 4\nnewline = false\ndialect = \"generic\"\nexclude = [\"*_gen.go\"]\n",
        )
        .unwrap();

        apply_config(&mut mode, &config).unwrap();
        assert!(mode.write);
        assert_eq!(mode.indent, 4);
        assert!(!mode.newline);
        assert_eq!(mode.dialect_name, "generic");
        assert_eq!(mode.exclude, vec!["*_gen.go"]);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut mode = Mode::default();
        let config: FileConfig = toml::from_str("indent = 8\n").unwrap();
        apply_config(&mut mode, &config).unwrap();
        assert_eq!(mode.indent, 8);
        assert!(mode.newline);
        assert_eq!(mode.dialect_name, "mysql");
    }

    #[test]
    fn test_unknown_config_key_error() {
        assert!(toml::from_str::<FileConfig>("line_length = 88\n").is_err());
    }

    #[test]
    fn test_negative_indent_rejected() {
        assert!(toml::from_str::<FileConfig>("indent = -1\n").is_err());
    }

    #[test]
    fn test_unknown_dialect_error() {
        let mut mode = Mode::default();
        let config = FileConfig {
            dialect: Some("oracle".to_string()),
            ..FileConfig::default()
        };
        assert!(apply_config(&mut mode, &config).is_err());
    }

    #[test]
    fn test_discovers_config_in_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(".gosqlfmt.toml"), "indent = 3\n").unwrap();

        let mode = load_config(&nested, None).unwrap();
        assert_eq!(mode.indent, 3);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }
}
