//! `apex.toml` project configuration.
//!
//! ```toml
//! [symbols]
//! folder = ".apex/symbols"
//! builtins = true
//! ```

use std::path::{Path, PathBuf};

use apex_lsp::ManagerConfig;
use serde::Deserialize;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "apex.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ApexConfig {
    pub symbols: SymbolsConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolsConfig {
    /// Folder mirroring parsed symbol tables. Relative paths resolve
    /// against the config file's directory.
    pub folder: Option<PathBuf>,
    pub builtins: bool,
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        SymbolsConfig {
            folder: None,
            builtins: true,
        }
    }
}

impl ApexConfig {
    /// Read `explicit` if given, else `apex.toml` in the working directory
    /// if it exists, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    return Ok(ApexConfig::default());
                }
                path
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        if let (Some(folder), Some(base)) = (&config.symbols.folder, path.parent()) {
            if folder.is_relative() {
                config.symbols.folder = Some(base.join(folder));
            }
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Manager settings with command-line overrides applied.
    pub fn manager_config(&self, folder: Option<PathBuf>, no_builtins: bool) -> ManagerConfig {
        ManagerConfig {
            symbols_folder: folder.or_else(|| self.symbols.folder.clone()),
            load_builtins: self.symbols.builtins && !no_builtins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ApexConfig::from_toml("").unwrap();
        assert_eq!(config, ApexConfig::default());
        assert!(config.symbols.builtins);
        assert!(config.symbols.folder.is_none());
    }

    #[test]
    fn symbols_section_is_read() {
        let config = ApexConfig::from_toml(
            r#"
[symbols]
folder = "syms"
builtins = false
"#,
        )
        .unwrap();
        assert_eq!(config.symbols.folder, Some(PathBuf::from("syms")));
        assert!(!config.symbols.builtins);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ApexConfig::from_toml("[symbols]\nfoldr = \"x\"\n").is_err());
    }

    #[test]
    fn flags_override_file() {
        let config = ApexConfig::from_toml("[symbols]\nfolder = \"a\"\n").unwrap();
        let manager = config.manager_config(Some(PathBuf::from("b")), true);
        assert_eq!(manager.symbols_folder, Some(PathBuf::from("b")));
        assert!(!manager.load_builtins);

        let manager = config.manager_config(None, false);
        assert_eq!(manager.symbols_folder, Some(PathBuf::from("a")));
        assert!(manager.load_builtins);
    }

    #[test]
    fn relative_folder_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apex.toml");
        std::fs::write(&path, "[symbols]\nfolder = \"syms\"\n").unwrap();
        let config = ApexConfig::load(Some(&path)).unwrap();
        assert_eq!(config.symbols.folder, Some(dir.path().join("syms")));
    }
}
