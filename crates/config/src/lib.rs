//! Layered configuration: built-in defaults, an optional TOML file, and
//! `REVMAP_`-prefixed environment variables, each overriding the last.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The standard snapshot platforms polled when none are configured.
pub const DEFAULT_PLATFORMS: [&str; 5] = ["Linux_x64", "Mac", "Mac_Arm", "Win", "Win_x64"];

/// File picked up from the working directory when no `--config` is given.
const DEFAULT_CONFIG_FILE: &str = "revmap.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Platform prefixes to poll, in sync order.
    pub platforms: Vec<String>,
    /// SQLite database location; created on first run.
    pub database_path: PathBuf,
    /// Export document location, fully overwritten on each run.
    pub export_path: PathBuf,
    /// Object-storage bucket holding the snapshot archive.
    pub bucket: String,
    /// Base URL of the object-storage JSON API.
    pub storage_base_url: String,
    /// Base URL of the milestone feed.
    pub dash_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "revmap")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"));
        Self {
            platforms: DEFAULT_PLATFORMS.iter().map(|platform| platform.to_string()).collect(),
            database_path: data_dir.join("chromium-data.sqlite"),
            export_path: data_dir.join("chromium-data.json"),
            bucket: "chromium-browser-snapshots".to_string(),
            storage_base_url: "https://www.googleapis.com".to_string(),
            dash_base_url: "https://chromiumdash.appspot.com".to_string(),
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicitly given file must exist; the default `revmap.toml` is
    /// only merged when present, so a bare invocation runs on defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let toml = match file {
            Some(path) => Toml::file_exact(path),
            None => Toml::file(DEFAULT_CONFIG_FILE),
        };
        Figment::from(Serialized::defaults(Self::default()))
            .merge(toml)
            .merge(Env::prefixed("REVMAP_"))
            .extract()
            .or_raise(|| ErrorKind::Load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.platforms.len(), 5);
        assert_eq!(config.bucket, "chromium-browser-snapshots");
        assert!(config.database_path.ends_with("chromium-data.sqlite"));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "revmap.toml",
                r#"
                    platforms = ["Win_x64"]
                    bucket = "my-mirror"
                "#,
            )?;
            let config = Config::load(None).unwrap();
            assert_eq!(config.platforms, vec!["Win_x64".to_string()]);
            assert_eq!(config.bucket, "my-mirror");
            // Untouched keys keep their defaults.
            assert_eq!(config.dash_base_url, "https://chromiumdash.appspot.com");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("revmap.toml", r#"bucket = "from-file""#)?;
            jail.set_env("REVMAP_BUCKET", "from-env");
            let config = Config::load(None).unwrap();
            assert_eq!(config.bucket, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        figment::Jail::expect_with(|_jail| {
            assert!(Config::load(Some(Path::new("nope.toml"))).is_err());
            Ok(())
        });
    }
}
