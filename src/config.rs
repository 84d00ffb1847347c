//! Configuration for calibcat paths and external programs.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (`--catalog`, `--images-dir`, `--device`)
//! 2. Environment variables (CALIBCAT_CATALOG, CALIBCAT_IMAGES, CALIBCAT_DEVICE)
//! 3. Project config file (.calibcat/config.yaml, searched upward from the
//!    current directory), then the user config file
//!    (~/.config/calibcat/config.yaml)
//! 4. Defaults (./images.json, ./images)
//!
//! Relative paths in a project config file resolve against the project root,
//! the directory that contains `.calibcat/`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::camera::{default_device, default_grab_command};
use crate::adapters::viewer::default_view_command;
use crate::adapters::{CommandFrameSource, CommandRenderer, CommandSpec, CommandViewer};
use crate::library::{CatalogStore, ContentStore};

pub mod paths;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub renderer: Option<CommandSpec>,
    #[serde(default)]
    pub capture: Option<CaptureConfig>,
    #[serde(default)]
    pub viewer: Option<CommandSpec>,
    #[serde(default)]
    pub timeouts: Option<TimeoutsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Catalog file (relative to the project root)
    pub catalog: Option<String>,
    /// Artifact directory (relative to the project root)
    pub images: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureConfig {
    pub device: Option<String>,
    pub command: Option<CommandSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeoutsConfig {
    pub render_seconds: Option<u64>,
    pub capture_seconds: Option<u64>,
    pub view_seconds: Option<u64>,
}

/// Limits on external programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub render: Duration,
    pub capture: Duration,
    pub view: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            render: Duration::from_secs(60),
            capture: Duration::from_secs(10),
            view: Duration::from_secs(10),
        }
    }
}

/// Resolved configuration with concrete paths and commands
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Catalog file
    pub catalog: PathBuf,
    /// Directory for generated and captured images
    pub images: PathBuf,
    /// Board renderer, if one is configured
    pub renderer: Option<CommandSpec>,
    /// Video input device passed to the grab command
    pub capture_device: String,
    /// Single-frame grab command
    pub capture_command: CommandSpec,
    /// Image viewer command
    pub viewer: CommandSpec,
    pub timeouts: Timeouts,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        catalog: Option<PathBuf>,
        images: Option<PathBuf>,
        device: Option<String>,
    ) -> Self {
        if let Some(catalog) = catalog {
            self.catalog = catalog;
        }
        if let Some(images) = images {
            self.images = images;
        }
        if let Some(device) = device {
            self.capture_device = device;
        }
        self
    }

    pub fn catalog_store(&self) -> CatalogStore {
        CatalogStore::new(&self.catalog)
    }

    pub fn content_store(&self) -> ContentStore {
        ContentStore::new(&self.images)
    }

    pub fn renderer(&self) -> Result<CommandRenderer> {
        Ok(CommandRenderer::from_config(
            self.renderer.as_ref(),
            self.timeouts.render,
        )?)
    }

    pub fn frame_source(&self) -> CommandFrameSource {
        CommandFrameSource::new(
            self.capture_command.clone(),
            self.capture_device.clone(),
            self.timeouts.capture,
        )
    }

    pub fn viewer(&self) -> CommandViewer {
        CommandViewer::new(self.viewer.clone(), self.timeouts.view)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(paths::CONFIG_DIR).join(paths::CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: Option<&Path>, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    match base {
        Some(base) if !path.is_absolute() => base.join(path),
        _ => path,
    }
}

/// Project root for a config file: the parent of `.calibcat/`.
///
/// The user config file has no project root; its relative paths stay
/// relative to the working directory.
fn project_root(config_path: &Path) -> Option<&Path> {
    let config_dir = config_path.parent()?;
    if config_dir.file_name()? == paths::CONFIG_DIR {
        config_dir.parent()
    } else {
        None
    }
}

/// Combine a parsed config file with environment lookups
fn resolve(
    config_file: Option<(PathBuf, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let (config_path, config) = match config_file {
        Some((path, config)) => (Some(path), config),
        None => (None, ConfigFile::default()),
    };
    let base = config_path.as_deref().and_then(project_root);

    // Resolve catalog path
    let catalog = if let Some(env_catalog) = env("CALIBCAT_CATALOG") {
        PathBuf::from(env_catalog)
    } else {
        let name = config.paths.catalog.as_deref().unwrap_or(paths::CATALOG_FILE);
        resolve_path(base, name)
    };

    // Resolve images directory
    let images = if let Some(env_images) = env("CALIBCAT_IMAGES") {
        PathBuf::from(env_images)
    } else {
        let name = config.paths.images.as_deref().unwrap_or(paths::IMAGES_DIR);
        resolve_path(base, name)
    };

    let capture = config.capture.unwrap_or_default();
    let capture_device = env("CALIBCAT_DEVICE")
        .or(capture.device)
        .unwrap_or_else(default_device);
    let capture_command = capture.command.unwrap_or_else(default_grab_command);

    let defaults = Timeouts::default();
    let timeouts = match config.timeouts {
        Some(t) => Timeouts {
            render: t.render_seconds.map(Duration::from_secs).unwrap_or(defaults.render),
            capture: t.capture_seconds.map(Duration::from_secs).unwrap_or(defaults.capture),
            view: t.view_seconds.map(Duration::from_secs).unwrap_or(defaults.view),
        },
        None => defaults,
    };

    ResolvedConfig {
        catalog,
        images,
        renderer: config.renderer,
        capture_device,
        capture_command,
        viewer: config.viewer.unwrap_or_else(default_view_command),
        timeouts,
        config_file: config_path,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;

    let config_path = find_config_file(&cwd)
        .or_else(|| paths::user_config_file().filter(|p| p.exists()));

    let config_file = match config_path {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve(config_file, |key| std::env::var(key).ok()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env);

        assert_eq!(config.catalog, PathBuf::from("images.json"));
        assert_eq!(config.images, PathBuf::from("images"));
        assert!(config.renderer.is_none());
        assert_eq!(config.capture_device, default_device());
        assert_eq!(config.capture_command, default_grab_command());
        assert_eq!(config.timeouts, Timeouts::default());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".calibcat");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        std::fs::write(
            &config_path,
            r#"
version: "1"
paths:
  catalog: data/images.json
  images: data/images
renderer:
  program: python3
  args: ["draw.py", "{width}", "{length}", "{output}"]
capture:
  device: /dev/video2
timeouts:
  render_seconds: 120
"#,
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.paths.catalog.as_deref(), Some("data/images.json"));
        assert_eq!(config.renderer.as_ref().unwrap().program, "python3");

        let resolved = resolve(Some((config_path.clone(), config)), no_env);
        assert_eq!(resolved.catalog, temp.path().join("data/images.json"));
        assert_eq!(resolved.images, temp.path().join("data/images"));
        assert_eq!(resolved.capture_device, "/dev/video2");
        assert_eq!(resolved.timeouts.render, Duration::from_secs(120));
        assert_eq!(resolved.timeouts.capture, Timeouts::default().capture);
        assert_eq!(resolved.config_file, Some(config_path));
    }

    #[test]
    fn test_env_beats_config_file() {
        let config = ConfigFile {
            paths: PathsConfig {
                catalog: Some("from-file.json".to_string()),
                images: Some("from-file".to_string()),
            },
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            ("CALIBCAT_CATALOG", "/env/catalog.json"),
            ("CALIBCAT_DEVICE", "/dev/video9"),
        ]
        .into_iter()
        .collect();

        let resolved = resolve(
            Some((PathBuf::from("/proj/.calibcat/config.yaml"), config)),
            |key| env.get(key).map(|v| v.to_string()),
        );

        assert_eq!(resolved.catalog, PathBuf::from("/env/catalog.json"));
        assert_eq!(resolved.images, PathBuf::from("/proj/from-file"));
        assert_eq!(resolved.capture_device, "/dev/video9");
    }

    #[test]
    fn test_cli_overrides_win() {
        let resolved = resolve(None, |_| Some("/env/value".to_string())).with_overrides(
            Some(PathBuf::from("cli.json")),
            None,
            Some("cli-device".to_string()),
        );

        assert_eq!(resolved.catalog, PathBuf::from("cli.json"));
        assert_eq!(resolved.images, PathBuf::from("/env/value"));
        assert_eq!(resolved.capture_device, "cli-device");
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".calibcat");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.yaml"), "version: \"1\"\n").unwrap();

        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_config_file(&nested),
            Some(config_dir.join("config.yaml"))
        );
    }

    #[test]
    fn test_user_config_has_no_project_root() {
        assert_eq!(
            project_root(Path::new("/proj/.calibcat/config.yaml")),
            Some(Path::new("/proj"))
        );
        assert_eq!(
            project_root(Path::new("/home/u/.config/calibcat/config.yaml")),
            None
        );
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(Some(base.as_path()), "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(Some(base.as_path()), "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(resolve_path(None, "images"), PathBuf::from("images"));
    }

    #[test]
    fn test_renderer_requires_config() {
        let config = resolve(None, no_env);
        assert!(config.renderer().is_err());
    }
}
