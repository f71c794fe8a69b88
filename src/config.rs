//! Configuration for footscan paths and capture geometry.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (FOOTSCAN_HOME)
//! 2. Config file (.footscan/config.yaml)
//! 3. Defaults (~/.footscan, engineering defaults for the capture rig)
//!
//! Config file discovery:
//! - Searches current directory and parents for .footscan/config.yaml
//! - Paths in config file are relative to the config file's parent directory
//!
//! The capture geometry, output naming and partition tables default to the
//! values the reconstruction engine was tuned against; override them only
//! when the rig itself changes.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Capture index assigned to every free-mode (sole) capture. Ring captures
/// use [0, ring_count); this sentinel is deliberately far outside that range.
pub const SOLE_CAPTURE_INDEX: i32 = -9999;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<std::result::Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub partition: PartitionTables,
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Storage root (relative to config file)
    pub home: Option<String>,
}

/// Geometry and matching parameters for a guided ring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Ring radius around the pivot, meters
    pub ring_radius: f32,

    /// Height of the ring above the pivot, meters
    pub capture_height: f32,

    /// Magnitude of the downward viewpoint tilt, radians
    pub capture_tilt: f32,

    /// Number of target poses on the ring
    pub ring_count: usize,

    /// Per-axis tolerance when matching a live pose to a target, meters
    pub position_tolerance: f32,

    /// Free captures expected before a sole session completes
    pub required_sole_captures: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            ring_radius: 0.3,
            capture_height: 0.5,
            capture_tilt: std::f32::consts::FRAC_PI_6,
            ring_count: 10,
            position_tolerance: 0.05,
            required_sole_captures: 3,
        }
    }
}

/// Filename prefixes for the three artifacts written per captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub image_prefix: String,
    pub depth_prefix: String,
    pub calibration_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            image_prefix: "original".to_string(),
            depth_prefix: "depth_logs".to_string(),
            calibration_prefix: "depth_calibration".to_string(),
        }
    }
}

/// Static index tables mapping ring capture indices to reconstruction
/// groups. These are camera-geometry engineering data; an index listed in
/// `shared` feeds both lateral groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionTables {
    pub lateral_a: Vec<i32>,
    pub lateral_b: Vec<i32>,
    pub shared: Vec<i32>,
}

impl Default for PartitionTables {
    fn default() -> Self {
        Self {
            lateral_a: vec![0, 1, 2, 3, 4],
            lateral_b: vec![6, 7, 8, 9],
            shared: vec![5],
        }
    }
}

/// External reconstruction engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Reconstruction binary (searched on PATH if not absolute)
    pub binary: String,

    /// Hard timeout for one reconstruction run, seconds
    pub timeout_seconds: u64,

    /// Pre-canned model served when reconstruction fails (degraded mode)
    pub fallback_model: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            binary: "foot-reconstruct".to_string(),
            timeout_seconds: 600,
            fallback_model: None,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the footscan storage root
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Capture geometry and matching settings
    pub capture: CaptureSettings,
    /// Artifact naming settings
    pub output: OutputSettings,
    /// Reconstruction group tables
    pub partition: PartitionTables,
    /// External engine settings
    pub engine: EngineSettings,
}

impl ResolvedConfig {
    /// Directory holding per-frame capture artifacts
    pub fn captures_dir(&self) -> PathBuf {
        self.home.join("captures")
    }

    /// Directory holding reconstructed models
    pub fn models_dir(&self) -> PathBuf {
        self.home.join("models")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".footscan").join("config.yaml");
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

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".footscan");

    let config_file = find_config_file();

    let (home, capture, output, partition, engine) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        let home = if let Ok(env_home) = std::env::var("FOOTSCAN_HOME") {
            PathBuf::from(env_home)
        } else if let Some(ref home_path) = config.paths.home {
            // home is relative to the .footscan/ directory
            let footscan_dir = config_path.parent().unwrap_or(Path::new("."));
            resolve_path(footscan_dir, home_path)
        } else {
            default_home.clone()
        };

        (
            home,
            config.capture,
            config.output,
            config.partition,
            config.engine,
        )
    } else {
        let home = std::env::var("FOOTSCAN_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home.clone());

        (
            home,
            CaptureSettings::default(),
            OutputSettings::default(),
            PartitionTables::default(),
            EngineSettings::default(),
        )
    };

    Ok(ResolvedConfig {
        home,
        config_file,
        capture,
        output,
        partition,
        engine,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

/// Get the footscan storage root.
pub fn footscan_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the captures directory ($FOOTSCAN_HOME/captures)
pub fn captures_dir() -> Result<PathBuf> {
    Ok(config()?.captures_dir())
}
