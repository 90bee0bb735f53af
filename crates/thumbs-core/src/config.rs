use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output widths applied to every image when none are configured.
pub const DEFAULT_TARGET_WIDTHS: [u32; 11] = [32, 64, 200, 400, 500, 600, 700, 800, 1100, 1500, 2000];

/// Fetch workers. Far above core count: the stage is I/O-bound.
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 26;

/// Transfer limits for the fetch stage (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Seconds allowed for TCP/TLS connect.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below 1 KiB/s for this many seconds.
    pub low_speed_time_secs: u64,
    /// Hard ceiling for one transfer in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_time_secs: 60,
            timeout_secs: 600,
        }
    }
}

/// Global configuration loaded from `~/.config/thumbs/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbsConfig {
    /// Base directory holding `incoming/` and `outgoing/`. None = current directory.
    pub home_dir: Option<PathBuf>,
    /// Widths in pixels of the variants produced for every image, in order.
    pub target_widths: Vec<u32>,
    /// Threads in the fetch pool.
    pub download_workers: usize,
    /// Threads in the resize pool. None = one per available core.
    pub resize_workers: Option<usize>,
    /// Optional deadline for a whole run, in seconds.
    pub run_timeout_secs: Option<u64>,
    pub fetch: FetchConfig,
}

impl Default for ThumbsConfig {
    fn default() -> Self {
        Self {
            home_dir: None,
            target_widths: DEFAULT_TARGET_WIDTHS.to_vec(),
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
            resize_workers: None,
            run_timeout_secs: None,
            fetch: FetchConfig::default(),
        }
    }
}

impl ThumbsConfig {
    /// Rejects settings no run could work with.
    pub fn validate(&self) -> Result<()> {
        if self.target_widths.is_empty() {
            anyhow::bail!("target_widths must not be empty");
        }
        if self.target_widths.contains(&0) {
            anyhow::bail!("target_widths must all be positive");
        }
        if self.download_workers == 0 {
            anyhow::bail!("download_workers must be at least 1");
        }
        if self.resize_workers == Some(0) {
            anyhow::bail!("resize_workers must be at least 1");
        }
        Ok(())
    }

    /// Serialize as it would appear in config.toml.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resize pool size: the configured value, else the available parallelism.
    pub fn effective_resize_workers(&self) -> usize {
        self.resize_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("thumbs")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ThumbsConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ThumbsConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate a config file at an explicit path.
pub fn load_from_path(path: &Path) -> Result<ThumbsConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ThumbsConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
