use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Restart and stall-detection parameters (`[restart]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Maximum number of automatic respawns per job before it is marked failed.
    pub restart_limit: u32,
    /// Number of consecutive slow samples tolerated before a restart.
    pub slow_threshold: u32,
    /// Throughput floor in bytes per second for plain (non-fragmented) transfers.
    pub slow_floor_bytes_per_sec: u64,
    /// Lower throughput floor for fragmented (DASH/HLS) transfers.
    pub fragmented_floor_bytes_per_sec: u64,
    /// Base delay in seconds before a respawn (doubles per restart).
    pub base_delay_secs: f64,
    /// Maximum delay in seconds before a respawn.
    pub max_delay_secs: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            restart_limit: 10,
            slow_threshold: 30,
            slow_floor_bytes_per_sec: 1024 * 1024,
            fragmented_floor_bytes_per_sec: 256 * 1024,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

/// How the supervisor observes the download engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Parse the engine's human-readable `--newline` output.
    #[default]
    Text,
    /// Ask the engine for JSON progress records via `--progress-template`.
    Structured,
}

/// External download engine invocation (`[engine]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable name or path of the download tool.
    pub program: String,
    /// Format preference expression passed as `--format`.
    pub format: String,
    /// Container used when merging component streams.
    pub merge_output_format: String,
    /// Default output path template; playlist jobs carry their own.
    pub output_template: String,
    /// Internal retry count handed to the engine (`--retries`).
    pub retries: u32,
    pub force_ipv4: bool,
    pub geo_bypass: bool,
    /// Extra arguments appended before the target.
    pub extra_args: Vec<String>,
    pub mode: EngineMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            format: [
                "bestvideo[height=720][fps=60]+bestaudio",
                "bestvideo[height=720][fps=30]+bestaudio",
                "bestvideo[height<=480]+bestaudio",
            ]
            .join("/"),
            merge_output_format: "mkv".to_string(),
            output_template: "%(uploader)s/%(title)s.%(ext)s".to_string(),
            retries: 99,
            force_ipv4: true,
            geo_bypass: true,
            extra_args: Vec::new(),
            mode: EngineMode::Text,
        }
    }
}

/// Terminal display parameters (`[display]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How long workers and the renderer block on their queues before re-checking for stop.
    pub poll_interval_ms: u64,
    /// Bound of the status message channel; senders block when it is full.
    pub status_channel_capacity: usize,
    /// Fixed terminal width; None = detect from the terminal.
    pub width: Option<usize>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            status_channel_capacity: 1024,
            width: None,
        }
    }
}

impl DisplayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Supervisor configuration loaded from `~/.config/dlvisor/config.toml`.
///
/// Every supervisor run receives its own copy; nothing here is global.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Number of concurrent workers. None = available parallelism minus two, floor of one.
    pub pool_size: Option<usize>,
    pub restart: RestartConfig,
    pub engine: EngineConfig,
    pub display: DisplayConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlvisor")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SupervisorConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SupervisorConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SupervisorConfig = toml::from_str(&data)?;
    Ok(cfg)
}

impl SupervisorConfig {
    /// Serialize in the same layout as the on-disk config file.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
