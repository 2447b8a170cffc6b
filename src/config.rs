//! Configuration for pulse.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PULSE_HOME, PULSE_QUEUE_FILE, PULSE_LOG_DIR,
//!    and the credential variables), optionally seeded from `.env`
//! 2. Config file (.pulse/config.yaml)
//! 3. Defaults (~/.pulse)
//!
//! Config file discovery:
//! - Searches current directory and parents for .pulse/config.yaml
//! - Paths in config file are relative to the .pulse/ directory
//!
//! Credentials are only ever read from the environment.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{TelegramConfig, XCredentials};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub content: ContentSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .pulse/)
    pub home: Option<String>,
    /// Queue file (relative to .pulse/)
    pub queue_file: Option<String>,
    /// Log directory (relative to .pulse/)
    pub log_dir: Option<String>,
}

/// Trigger cadences, in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub refill_minutes: u64,
    pub drain_minutes: u64,
    pub heartbeat_minutes: u64,
    /// Send a heartbeat notification every N heartbeats (0 = never)
    pub heartbeat_notify_every: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            refill_minutes: 5 * 60,
            drain_minutes: 20,
            heartbeat_minutes: 5,
            heartbeat_notify_every: 1,
        }
    }
}

impl ScheduleSettings {
    pub fn refill_every(&self) -> Duration {
        minutes(self.refill_minutes)
    }

    pub fn drain_every(&self) -> Duration {
        minutes(self.drain_minutes)
    }

    pub fn heartbeat_every(&self) -> Duration {
        minutes(self.heartbeat_minutes)
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.max(1) * 60)
}

/// Per-call deadlines, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub price_seconds: u64,
    pub notify_seconds: u64,
    pub image_prompt_seconds: u64,
    pub scout_seconds: u64,
    pub architect_seconds: u64,
    pub publish_seconds: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            price_seconds: 5,
            notify_seconds: 5,
            image_prompt_seconds: 15,
            scout_seconds: 30,
            architect_seconds: 60,
            publish_seconds: 30,
        }
    }
}

impl TimeoutSettings {
    pub fn price(&self) -> Duration {
        Duration::from_secs(self.price_seconds)
    }

    pub fn notify(&self) -> Duration {
        Duration::from_secs(self.notify_seconds)
    }

    pub fn image_prompt(&self) -> Duration {
        Duration::from_secs(self.image_prompt_seconds)
    }

    pub fn scout(&self) -> Duration {
        Duration::from_secs(self.scout_seconds)
    }

    pub fn architect(&self) -> Duration {
        Duration::from_secs(self.architect_seconds)
    }

    pub fn publish(&self) -> Duration {
        Duration::from_secs(self.publish_seconds)
    }
}

/// What the content is about and how it is shaped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Display name used in notification headers
    pub bot_name: String,
    /// Subject label, also the fallback topic for image prompts
    pub subject: String,
    /// Ticker shown next to prices
    pub ticker: String,
    /// Spot price pair queried from the price feed
    pub price_pair: String,
    /// Region the content is weighted toward
    pub focus_region: String,
    /// Share of topics and posts (percent) about the focus region
    pub focus_share: u8,
    pub topic_count: usize,
    pub post_count: usize,
    pub max_post_length: usize,
    /// How many recent topic names bias the next discovery call
    pub recent_themes: usize,
    /// Generative model name
    pub model: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            bot_name: "Bitcoin Pulse".to_string(),
            subject: "Bitcoin".to_string(),
            ticker: "BTC".to_string(),
            price_pair: "BTC-USD".to_string(),
            focus_region: "India".to_string(),
            focus_share: 70,
            topic_count: 10,
            post_count: 15,
            max_post_length: 600,
            recent_themes: 5,
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Static credentials, read from the environment only
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub telegram: Option<TelegramConfig>,
    pub x: Option<XCredentials>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gemini_api_key", &self.gemini_api_key.is_some())
            .field("telegram", &self.telegram.is_some())
            .field("x", &self.x.is_some())
            .finish()
    }
}

impl Credentials {
    /// Read credentials through an environment lookup.
    ///
    /// Empty values count as absent. Telegram and X are only present when
    /// every variable they need is set.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        let x = match (
            var("X_API_KEY"),
            var("X_API_SECRET"),
            var("X_ACCESS_TOKEN"),
            var("X_ACCESS_TOKEN_SECRET"),
        ) {
            (Some(api_key), Some(api_secret), Some(access_token), Some(access_secret)) => {
                Some(XCredentials {
                    api_key,
                    api_secret,
                    access_token,
                    access_secret,
                })
            }
            _ => None,
        };

        Self {
            gemini_api_key: var("GEMINI_API_KEY"),
            telegram,
            x,
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Durable queue file
    pub queue_file: PathBuf,
    /// Directory for daily log files
    pub log_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub schedule: ScheduleSettings,
    pub timeouts: TimeoutSettings,
    pub content: ContentSettings,
    pub credentials: Credentials,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".pulse").join("config.yaml");
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

/// Resolve a path that may be relative to the config file's directory
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

/// Combine an optional config file with environment overrides and defaults.
fn resolve(
    config: Option<(PathBuf, ConfigFile)>,
    default_home: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let credentials = Credentials::from_lookup(&env);

    let (config_file, file) = match config {
        Some((path, file)) => (Some(path), Some(file)),
        None => (None, None),
    };

    let pulse_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
    let from_file = |value: Option<&String>| value.map(|p| resolve_path(pulse_dir, p));

    let home = env("PULSE_HOME")
        .map(PathBuf::from)
        .or_else(|| from_file(paths.home.as_ref()))
        .unwrap_or(default_home);

    let queue_file = env("PULSE_QUEUE_FILE")
        .map(PathBuf::from)
        .or_else(|| from_file(paths.queue_file.as_ref()))
        .unwrap_or_else(|| home.join("queue.json"));

    let log_dir = env("PULSE_LOG_DIR")
        .map(PathBuf::from)
        .or_else(|| from_file(paths.log_dir.as_ref()))
        .unwrap_or_else(|| home.join("logs"));

    let (schedule, timeouts, content) = match file {
        Some(f) => (f.schedule, f.timeouts, f.content),
        None => Default::default(),
    };

    ResolvedConfig {
        home,
        queue_file,
        log_dir,
        config_file,
        schedule,
        timeouts,
        content,
        credentials,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".pulse");

    let config = match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    Ok(resolve(config, default_home, |key| std::env::var(key).ok()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
