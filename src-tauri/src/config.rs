// Environment configuration for the reminder app
// Resolves the data directory and the knobs that tests and power users override

use std::path::PathBuf;
use std::time::Duration;

/// Default URI opened when a task is completed
pub const DEFAULT_CELEBRATION_URL: &str = "raycast://extensions/raycast/raycast/confetti";

/// How the app moves from the blocking prompt to the floating reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandoffMode {
    /// Reconfigure activation policy and windows inside the running process
    #[default]
    InProcess,
    /// Spawn a fresh reminder instance, wait for it to confirm, then exit
    Relaunch,
}

impl HandoffMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-process" | "inprocess" => Some(Self::InProcess),
            "relaunch" => Some(Self::Relaunch),
            _ => None,
        }
    }
}

/// Configuration for data paths and behavior toggles
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding current-task.json, the reminder PID file and logs
    pub data_dir: PathBuf,
    pub handoff: HandoffMode,
    /// `None` disables the celebration side effect
    pub celebration_url: Option<String>,
    pub heartbeat_interval: Duration,
}

impl Config {
    /// Create configuration using default paths
    pub fn default_paths() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            handoff: HandoffMode::default(),
            celebration_url: Some(DEFAULT_CELEBRATION_URL.to_string()),
            heartbeat_interval: Duration::from_secs(30 * 60),
        }
    }

    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let (config, warnings) = Self::from_env_deferred();
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    /// Like `from_env`, but hand back the problems found instead of logging
    /// them, for callers that read configuration before logging is up.
    pub fn from_env_deferred() -> (Self, Vec<String>) {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default_paths();
        let mut warnings = Vec::new();

        if let Some(dir) = var("ONE_BIG_THING_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Some(mode) = var("ONE_BIG_THING_HANDOFF") {
            match HandoffMode::parse(&mode) {
                Some(mode) => config.handoff = mode,
                None => warnings.push(format!("Ignoring unknown ONE_BIG_THING_HANDOFF={:?}", mode)),
            }
        }

        if let Some(url) = var("ONE_BIG_THING_CELEBRATION_URL") {
            let url = url.trim();
            config.celebration_url = (!url.is_empty()).then(|| url.to_string());
        }

        if let Some(minutes) = var("ONE_BIG_THING_HEARTBEAT_MINUTES") {
            match minutes.trim().parse::<u64>() {
                Ok(m) if m > 0 => config.heartbeat_interval = Duration::from_secs(m * 60),
                _ => warnings.push(format!(
                    "Ignoring invalid ONE_BIG_THING_HEARTBEAT_MINUTES={:?}",
                    minutes
                )),
            }
        }

        (config, warnings)
    }

    /// Create configuration rooted at an explicit directory (tests, handoff children)
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default_paths()
        }
    }

    /// Per-user application data directory
    fn default_data_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir()
                .map(|h| h.join("Library/Application Support/OneBigThing"))
                .unwrap_or_else(|| PathBuf::from("/tmp/OneBigThing"))
        }

        #[cfg(not(target_os = "macos"))]
        {
            dirs::data_dir()
                .map(|d| d.join("one-big-thing"))
                .unwrap_or_else(|| PathBuf::from("/tmp/one-big-thing"))
        }
    }

    /// Get the current-task.json path
    pub fn task_file(&self) -> PathBuf {
        self.data_dir.join("current-task.json")
    }

    /// PID file of the reminder instance currently on screen
    pub fn pid_file(&self) -> PathBuf {
        self.data_dir.join("reminder.pid")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Ensure the data directory exists
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}
