//! Server configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use channel_runtime::RuntimeConfig;

/// Configuration required to boot a channel server.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Directory holding `combat.toml` and `skills.ron`. Builtin content is
    /// used when unset.
    pub content_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub game_seed: Option<u64>,
    pub tick_interval_ms: Option<u64>,
    pub event_buffer: Option<usize>,
    pub command_buffer: Option<usize>,
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CONTENT_DIR` - Content data directory (default: builtin content)
    /// - `LOG_DIR` - Directory for the log file (default: stderr only)
    /// - `GAME_SEED` - Seed mixed into every combat roll (default: 0)
    /// - `TICK_INTERVAL_MS` - Region timer tick (default: 100)
    /// - `EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `COMMAND_BUFFER` - Command queue size per region (default: 32)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            content_dir: lookup("CONTENT_DIR").map(PathBuf::from),
            log_dir: lookup("LOG_DIR").map(PathBuf::from),
            game_seed: read_var(&lookup, "GAME_SEED"),
            tick_interval_ms: read_var::<u64>(&lookup, "TICK_INTERVAL_MS").map(|ms| ms.max(1)),
            event_buffer: read_var::<usize>(&lookup, "EVENT_BUFFER").map(|n| n.max(1)),
            command_buffer: read_var::<usize>(&lookup, "COMMAND_BUFFER").map(|n| n.max(1)),
        }
    }

    /// Applies the overrides on top of `base`.
    pub fn runtime_config(&self, base: RuntimeConfig) -> RuntimeConfig {
        let mut config = base;
        if let Some(seed) = self.game_seed {
            config.combat.game_seed = seed;
        }
        if let Some(ms) = self.tick_interval_ms {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = self.event_buffer {
            config.event_buffer_size = capacity;
        }
        if let Some(capacity) = self.command_buffer {
            config.command_buffer_size = capacity;
        }
        config
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}
