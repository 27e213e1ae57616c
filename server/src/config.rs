use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::engine::coordinator::RoomDefaults;

/// Top-level server configuration, loaded from rostrum.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub presence: PresenceSection,
    pub rooms: RoomsSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub web_address: String,
    /// Allowed browser origin for CORS. Localhost values allow any origin.
    pub public_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            web_address: "0.0.0.0:8080".into(),
            public_url: "http://localhost:8080".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:rostrum.db?mode=rwc".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct PresenceSection {
    /// Seconds without a heartbeat before a participant is considered gone.
    /// Must exceed the client ping interval by a safety margin (3x the
    /// expected 15s ping).
    pub heartbeat_timeout_secs: i64,
    /// How often the reaper sweeps for expired participants.
    pub reaper_interval_secs: u64,
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 45,
            reaper_interval_secs: 15,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct RoomsSection {
    pub max_debaters: i64,
    pub enable_spectators: bool,
    pub duration_secs: i64,
}

impl Default for RoomsSection {
    fn default() -> Self {
        Self {
            max_debaters: 2,
            enable_spectators: true,
            duration_secs: 1800,
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WEB_ADDRESS") {
            self.server.web_address = v;
        }
        if let Ok(v) = std::env::var("PUBLIC_URL") {
            self.server.public_url = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("HEARTBEAT_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.presence.heartbeat_timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("REAPER_INTERVAL_SECS")
            && let Ok(secs) = v.parse()
        {
            self.presence.reaper_interval_secs = secs;
        }
    }

    /// Convert the rooms section into coordinator defaults.
    pub fn room_defaults(&self) -> RoomDefaults {
        RoomDefaults {
            max_debaters: self.rooms.max_debaters,
            enable_spectators: self.rooms.enable_spectators,
            duration_secs: self.rooms.duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.web_address, "0.0.0.0:8080");
        assert_eq!(config.presence.heartbeat_timeout_secs, 45);
        assert_eq!(config.presence.reaper_interval_secs, 15);
        assert_eq!(config.rooms.max_debaters, 2);
        assert!(config.rooms.enable_spectators);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            "[presence]\nheartbeat_timeout_secs = 90\n",
        )
        .unwrap();
        assert_eq!(config.presence.heartbeat_timeout_secs, 90);
        assert_eq!(config.presence.reaper_interval_secs, 15);
        assert_eq!(config.database.url, "sqlite:rostrum.db?mode=rwc");
    }
}
