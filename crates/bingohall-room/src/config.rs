//! Room configuration.

use std::time::Duration;

use bingohall_protocol::GameSettings;
use serde::{Deserialize, Serialize};

/// Per-room settings fixed when the room is spawned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Capacity of the room actor's command channel.
    pub channel_size: usize,

    /// How long a room with no connections stays alive before shutting
    /// down. Players who drop and come back within this window keep
    /// their cards.
    pub idle_grace: Duration,

    /// Shortest timeout a host may declare, in seconds.
    pub min_timeout_secs: u64,

    /// Longest timeout a host may declare, in seconds.
    pub max_timeout_secs: u64,

    /// Game settings every new session starts with. The host changes
    /// them per session from there.
    pub settings: GameSettings,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            idle_grace: Duration::from_secs(300),
            min_timeout_secs: 1,
            max_timeout_secs: 3600,
            settings: GameSettings::default(),
        }
    }
}

impl RoomConfig {
    /// Clamps a requested timeout length into the configured bounds.
    pub fn clamp_timeout(&self, seconds: u64) -> u64 {
        seconds.clamp(self.min_timeout_secs, self.max_timeout_secs.max(self.min_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.idle_grace, Duration::from_secs(300));
        assert_eq!(config.min_timeout_secs, 1);
        assert_eq!(config.max_timeout_secs, 3600);
        assert!(!config.settings.auto_call);
    }

    #[test]
    fn test_clamp_timeout() {
        let config = RoomConfig::default();
        assert_eq!(config.clamp_timeout(0), 1);
        assert_eq!(config.clamp_timeout(90), 90);
        assert_eq!(config.clamp_timeout(86_400), 3600);
    }
}
