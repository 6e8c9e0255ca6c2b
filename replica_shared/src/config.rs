//! Configuration system.
//!
//! Loads session configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration shared by every participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Upper bound on session membership.
    #[serde(default = "default_max_peers")]
    pub max_peers: u32,
}

fn default_max_peers() -> u32 {
    8
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_hz: 16,
            max_peers: default_max_peers(),
        }
    }
}

impl SessionConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
