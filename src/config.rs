use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_URL;
use crate::battle::controller::BattlePacing;
use crate::errors::ConfigError;

/// Runtime configuration for the arena core.
///
/// Defaults match the production PokeAPI endpoint and battle pacing; a TOML
/// file can override any section.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    pub api: ApiConfig,
    pub battle: BattleConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the creature catalog, without a trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BattleConfig {
    /// Starting value of the pre-battle countdown
    pub countdown_start: u32,
    /// Milliseconds between countdown ticks
    pub countdown_tick_ms: u64,
    /// Milliseconds between the battle bell and the revealed outcome
    pub engage_delay_ms: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 10,
            },
            battle: BattleConfig {
                countdown_start: 3,
                countdown_tick_ms: 1000,
                engage_delay_ms: 1700,
            },
        }
    }
}

impl ArenaConfig {
    /// Parses a full configuration document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        Self::from_toml_str(&raw)
    }

    /// Projects the battle section into controller pacing.
    pub fn pacing(&self) -> BattlePacing {
        BattlePacing {
            countdown_start: self.battle.countdown_start,
            tick: Duration::from_millis(self.battle.countdown_tick_ms),
            engage_delay: Duration::from_millis(self.battle.engage_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_uses_production_pacing() {
        let config = ArenaConfig::default();
        assert_eq!(config.api.base_url, "https://pokeapi.co/api/v2/pokemon");
        assert_eq!(config.battle.countdown_start, 3);
        assert_eq!(config.battle.countdown_tick_ms, 1000);
        assert_eq!(config.battle.engage_delay_ms, 1700);
    }

    #[test]
    fn parses_full_toml_document() {
        let raw = r#"
            [api]
            base_url = "http://localhost:9000/pokemon"
            timeout_secs = 2

            [battle]
            countdown_start = 5
            countdown_tick_ms = 50
            engage_delay_ms = 80
        "#;
        let config = ArenaConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.api.timeout_secs, 2);
        assert_eq!(config.battle.countdown_start, 5);

        let pacing = config.pacing();
        assert_eq!(pacing.tick, Duration::from_millis(50));
        assert_eq!(pacing.engage_delay, Duration::from_millis(80));
    }

    #[test]
    fn rejects_malformed_document() {
        let err = ArenaConfig::from_toml_str("[api]\nbase_url = 12").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
