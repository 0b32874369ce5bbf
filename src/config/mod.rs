//! Configuration loading from TOML files.
//!
//! A single TOML document carries the rarity table, the pity curve, battle
//! settings and the card catalog grouped by series:
//!
//! ```toml
//! [rarity.common]
//! weight = 60.0
//!
//! [pity]
//! hard_pity = 90
//!
//! [battle]
//! max_turns = 30
//!
//! [[series]]
//! name = "Starter"
//!
//! [[series.cards]]
//! id = "slime"
//! name = "Slime"
//! rarity = "common"
//! attack = 10
//! defense = 2
//! health = 40
//! speed = 5
//! energy = 1
//! ability = { id = "ooze" }
//! ```
//!
//! `GameData::from_config` validates everything up front; a broken catalog
//! is rejected as a whole and never partially served.

mod settings;

pub use settings::BattleSettings;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::{CardCatalog, CardDefinition, PityCurve, Rarity, RarityTable, TierWeight};
use crate::error::ConfigError;

/// Catalog bundled with the crate.
const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.toml");

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Raw, unvalidated configuration as it appears in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameDataConfig {
    #[serde(default)]
    pub rarity: RarityConfig,
    #[serde(default)]
    pub pity: PityCurve,
    #[serde(default)]
    pub battle: BattleSettings,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

/// The `[rarity.<tier>]` tables. Unknown tier names are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RarityConfig {
    pub common: Option<TierWeight>,
    pub uncommon: Option<TierWeight>,
    pub rare: Option<TierWeight>,
    pub epic: Option<TierWeight>,
    pub legendary: Option<TierWeight>,
    pub ultimate: Option<TierWeight>,
}

impl RarityConfig {
    fn into_entries(self) -> [(Rarity, Option<TierWeight>); Rarity::COUNT] {
        [
            (Rarity::Common, self.common),
            (Rarity::Uncommon, self.uncommon),
            (Rarity::Rare, self.rare),
            (Rarity::Epic, self.epic),
            (Rarity::Legendary, self.legendary),
            (Rarity::Ultimate, self.ultimate),
        ]
    }
}

/// One `[[series]]` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub name: String,
    #[serde(default)]
    pub cards: Vec<CardDefinition>,
}

/// Validated, immutable game data shared by every component.
#[derive(Debug, Clone)]
pub struct GameData {
    pub catalog: CardCatalog,
    pub rarity: RarityTable,
    pub battle: BattleSettings,
}

impl GameData {
    /// Assemble game data from already-built parts, validating them.
    pub fn new(
        catalog: CardCatalog,
        rarity: RarityTable,
        battle: BattleSettings,
    ) -> Result<Self, ConfigError> {
        let data = Self {
            catalog,
            rarity,
            battle,
        };
        data.validate()?;
        Ok(data)
    }

    /// Validate a raw config into game data.
    pub fn from_config(config: GameDataConfig) -> Result<Self, ConfigError> {
        let mut rarity = RarityTable::empty(config.pity);
        for (tier, weight) in config.rarity.into_entries() {
            if let Some(weight) = weight {
                rarity.set(tier, weight);
            }
        }

        let mut catalog = CardCatalog::new();
        for series in config.series {
            for mut card in series.cards {
                card.series.clone_from(&series.name);
                catalog.register(card)?;
            }
        }

        let data = Self::new(catalog, rarity, config.battle)?;
        info!(
            cards = data.catalog.len(),
            series = data.catalog.series_names().count(),
            "game data loaded"
        );
        Ok(data)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::from_config(parse_toml(content)?)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(load_toml(path)?)
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Check the rarity table, battle settings and catalog agree.
    ///
    /// Fields are public, so consumers taking a `GameData` built elsewhere
    /// call this again rather than trusting the constructor ran.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rarity.validate()?;
        self.battle.validate()?;

        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for tier in Rarity::ALL {
            if self.catalog.tier_len(tier) > 0 && self.rarity.get(tier).is_none() {
                return Err(ConfigError::MissingWeight(tier));
            }
        }
        for card in self.catalog.iter() {
            if card.id.as_str().trim().is_empty() {
                return Err(ConfigError::Validation("card id must not be blank".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;

    const SMALL: &str = r#"
        [rarity.common]
        weight = 80.0
        [rarity.rare]
        weight = 20.0
        glow = 0.5
        color = [0, 0, 255]

        [pity]
        soft_pity_start = 5
        hard_pity = 10

        [battle]
        max_turns = 8

        [[series]]
        name = "Alpha"

        [[series.cards]]
        id = "a1"
        name = "A One"
        rarity = "common"
        attack = 10
        defense = 5
        health = 50
        speed = 3
        energy = 1
        ability = { id = "poke" }

        [[series]]
        name = "Beta"

        [[series.cards]]
        id = "b1"
        name = "B One"
        rarity = "rare"
        attack = 30
        defense = 10
        health = 80
        speed = 7
        energy = 2
        ability = { id = "blast", damage = 50, cooldown = 2 }
    "#;

    #[test]
    fn test_parse_small_config() {
        let data = GameData::from_toml_str(SMALL).unwrap();

        assert_eq!(data.catalog.len(), 2);
        assert_eq!(data.rarity.base_weight(Rarity::Common), 80.0);
        assert_eq!(data.rarity.get(Rarity::Rare).unwrap().color, [0, 0, 255]);
        assert_eq!(data.rarity.pity().hard_pity, 10);
        assert_eq!(data.battle.max_turns, 8);

        let b1 = data.catalog.get(&CardId::new("b1")).unwrap();
        assert_eq!(b1.series, "Beta");
        assert_eq!(b1.ability.cooldown, 2);
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let data = GameData::builtin().unwrap();
        assert!(data.catalog.len() >= 12);
        for tier in Rarity::ALL {
            assert!(data.catalog.tier_len(tier) > 0, "no {} cards", tier);
        }
    }

    #[test]
    fn test_zero_health_card_loads() {
        let config = SMALL.replace("health = 50", "health = 0");
        let data = GameData::from_toml_str(&config).unwrap();
        assert_eq!(data.catalog.get(&CardId::new("a1")).unwrap().stats.health, 0);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = GameData::from_toml_str("[rarity.common]\nweight = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCatalog));
    }

    #[test]
    fn test_missing_weight_rejected() {
        let config = SMALL.replace("[rarity.rare]\n        weight = 20.0", "");
        let err = GameData::from_toml_str(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingWeight(Rarity::Rare)));
    }

    #[test]
    fn test_duplicate_card_rejected() {
        let config = SMALL.replace("id = \"b1\"", "id = \"a1\"");
        let err = GameData::from_toml_str(&config).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCard(_)));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let config = format!("{}\n[rarity.mythic]\nweight = 1.0\n", SMALL);
        assert!(GameData::from_toml_str(&config).is_err());
    }

    #[test]
    fn test_parse_error_reported() {
        let err = GameData::from_toml_str("[rarity.common\nweight = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GameData::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
