use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use serde::{Deserialize, Serialize};
use skirmish_core::{PlayerId, Unit, UnitId};

use crate::{Battle, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Serializable scenario schema used for YAML IO and validation.
pub struct ScenarioSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub width: i32,
    pub height: i32,
    /// Tick at which the game ends regardless of units left.
    pub time_limit: u64,
    /// Seed for damage rolls.
    #[serde(default)]
    pub seed: u64,
    pub units: Vec<UnitSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One unit placement with its combat stats.
pub struct UnitSpec {
    pub id: u64,
    /// `0` or `1`.
    pub player: u8,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    /// Defaults to `hp` if omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    pub min_damage: i32,
    pub max_damage: i32,
    #[serde(default = "default_range")]
    pub attack_range: i32,
    #[serde(default = "default_duration")]
    pub attack_time: u64,
    #[serde(default = "default_duration")]
    pub move_time: u64,
}

fn default_range() -> i32 {
    1
}

fn default_duration() -> u64 {
    1
}

impl UnitSpec {
    fn to_unit(&self) -> Unit {
        Unit {
            id: UnitId::from(self.id),
            player: PlayerId::from(self.player),
            x: self.x,
            y: self.y,
            hp: self.hp,
            max_hp: self.max_hp.unwrap_or(self.hp),
            min_damage: self.min_damage,
            max_damage: self.max_damage,
            attack_range: self.attack_range,
            attack_time: self.attack_time,
            move_time: self.move_time,
        }
    }

    fn validate_stats(&self) -> Result<(), SimError> {
        let invalid = |field: &'static str, reason: String| SimError::InvalidStats {
            id: self.id,
            field,
            reason,
        };

        if self.hp <= 0 {
            return Err(invalid("hp", format!("{} is not positive", self.hp)));
        }
        if let Some(max_hp) = self.max_hp {
            if max_hp < self.hp {
                return Err(invalid("max_hp", format!("{max_hp} is below hp {}", self.hp)));
            }
        }
        if self.min_damage < 0 || self.max_damage < self.min_damage {
            return Err(invalid(
                "damage",
                format!("[{}, {}] is not a valid range", self.min_damage, self.max_damage),
            ));
        }
        if self.attack_range < 1 {
            return Err(invalid(
                "attack_range",
                format!("{} is below 1", self.attack_range),
            ));
        }
        if self.attack_time == 0 || self.move_time == 0 {
            return Err(invalid(
                "duration",
                "attack_time and move_time must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl ScenarioSpec {
    /// Parse a scenario from YAML text without validating it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SimError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a scenario file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Write this scenario as YAML, replacing any existing file.
    pub fn to_yaml_path(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Validate map size, unit placement and stats.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(SimError::InvalidMapSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.time_limit == 0 {
            return Err(SimError::ZeroTimeLimit);
        }

        let mut ids = HashSet::with_capacity(self.units.len());
        let mut cells: HashMap<(i32, i32), u64> = HashMap::with_capacity(self.units.len());
        for unit in &self.units {
            if !ids.insert(unit.id) {
                return Err(SimError::DuplicateUnitId { id: unit.id });
            }
            if unit.player > 1 {
                return Err(SimError::UnknownPlayer {
                    id: unit.id,
                    player: unit.player,
                });
            }
            if unit.x < 0 || unit.y < 0 || unit.x >= self.width || unit.y >= self.height {
                return Err(SimError::UnitOutOfBounds {
                    id: unit.id,
                    x: unit.x,
                    y: unit.y,
                    width: self.width,
                    height: self.height,
                });
            }
            if let Some(first) = cells.insert((unit.x, unit.y), unit.id) {
                return Err(SimError::OverlappingUnits {
                    first,
                    second: unit.id,
                    x: unit.x,
                    y: unit.y,
                });
            }
            unit.validate_stats()?;
        }

        Ok(())
    }

    /// Validate and turn this scenario into a playable battle.
    pub fn build(&self) -> Result<Battle, SimError> {
        self.validate()?;
        let mut battle = Battle::new(self.width, self.height, self.time_limit, self.seed);
        for unit in &self.units {
            battle.place(unit.to_unit());
        }
        Ok(battle)
    }
}
