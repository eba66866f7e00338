use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a unit. Ids survive snapshot cloning, unit values do not.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u64);

impl UnitId {
    /// Return the raw numeric id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UnitId {
    fn from(value: u64) -> Self {
        UnitId(value)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the two sides of a skirmish.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const ZERO: PlayerId = PlayerId(0);
    pub const ONE: PlayerId = PlayerId(1);

    /// Index of the player, `0` or `1` for the two sides.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// The side playing against this one.
    pub fn opponent(&self) -> PlayerId {
        PlayerId(1 - self.0.min(1))
    }
}

impl From<u8> for PlayerId {
    fn from(value: u8) -> Self {
        PlayerId(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}
