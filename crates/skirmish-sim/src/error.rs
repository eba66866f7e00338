use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for scenario loading, validation and building.
pub enum SimError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("map must be at least 1x1, got {width}x{height}")]
    InvalidMapSize { width: i32, height: i32 },

    #[error("time limit must be greater than 0")]
    ZeroTimeLimit,

    #[error("duplicate unit id {id}")]
    DuplicateUnitId { id: u64 },

    #[error("unit {id} belongs to unknown player {player}")]
    UnknownPlayer { id: u64, player: u8 },

    #[error("unit {id} at ({x}, {y}) is outside the {width}x{height} map")]
    UnitOutOfBounds {
        id: u64,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("units {first} and {second} both stand on ({x}, {y})")]
    OverlappingUnits {
        first: u64,
        second: u64,
        x: i32,
        y: i32,
    },

    #[error("unit {id} has invalid {field}: {reason}")]
    InvalidStats {
        id: u64,
        field: &'static str,
        reason: String,
    },

    #[error("builder referenced unknown unit {id}")]
    BuilderUnknownUnit { id: u64 },
}
