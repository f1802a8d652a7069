//! Configuration loading from TOML files

mod constants;
mod ships;
mod weapons;

pub use constants::{
    ArmorConstants, CollisionConstants, CriticalConstants, CriticalHitConstants, DamageConstants,
    DegradationConstants, HullConstants, ShieldConstants,
};
pub use ships::{load_ship_classes, parse_ship_classes, ShipClass, ShipClassRegistry};
pub use weapons::{load_weapons, parse_weapons, WeaponRecord, WeaponRegistry};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

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

/// Load damage constants from a TOML file and validate them
pub fn load_constants(path: &Path) -> Result<DamageConstants, ConfigError> {
    let constants: DamageConstants = load_toml(path)?;
    constants.validate()?;
    Ok(constants)
}

/// Parse damage constants from a TOML string and validate them
pub fn parse_constants(content: &str) -> Result<DamageConstants, ConfigError> {
    let constants: DamageConstants = parse_toml(content)?;
    constants.validate()?;
    Ok(constants)
}
