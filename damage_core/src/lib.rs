//! damage_core - Ship combat damage model
//!
//! This library provides:
//! - DamageManager: per-ship coordinator routing hits through shields, armor and hull
//! - ShieldQuadrantManager: four directional shield quadrants with recharge
//! - ArmorResistanceCalculator / PenetrationCalculator / WeaponPenetrationSystem: armor math
//! - ShipArmorConfiguration / ArmorDegradationTracker / CriticalHitDetector: zone layout, wear and weak points
//! - CollisionDamageSystem: contacts, ramming and environmental hazards
//! - CriticalDamageSystem: critical events, cascades, emergency protocols and catastrophic failure

pub mod armor;
pub mod collision;
pub mod config;
pub mod critical;
pub mod defense;
pub mod error;
pub mod events;
pub mod hull;
pub mod prelude;
pub mod save;
pub mod shield;
pub mod types;

// Re-export core types for convenience
pub use armor::{ArmorDegradationTracker, CriticalHitDetector, HitClassification, ShipArmorConfiguration};
pub use collision::{CollisionBody, CollisionContact, CollisionDamageSystem, HazardType};
pub use config::{DamageConstants, ShipClass, ShipClassRegistry, WeaponRecord, WeaponRegistry};
pub use critical::{CriticalDamageSystem, CriticalEventType, EmergencyProtocol, ShipCriticalState};
pub use defense::{ArmorResistanceCalculator, PenetrationCalculator, WeaponPenetrationSystem};
pub use error::DamageError;
pub use events::{DamageNotification, EventQueue};
pub use hull::{DamageManager, DamageReport, HullStatus, HullThreshold, SubsystemGrid, SubsystemProvider};
pub use save::SaveData;
pub use shield::{Quadrant, ShieldQuadrantManager, ShieldStatus};
pub use types::{AmmunitionType, ArmorClass, DamageEvent, DamageType, ObjectHandle, ShipType, WeaponHit, WeaponType};
