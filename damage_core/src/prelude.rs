//! Prelude module for convenient imports
//!
//! ```rust
//! use damage_core::prelude::*;
//! ```

// Core types
pub use crate::types::{AmmunitionType, ArmorClass, DamageEvent, DamageType, ObjectHandle, ShipType, WeaponHit, WeaponType};

// Coordinator
pub use crate::hull::{DamageManager, DamageReport, HullStatus, HullThreshold, SubsystemGrid, SubsystemProvider};

// Components
pub use crate::collision::{CollisionBody, CollisionContact, HazardType, ShipDescriptor};
pub use crate::critical::{CriticalEventType, CriticalStatus, EmergencyProtocol, ShipCriticalState};
pub use crate::shield::{Quadrant, ShieldStatus};

// Notifications and persistence
pub use crate::error::DamageError;
pub use crate::events::{DamageNotification, EventQueue};
pub use crate::save::SaveData;

// Config
pub use crate::config::{DamageConstants, ShipClass, ShipClassRegistry, WeaponRegistry};
