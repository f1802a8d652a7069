//! Armor layout, wear tracking and critical-hit analysis
//!
//! - `configuration`: static zone geometry per ship archetype
//! - `degradation`: per-zone impact, thermal and repair wear
//! - `critical_hit`: weak points, armor bypass and hit classification

mod configuration;
mod critical_hit;
mod degradation;

pub use configuration::{ArmorSample, ArmorZone, Bounds, ShipArmorConfiguration, ZoneRole};
pub use critical_hit::{
    generate_weak_points, type_critical_bonus, CriticalHitDetector, CriticalHitResult, CriticalHitStats,
    HitClassification, WeakPoint, WeakPointType,
};
pub use degradation::{
    degradation_factor, ArmorDegradationRecord, ArmorDegradationTracker, DegradationStatus, ImpactRecord,
    MaintenanceItem,
};
