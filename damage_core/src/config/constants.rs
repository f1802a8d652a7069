//! Tunable damage-model constants

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// All tunable constants, grouped by component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConstants {
    pub hull: HullConstants,
    pub armor: ArmorConstants,
    pub shields: ShieldConstants,
    pub critical: CriticalConstants,
    pub collision: CollisionConstants,
    pub degradation: DegradationConstants,
    pub critical_hits: CriticalHitConstants,
}

impl DamageConstants {
    /// Check value ranges that would otherwise produce invalid state
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.hull.subsystem_damage_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::ValidationError(format!(
                "hull.subsystem_damage_ratio must be in [0, 1], got {}",
                ratio
            )));
        }

        let h = &self.hull;
        if !(h.moderate_threshold > h.heavy_threshold
            && h.heavy_threshold > h.critical_threshold
            && h.critical_threshold > h.structural_failure_threshold
            && h.structural_failure_threshold >= 0.0
            && h.moderate_threshold <= 100.0)
        {
            return Err(ConfigError::ValidationError(
                "hull thresholds must be strictly descending within [0, 100]".to_string(),
            ));
        }

        if !(0.0..=0.95).contains(&self.armor.max_resistance) {
            return Err(ConfigError::ValidationError(format!(
                "armor.max_resistance must be in [0, 0.95], got {}",
                self.armor.max_resistance
            )));
        }

        if self.armor.reference_thickness <= 0.0 || self.armor.penetration_cell_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "armor.reference_thickness and armor.penetration_cell_size must be positive".to_string(),
            ));
        }

        if self.shields.recharge_delay < 0.0 || self.shields.base_coverage_angle <= 0.0 {
            return Err(ConfigError::ValidationError(
                "shields.recharge_delay must be >= 0 and base_coverage_angle > 0".to_string(),
            ));
        }

        let c = &self.critical;
        if c.catastrophic_threshold > c.cascade_threshold {
            return Err(ConfigError::ValidationError(
                "critical.catastrophic_threshold must not exceed cascade_threshold".to_string(),
            ));
        }
        if !(0.0..c.catastrophic_threshold / 100.0).contains(&c.countdown_hull_floor) {
            return Err(ConfigError::ValidationError(format!(
                "critical.countdown_hull_floor must be in [0, catastrophic_threshold), got {}",
                c.countdown_hull_floor
            )));
        }
        if c.spread_interval <= 0.0 || c.countdown_duration <= 0.0 {
            return Err(ConfigError::ValidationError(
                "critical.spread_interval and countdown_duration must be positive".to_string(),
            ));
        }

        if self.collision.max_velocity <= 0.0 {
            return Err(ConfigError::ValidationError(
                "collision.max_velocity must be positive".to_string(),
            ));
        }

        if self.degradation.history_size == 0 {
            return Err(ConfigError::ValidationError(
                "degradation.history_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Hull damage split, thresholds and progressive damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HullConstants {
    /// Fraction of post-armor damage routed to subsystems
    pub subsystem_damage_ratio: f64,
    /// Radius around the impact searched for subsystems
    pub subsystem_search_radius: f64,
    /// Integrity percentages for threshold notifications
    pub moderate_threshold: f64,
    pub heavy_threshold: f64,
    pub critical_threshold: f64,
    pub structural_failure_threshold: f64,
    /// Progressive self-damage starts below this integrity percentage
    pub progressive_threshold: f64,
    /// Progressive damage per second as a fraction of max hull (at zero integrity)
    pub progressive_rate: f64,
}

impl Default for HullConstants {
    fn default() -> Self {
        HullConstants {
            subsystem_damage_ratio: 0.3,
            subsystem_search_radius: 6.0,
            moderate_threshold: 75.0,
            heavy_threshold: 50.0,
            critical_threshold: 25.0,
            structural_failure_threshold: 10.0,
            progressive_threshold: 50.0,
            progressive_rate: 0.002,
        }
    }
}

/// Armor resistance and penetration-depth tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorConstants {
    /// Hard cap on effective resistance
    pub max_resistance: f64,
    /// Thickness at which the thickness modifier equals 1.0
    pub reference_thickness: f64,
    /// Edge length of a penetration-depth hash cell
    pub penetration_cell_size: f64,
    /// Resistance lost per unit of accumulated depth
    pub depth_resistance_loss: f64,
    /// Floor of the depth modifier
    pub min_depth_modifier: f64,
    /// Residual fraction above which a hit counts as a penetration
    pub penetration_residual_fraction: f64,
    /// Depth at which a penetration becomes critical
    pub critical_penetration_depth: f64,
    /// Maximum tracked penetration cells
    pub max_penetration_cells: usize,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        ArmorConstants {
            max_resistance: 0.95,
            reference_thickness: 10.0,
            penetration_cell_size: 2.0,
            depth_resistance_loss: 0.1,
            min_depth_modifier: 0.1,
            penetration_residual_fraction: 0.5,
            critical_penetration_depth: 3.0,
            max_penetration_cells: 256,
        }
    }
}

/// Quadrant shield geometry and recharge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConstants {
    /// Seconds after absorbing damage before recharge resumes
    pub recharge_delay: f64,
    /// Nominal coverage half-angle per quadrant in degrees
    pub base_coverage_angle: f64,
    /// Fraction of max a depleted quadrant must reach to count as restored
    pub restore_fraction: f64,
    /// Upper bound on the energy allocation multiplier
    pub max_energy_allocation: f64,
}

impl Default for ShieldConstants {
    fn default() -> Self {
        ShieldConstants {
            recharge_delay: 3.0,
            base_coverage_angle: 90.0,
            restore_fraction: 0.1,
            max_energy_allocation: 3.0,
        }
    }
}

/// Critical events, cascades and the catastrophic countdown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalConstants {
    /// Cascade probability per unit of severity
    pub cascade_factor: f64,
    /// Integrity percentage below which cascade probability doubles
    pub cascade_threshold: f64,
    /// Integrity percentage that starts the catastrophic countdown
    pub catastrophic_threshold: f64,
    pub countdown_duration: f64,
    /// Countdown damage per second as a fraction of max hull, start and end
    pub countdown_min_rate: f64,
    pub countdown_max_rate: f64,
    /// Hull fraction internal damage cannot push below while the countdown runs
    pub countdown_hull_floor: f64,
    /// Seconds between spread rolls for an active event
    pub spread_interval: f64,
    pub spread_severity_factor: f64,
    pub min_spread_severity: f64,
    /// Maximum positional jitter of a spread copy
    pub spread_jitter: f64,
    pub cascade_severity_factor: f64,
    pub max_cascade_depth: u32,
    pub max_active_events: usize,
    /// Severity of the five final-detonation events
    pub detonation_severity: f64,
}

impl Default for CriticalConstants {
    fn default() -> Self {
        CriticalConstants {
            cascade_factor: 0.3,
            cascade_threshold: 30.0,
            catastrophic_threshold: 10.0,
            countdown_duration: 30.0,
            countdown_min_rate: 0.005,
            countdown_max_rate: 0.02,
            countdown_hull_floor: 0.01,
            spread_interval: 5.0,
            spread_severity_factor: 0.6,
            min_spread_severity: 0.2,
            spread_jitter: 3.0,
            cascade_severity_factor: 0.7,
            max_cascade_depth: 3,
            max_active_events: 32,
            detonation_severity: 3.0,
        }
    }
}

/// Collision, ramming and hazard damage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConstants {
    /// Seconds before the same object can damage us again
    pub cooldown: f64,
    /// Velocity at which the diminishing-returns curve saturates
    pub max_velocity: f64,
    pub min_velocity: f64,
    /// Damage below this is ignored
    pub min_damage: f64,
    pub damage_per_momentum: f64,
    pub ship_multiplier: f64,
    pub debris_multiplier: f64,
    pub environmental_multiplier: f64,
    pub generic_multiplier: f64,
}

impl Default for CollisionConstants {
    fn default() -> Self {
        CollisionConstants {
            cooldown: 0.5,
            max_velocity: 500.0,
            min_velocity: 1.0,
            min_damage: 0.5,
            damage_per_momentum: 0.01,
            ship_multiplier: 1.0,
            debris_multiplier: 0.5,
            environmental_multiplier: 1.5,
            generic_multiplier: 0.8,
        }
    }
}

/// Armor fatigue and wear
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConstants {
    /// Impact history ring size per zone
    pub history_size: usize,
    /// Damage per unit thickness that causes one full degradation
    pub impact_scale: f64,
    pub thermal_scale: f64,
    pub fatigue_recovery_rate: f64,
    pub thermal_recovery_rate: f64,
    /// Permanent wear per repair cycle (scaled by repair difficulty)
    pub repair_degradation: f64,
    /// Seconds of history considered for failure prediction
    pub prediction_window: f64,
    pub prediction_samples: usize,
}

impl Default for DegradationConstants {
    fn default() -> Self {
        DegradationConstants {
            history_size: 32,
            impact_scale: 100.0,
            thermal_scale: 400.0,
            fatigue_recovery_rate: 0.001,
            thermal_recovery_rate: 0.002,
            repair_degradation: 0.01,
            prediction_window: 60.0,
            prediction_samples: 10,
        }
    }
}

/// Critical-hit chance, weak points and armor bypass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalHitConstants {
    pub base_chance: f64,
    pub max_chance: f64,
    /// Chance added per unit of zone degradation
    pub degradation_bonus: f64,
    pub critical_multiplier: f64,
    pub bypass_multiplier: f64,
    /// Penetration / thickness ratio that bypasses armor outright
    pub bypass_ratio: f64,
    /// Seconds between weak-point refreshes
    pub refresh_interval: f64,
    pub max_cached_cells: usize,
}

impl Default for CriticalHitConstants {
    fn default() -> Self {
        CriticalHitConstants {
            base_chance: 0.05,
            max_chance: 0.75,
            degradation_bonus: 0.2,
            critical_multiplier: 1.5,
            bypass_multiplier: 1.25,
            bypass_ratio: 2.0,
            refresh_interval: 5.0,
            max_cached_cells: 512,
        }
    }
}
