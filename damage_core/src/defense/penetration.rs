//! Penetration - angle effectiveness and line-of-sight armor thickness
//!
//! A round penetrates when its effective power meets the line-of-sight
//! thickness of the plate:
//! - effective_thickness = thickness / cos(angle), capped at 5x nominal
//! - effective_power = power * type_factor * angle_effectiveness
//! - ratio = effective_power / effective_thickness
//!
//! Kinetic and explosive rounds above 70° ricochet unless they carry three
//! times the power needed to punch through.

use super::constants::{MAX_CACHE_ENTRIES, MAX_SLOPE_FACTOR, RICOCHET_ANGLE};
use crate::types::DamageType;
use std::collections::HashMap;

/// How well a damage type converts raw power into penetration
pub fn penetration_factor(damage_type: DamageType) -> f64 {
    match damage_type {
        DamageType::Kinetic => 1.0,
        DamageType::Energy => 0.8,
        DamageType::Explosive => 0.6,
        DamageType::Beam => 0.9,
        DamageType::Plasma => 1.1,
        DamageType::Emp => 0.0,
        DamageType::Ion => 0.3,
    }
}

/// Outcome of a penetration check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenetrationResult {
    pub penetrated: bool,
    /// Effective power over effective thickness
    pub ratio: f64,
    /// Angle effectiveness applied to the power
    pub effectiveness: f64,
    pub ricochet: bool,
}

type CacheKey = (i64, i64, i64, DamageType);

/// Penetration calculator with a bounded result cache
#[derive(Debug, Clone, Default)]
pub struct PenetrationCalculator {
    cache: HashMap<CacheKey, PenetrationResult>,
    hits: u64,
    misses: u64,
}

impl PenetrationCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of power that survives an impact angle (0° = head-on)
    pub fn angle_effectiveness(angle_degrees: f64) -> f64 {
        angle_degrees.to_radians().cos().clamp(0.1, 1.0)
    }

    /// Line-of-sight thickness through a sloped plate
    pub fn effective_thickness(thickness: f64, angle_degrees: f64) -> f64 {
        if thickness <= 0.0 {
            return 0.0;
        }
        let cos = angle_degrees.to_radians().cos().abs();
        if cos <= 1.0 / MAX_SLOPE_FACTOR {
            return thickness * MAX_SLOPE_FACTOR;
        }
        thickness / cos
    }

    /// Check whether a round penetrates. Results are cached on
    /// power (0.1), thickness (0.1) and angle (1°) buckets.
    pub fn calculate(
        &mut self,
        power: f64,
        thickness: f64,
        angle_degrees: f64,
        damage_type: DamageType,
    ) -> PenetrationResult {
        let key = (
            (power * 10.0).round() as i64,
            (thickness * 10.0).round() as i64,
            angle_degrees.round() as i64,
            damage_type,
        );

        if let Some(result) = self.cache.get(&key) {
            self.hits += 1;
            return *result;
        }
        self.misses += 1;

        // Compute on the bucket values so cached and fresh results agree
        let result = Self::compute(
            key.0 as f64 / 10.0,
            key.1 as f64 / 10.0,
            key.2 as f64,
            damage_type,
        );

        if self.cache.len() >= MAX_CACHE_ENTRIES {
            self.cache.clear();
        }
        self.cache.insert(key, result);
        result
    }

    fn compute(power: f64, thickness: f64, angle_degrees: f64, damage_type: DamageType) -> PenetrationResult {
        let effectiveness = Self::angle_effectiveness(angle_degrees);
        let effective_power = power.max(0.0) * penetration_factor(damage_type) * effectiveness;
        let effective_thickness = Self::effective_thickness(thickness, angle_degrees);

        let ratio = if effective_thickness <= 0.0 {
            f64::INFINITY
        } else {
            effective_power / effective_thickness
        };

        let can_ricochet = matches!(damage_type, DamageType::Kinetic | DamageType::Explosive);
        let ricochet = can_ricochet && angle_degrees.abs() > RICOCHET_ANGLE && ratio < 3.0;

        PenetrationResult {
            penetrated: !ricochet && ratio >= 1.0,
            ratio,
            effectiveness,
            ricochet,
        }
    }

    /// (hits, misses) for the result cache
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
