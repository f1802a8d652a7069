//! Hull strength and threshold tracking

use crate::config::HullConstants;
use serde::{Deserialize, Serialize};

/// Integrity thresholds, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullThreshold {
    Moderate,
    Heavy,
    Critical,
    StructuralFailure,
}

impl HullThreshold {
    pub fn all() -> &'static [HullThreshold] {
        &[
            HullThreshold::Moderate,
            HullThreshold::Heavy,
            HullThreshold::Critical,
            HullThreshold::StructuralFailure,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            HullThreshold::Moderate => 0,
            HullThreshold::Heavy => 1,
            HullThreshold::Critical => 2,
            HullThreshold::StructuralFailure => 3,
        }
    }

    /// Integrity percentage at which this threshold is crossed
    pub fn percentage(self, constants: &HullConstants) -> f64 {
        match self {
            HullThreshold::Moderate => constants.moderate_threshold,
            HullThreshold::Heavy => constants.heavy_threshold,
            HullThreshold::Critical => constants.critical_threshold,
            HullThreshold::StructuralFailure => constants.structural_failure_threshold,
        }
    }
}

/// Hull strength of one ship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullState {
    pub max_strength: f64,
    pub current_strength: f64,
    /// Total damage ever taken, never reduced by repairs
    pub structural_damage: f64,
    /// Thresholds currently below, indexed by `HullThreshold::index`
    pub crossed: [bool; 4],
}

impl HullState {
    pub fn new(max_strength: f64) -> Self {
        let max_strength = max_strength.max(0.0);
        HullState {
            max_strength,
            current_strength: max_strength,
            structural_damage: 0.0,
            crossed: [false; 4],
        }
    }

    /// Integrity as a percentage (0 - 100)
    pub fn integrity(&self) -> f64 {
        if self.max_strength <= 0.0 {
            return 0.0;
        }
        (self.current_strength / self.max_strength * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_destroyed(&self) -> bool {
        self.current_strength <= 0.0
    }

    /// Remove strength, returning the amount actually removed
    pub fn apply_damage(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 || !amount.is_finite() {
            return 0.0;
        }
        let actual = amount.min(self.current_strength);
        self.current_strength -= actual;
        self.structural_damage += actual;
        actual
    }

    /// Restore strength, returning the amount actually restored
    pub fn repair(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 || !amount.is_finite() {
            return 0.0;
        }
        let actual = amount.min(self.max_strength - self.current_strength).max(0.0);
        self.current_strength += actual;
        actual
    }

    /// Thresholds newly crossed on the way down, highest first.
    ///
    /// A threshold fires once per downward crossing and re-arms only when
    /// integrity climbs back above it.
    pub fn update_thresholds(&mut self, constants: &HullConstants) -> Vec<HullThreshold> {
        let integrity = self.integrity();
        let mut newly_crossed = Vec::new();
        for threshold in HullThreshold::all() {
            let i = threshold.index();
            let below = integrity <= threshold.percentage(constants);
            if below && !self.crossed[i] {
                self.crossed[i] = true;
                newly_crossed.push(*threshold);
            } else if !below && self.crossed[i] {
                self.crossed[i] = false;
            }
        }
        newly_crossed
    }

    pub fn crossed_thresholds(&self) -> Vec<HullThreshold> {
        HullThreshold::all()
            .iter()
            .filter(|t| self.crossed[t.index()])
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamped_at_zero() {
        let mut hull = HullState::new(100.0);
        assert!((hull.apply_damage(150.0) - 100.0).abs() < f64::EPSILON);
        assert!(hull.is_destroyed());
        assert!(hull.integrity().abs() < f64::EPSILON);
    }

    #[test]
    fn test_thresholds_fire_once() {
        let constants = HullConstants::default();
        let mut hull = HullState::new(100.0);

        hull.apply_damage(30.0);
        assert_eq!(hull.update_thresholds(&constants), vec![HullThreshold::Moderate]);
        assert!(hull.update_thresholds(&constants).is_empty());

        hull.apply_damage(50.0);
        assert_eq!(
            hull.update_thresholds(&constants),
            vec![HullThreshold::Heavy, HullThreshold::Critical]
        );
        assert!(hull.update_thresholds(&constants).is_empty());
    }

    #[test]
    fn test_repair_rearms_thresholds() {
        let constants = HullConstants::default();
        let mut hull = HullState::new(100.0);
        hull.apply_damage(30.0);
        hull.update_thresholds(&constants);

        hull.repair(20.0);
        assert!(hull.update_thresholds(&constants).is_empty());
        assert!(hull.crossed_thresholds().is_empty());

        hull.apply_damage(10.0);
        assert_eq!(hull.update_thresholds(&constants), vec![HullThreshold::Moderate]);
    }

    #[test]
    fn test_repair_capped_at_max() {
        let mut hull = HullState::new(100.0);
        hull.apply_damage(10.0);
        assert!((hull.repair(50.0) - 10.0).abs() < f64::EPSILON);
        assert!((hull.structural_damage - 10.0).abs() < f64::EPSILON);
    }
}
