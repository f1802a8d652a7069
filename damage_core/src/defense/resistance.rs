//! Armor resistance - directional damage absorption with local weakening
//!
//! Formula:
//! - base = RESISTANCE_MATRIX[armor_class][damage_type]
//! - resistance = base * angle_mod * thickness_mod * depth_mod / weapon_effectiveness
//! - resistance is clamped to [0, max_resistance] (0.95 by default)
//! - absorbed = damage * resistance
//!
//! Depth is tracked per spatial hash cell of the local impact point. A hit whose
//! residual exceeds half the original damage deepens that cell, so armor that
//! has already been punched through keeps getting weaker in the same spot.

use super::constants::{ANGLE_BANDS, DEFLECTION_MODIFIER, RESISTANCE_MATRIX};
use crate::config::ArmorConstants;
use crate::error::DamageError;
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::{impact_angle_degrees, ArmorClass, DamageType};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Base resistance of an armor class against a damage type
pub fn base_resistance(armor_class: ArmorClass, damage_type: DamageType) -> f64 {
    let (column, scale) = damage_type.resistance_column();
    RESISTANCE_MATRIX[armor_class.index()][column] * scale
}

/// Resistance modifier for an impact angle (0° = head-on)
pub fn angle_modifier(angle_degrees: f64) -> f64 {
    let angle = angle_degrees.abs();
    ANGLE_BANDS
        .iter()
        .find(|(limit, _)| angle <= *limit)
        .map(|(_, modifier)| *modifier)
        .unwrap_or(DEFLECTION_MODIFIER)
}

/// Logarithmic thickness modifier, 1.0 at the reference thickness
pub fn thickness_modifier(thickness: f64, reference_thickness: f64) -> f64 {
    if thickness <= 0.0 {
        return 0.0;
    }
    (1.0 + thickness).ln() / (1.0 + reference_thickness).ln()
}

/// Effective resistance for a hit, before weapon effectiveness
pub fn effective_resistance(
    damage_type: DamageType,
    armor_class: ArmorClass,
    thickness: f64,
    angle_degrees: f64,
    penetration_depth: f64,
    constants: &ArmorConstants,
) -> f64 {
    let base = base_resistance(armor_class, damage_type);
    let angle_mod = angle_modifier(angle_degrees);
    let thickness_mod = thickness_modifier(thickness, constants.reference_thickness);
    let depth_mod = depth_modifier(penetration_depth, constants);

    (base * angle_mod * thickness_mod * depth_mod).clamp(0.0, constants.max_resistance)
}

fn depth_modifier(depth: f64, constants: &ArmorConstants) -> f64 {
    (1.0 - depth.max(0.0) * constants.depth_resistance_loss).max(constants.min_depth_modifier)
}

/// A hit against a specific patch of armor
#[derive(Debug, Clone, PartialEq)]
pub struct ArmorHit {
    pub damage: f64,
    pub damage_type: DamageType,
    pub armor_class: ArmorClass,
    pub thickness: f64,
    /// Impact point in ship-local space
    pub local_point: DVec3,
    /// Projectile velocity in ship-local space
    pub local_velocity: DVec3,
    /// Weapon-vs-armor effectiveness (1.0 = neutral)
    pub weapon_effectiveness: f64,
}

impl ArmorHit {
    pub fn new(
        damage: f64,
        damage_type: DamageType,
        armor_class: ArmorClass,
        thickness: f64,
        local_point: DVec3,
        local_velocity: DVec3,
    ) -> Self {
        ArmorHit {
            damage,
            damage_type,
            armor_class,
            thickness,
            local_point,
            local_velocity,
            weapon_effectiveness: 1.0,
        }
    }

    pub fn with_weapon_effectiveness(mut self, effectiveness: f64) -> Self {
        self.weapon_effectiveness = effectiveness;
        self
    }
}

/// Breakdown of one resistance calculation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResistanceOutcome {
    /// Damage stopped by the armor
    pub absorbed: f64,
    /// Damage that got through
    pub residual: f64,
    /// Resistance actually applied
    pub resistance: f64,
    pub angle_degrees: f64,
    /// Residual exceeded the penetration fraction
    pub penetrated: bool,
    /// Depth at this location crossed the critical threshold on this hit
    pub critical_penetration: bool,
    /// Accumulated depth at the impact cell after this hit
    pub penetration_depth: f64,
}

/// Armor resistance calculator with per-location penetration history
#[derive(Debug, Clone)]
pub struct ArmorResistanceCalculator {
    constants: ArmorConstants,
    depths: HashMap<CellKey, f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ResistanceSave {
    /// (x, y, z, depth) per tracked cell
    cells: Vec<[f64; 4]>,
}

impl ArmorResistanceCalculator {
    pub fn new(constants: ArmorConstants) -> Self {
        ArmorResistanceCalculator {
            constants,
            depths: HashMap::new(),
        }
    }

    pub fn constants(&self) -> &ArmorConstants {
        &self.constants
    }

    fn cell_key(&self, point: DVec3) -> CellKey {
        let cell = (point / self.constants.penetration_cell_size).floor();
        (cell.x as i64, cell.y as i64, cell.z as i64)
    }

    /// Accumulated penetration depth at a local point
    pub fn penetration_depth_at(&self, local_point: DVec3) -> f64 {
        self.depths
            .get(&self.cell_key(local_point))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of tracked penetration cells
    pub fn tracked_cells(&self) -> usize {
        self.depths.len()
    }

    /// Damage absorbed by the armor for a hit
    pub fn calculate_damage_reduction(
        &mut self,
        damage: f64,
        damage_type: DamageType,
        armor_class: ArmorClass,
        thickness: f64,
        local_point: DVec3,
        velocity: DVec3,
    ) -> f64 {
        let hit = ArmorHit::new(damage, damage_type, armor_class, thickness, local_point, velocity);
        self.evaluate(&hit).absorbed
    }

    /// Resolve a hit against the armor and record any penetration
    pub fn evaluate(&mut self, hit: &ArmorHit) -> ResistanceOutcome {
        if hit.damage <= 0.0 {
            return ResistanceOutcome::default();
        }

        let angle = impact_angle_degrees(hit.local_point, hit.local_velocity);
        let depth = self.penetration_depth_at(hit.local_point);

        let mut resistance = effective_resistance(
            hit.damage_type,
            hit.armor_class,
            hit.thickness,
            angle,
            depth,
            &self.constants,
        );
        resistance = (resistance / hit.weapon_effectiveness.max(0.05)).clamp(0.0, self.constants.max_resistance);

        let absorbed = hit.damage * resistance;
        let residual = hit.damage - absorbed;

        let mut outcome = ResistanceOutcome {
            absorbed,
            residual,
            resistance,
            angle_degrees: angle,
            penetrated: false,
            critical_penetration: false,
            penetration_depth: depth,
        };

        // Unarmored hull has nothing to weaken
        if hit.armor_class != ArmorClass::None
            && residual > hit.damage * self.constants.penetration_residual_fraction
        {
            let new_depth = self.record_penetration(hit.local_point, residual / hit.damage);
            let threshold = self.constants.critical_penetration_depth;
            outcome.penetrated = true;
            outcome.critical_penetration = depth < threshold && new_depth >= threshold;
            outcome.penetration_depth = new_depth;
        }

        outcome
    }

    /// Deepen the cell at `local_point`, returning its new depth
    fn record_penetration(&mut self, local_point: DVec3, amount: f64) -> f64 {
        let key = self.cell_key(local_point);

        if !self.depths.contains_key(&key) && self.depths.len() >= self.constants.max_penetration_cells {
            // Evict the shallowest cell
            if let Some(shallowest) = self
                .depths
                .iter()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(k, _)| *k)
            {
                self.depths.remove(&shallowest);
            }
        }

        let depth = self.depths.entry(key).or_insert(0.0);
        *depth += amount;
        *depth
    }

    /// Remove penetration history within `radius` of a point (armor patched)
    pub fn clear_penetration_near(&mut self, local_point: DVec3, radius: f64) -> usize {
        let cell_size = self.constants.penetration_cell_size;
        let before = self.depths.len();
        self.depths.retain(|(x, y, z), _| {
            let center = DVec3::new(*x as f64 + 0.5, *y as f64 + 0.5, *z as f64 + 0.5) * cell_size;
            center.distance(local_point) > radius
        });
        before - self.depths.len()
    }

    /// Forget all penetration history
    pub fn reset(&mut self) {
        self.depths.clear();
    }

    pub fn save_data(&self) -> SaveData {
        let mut cells: Vec<[f64; 4]> = self
            .depths
            .iter()
            .map(|((x, y, z), depth)| [*x as f64, *y as f64, *z as f64, *depth])
            .collect();
        cells.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        to_save_data(&ResistanceSave { cells })
    }

    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: ResistanceSave = from_save_data(data)?;
        let mut depths = HashMap::new();
        for [x, y, z, depth] in save.cells.into_iter().take(self.constants.max_penetration_cells) {
            depths.insert((x as i64, y as i64, z as i64), depth.max(0.0));
        }
        self.depths = depths;
        Ok(())
    }
}

impl Default for ArmorResistanceCalculator {
    fn default() -> Self {
        Self::new(ArmorConstants::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOW: DVec3 = DVec3::new(0.0, 0.0, 10.0);
    const HEAD_ON: DVec3 = DVec3::new(0.0, 0.0, -500.0);

    #[test]
    fn test_no_armor_absorbs_nothing() {
        let mut calc = ArmorResistanceCalculator::default();
        let absorbed = calc.calculate_damage_reduction(40.0, DamageType::Kinetic, ArmorClass::None, 10.0, BOW, HEAD_ON);
        assert!(absorbed.abs() < f64::EPSILON);
        assert_eq!(calc.tracked_cells(), 0);
    }

    #[test]
    fn test_standard_head_on_at_reference_thickness() {
        // standard vs kinetic = 0.30, head-on 1.0, thickness mod 1.0, no depth
        let mut calc = ArmorResistanceCalculator::default();
        let absorbed = calc.calculate_damage_reduction(100.0, DamageType::Kinetic, ArmorClass::Standard, 10.0, BOW, HEAD_ON);
        assert!((absorbed - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_bands() {
        assert!((angle_modifier(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((angle_modifier(15.0) - 1.0).abs() < f64::EPSILON);
        assert!((angle_modifier(30.0) - 0.85).abs() < f64::EPSILON);
        assert!((angle_modifier(60.0) - 0.5).abs() < f64::EPSILON);
        assert!((angle_modifier(89.0) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resistance_capped() {
        let constants = ArmorConstants::default();
        let r = effective_resistance(DamageType::Kinetic, ArmorClass::SuperCapital, 10_000.0, 0.0, 0.0, &constants);
        assert!((r - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_emp_half_of_energy() {
        let energy = base_resistance(ArmorClass::Heavy, DamageType::Energy);
        let emp = base_resistance(ArmorClass::Heavy, DamageType::Emp);
        assert!((emp - energy * 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_repeated_penetration_weakens_spot() {
        let mut calc = ArmorResistanceCalculator::default();
        let hit = ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Light, 5.0, BOW, HEAD_ON);

        let first = calc.evaluate(&hit);
        assert!(first.penetrated);
        let second = calc.evaluate(&hit);
        assert!(second.absorbed < first.absorbed);
        assert!(calc.penetration_depth_at(BOW) > 1.0);
    }

    #[test]
    fn test_critical_penetration_signalled_once() {
        let mut calc = ArmorResistanceCalculator::default();
        let hit = ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Light, 2.0, BOW, HEAD_ON);

        let mut signals = 0;
        for _ in 0..10 {
            if calc.evaluate(&hit).critical_penetration {
                signals += 1;
            }
        }
        assert_eq!(signals, 1);
    }

    #[test]
    fn test_shallowest_cell_evicted() {
        let constants = ArmorConstants {
            max_penetration_cells: 2,
            ..ArmorConstants::default()
        };
        let mut calc = ArmorResistanceCalculator::new(constants);
        let a = DVec3::new(0.0, 0.0, 10.0);
        let b = DVec3::new(0.0, 0.0, 20.0);
        let c = DVec3::new(0.0, 0.0, 30.0);

        let hit = |p: DVec3| ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Light, 2.0, p, HEAD_ON);
        calc.evaluate(&hit(a));
        calc.evaluate(&hit(a));
        calc.evaluate(&hit(b));
        calc.evaluate(&hit(c));

        assert_eq!(calc.tracked_cells(), 2);
        assert!(calc.penetration_depth_at(a) > 0.0);
        assert!(calc.penetration_depth_at(b).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weapon_effectiveness_lowers_resistance() {
        let mut calc = ArmorResistanceCalculator::default();
        let neutral = ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Heavy, 40.0, BOW, HEAD_ON);
        let strong = neutral.clone().with_weapon_effectiveness(2.0);

        let a = calc.clone().evaluate(&neutral);
        let b = calc.evaluate(&strong);
        assert!(b.resistance < a.resistance);
    }

    #[test]
    fn test_clear_penetration_near() {
        let mut calc = ArmorResistanceCalculator::default();
        let hit = ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Light, 2.0, BOW, HEAD_ON);
        calc.evaluate(&hit);
        assert_eq!(calc.clear_penetration_near(BOW, 3.0), 1);
        assert!(calc.penetration_depth_at(BOW).abs() < f64::EPSILON);
    }

    #[test]
    fn test_save_round_trip() {
        let mut calc = ArmorResistanceCalculator::default();
        let hit = ArmorHit::new(100.0, DamageType::Kinetic, ArmorClass::Light, 2.0, BOW, HEAD_ON);
        calc.evaluate(&hit);
        calc.evaluate(&hit);

        let data = calc.save_data();
        let mut restored = ArmorResistanceCalculator::default();
        restored.load_save_data(&data).unwrap();
        assert!((restored.penetration_depth_at(BOW) - calc.penetration_depth_at(BOW)).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_absorbed_never_exceeds_damage(
            damage in 0.0f64..10_000.0,
            thickness in 0.0f64..200.0,
            class_idx in 0usize..6,
            vx in -500.0f64..500.0,
            vz in -500.0f64..500.0,
        ) {
            let mut calc = ArmorResistanceCalculator::default();
            let class = ArmorClass::all()[class_idx];
            let outcome = calc.evaluate(&ArmorHit::new(
                damage, DamageType::Kinetic, class, thickness, BOW, DVec3::new(vx, 0.0, vz),
            ));
            prop_assert!(outcome.absorbed <= damage + 1e-9);
            prop_assert!(outcome.resistance <= 0.95 + 1e-12);
            prop_assert!((outcome.absorbed - damage * outcome.resistance).abs() < 1e-6);
        }

        #[test]
        fn prop_resistance_monotonic_in_thickness(t1 in 0.0f64..200.0, t2 in 0.0f64..200.0) {
            let constants = ArmorConstants::default();
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            let r_lo = effective_resistance(DamageType::Plasma, ArmorClass::Heavy, lo, 0.0, 0.0, &constants);
            let r_hi = effective_resistance(DamageType::Plasma, ArmorClass::Heavy, hi, 0.0, 0.0, &constants);
            prop_assert!(r_lo <= r_hi + 1e-12);
        }

        #[test]
        fn prop_resistance_monotonic_in_head_on(a1 in 0.0f64..90.0, a2 in 0.0f64..90.0) {
            let constants = ArmorConstants::default();
            let (steep, shallow) = if a1 <= a2 { (a1, a2) } else { (a2, a1) };
            let r_steep = effective_resistance(DamageType::Beam, ArmorClass::Capital, 20.0, steep, 0.0, &constants);
            let r_shallow = effective_resistance(DamageType::Beam, ArmorClass::Capital, 20.0, shallow, 0.0, &constants);
            prop_assert!(r_steep >= r_shallow - 1e-12);
        }
    }
}
