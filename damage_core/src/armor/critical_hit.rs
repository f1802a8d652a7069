//! Critical-hit detection - weak points, armor bypass and hit classification
//!
//! chance = base + weapon_bonus + type_bonus + degradation * degradation_bonus
//! (plus the critical bonus of any weak point struck), clamped to max_chance.
//!
//! Final multiplier = critical (1.5) * weak point vulnerability * bypass (1.25),
//! each factor applying only when its condition holds.

use super::configuration::{ArmorZone, Bounds, ShipArmorConfiguration, ZoneRole};
use super::degradation::ArmorDegradationTracker;
use crate::config::CriticalHitConstants;
use crate::error::DamageError;
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::{DamageType, WeaponHit};
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

const WEAK_POINT_CELL_SIZE: f64 = 2.0;

type CellKey = (i64, i64, i64);

/// Extra critical chance a damage type carries
pub fn type_critical_bonus(damage_type: DamageType) -> f64 {
    match damage_type {
        DamageType::Explosive => 0.05,
        DamageType::Plasma => 0.04,
        DamageType::Beam => 0.03,
        DamageType::Kinetic => 0.02,
        DamageType::Energy | DamageType::Emp | DamageType::Ion => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeakPointType {
    /// Load-bearing frame at a zone centre
    Structural,
    /// Exposed machinery (reactor, engines, bridge)
    Subsystem,
    /// Seam between two plating zones
    Joint,
}

/// A localized spot with elevated critical chance or bypass potential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakPoint {
    pub kind: WeakPointType,
    pub zone: String,
    pub location: DVec3,
    pub radius: f64,
    /// Damage multiplier for hits on this weak point
    pub vulnerability: f64,
    pub critical_bonus: f64,
    /// Base chance of a joint failing outright (0.0 - 1.0)
    pub bypass_potential: f64,
}

/// How a hit was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitClassification {
    Normal,
    Critical,
    WeakPoint,
    Bypass,
    /// Critical on a weak point
    MajorCritical,
    /// Critical on a weak point that also bypassed the armor
    PerfectCritical,
}

impl HitClassification {
    pub fn all() -> &'static [HitClassification] {
        &[
            HitClassification::Normal,
            HitClassification::Critical,
            HitClassification::WeakPoint,
            HitClassification::Bypass,
            HitClassification::MajorCritical,
            HitClassification::PerfectCritical,
        ]
    }

    pub fn index(self) -> usize {
        match self {
            HitClassification::Normal => 0,
            HitClassification::Critical => 1,
            HitClassification::WeakPoint => 2,
            HitClassification::Bypass => 3,
            HitClassification::MajorCritical => 4,
            HitClassification::PerfectCritical => 5,
        }
    }

    /// Combine the three hit conditions into a classification
    pub fn classify(critical: bool, weak_point: bool, bypass: bool) -> HitClassification {
        match (critical, weak_point, bypass) {
            (true, true, true) => HitClassification::PerfectCritical,
            (true, true, false) => HitClassification::MajorCritical,
            (true, false, _) => HitClassification::Critical,
            (false, true, _) => HitClassification::WeakPoint,
            (false, false, true) => HitClassification::Bypass,
            (false, false, false) => HitClassification::Normal,
        }
    }

    /// Severe enough to start a critical event in the struck zone
    pub fn is_major(self) -> bool {
        matches!(self, HitClassification::MajorCritical | HitClassification::PerfectCritical)
    }
}

/// Result of analyzing one hit
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalHitResult {
    pub classification: HitClassification,
    pub multiplier: f64,
    /// Critical chance that was rolled against
    pub chance: f64,
    pub critical: bool,
    pub bypass: bool,
    pub weak_point: Option<WeakPoint>,
}

/// Running hit statistics per classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalHitStats {
    pub total_hits: u64,
    pub counts: [u64; 6],
    pub total_multiplier: f64,
}

impl CriticalHitStats {
    pub fn count(&self, classification: HitClassification) -> u64 {
        self.counts[classification.index()]
    }

    /// Fraction of hits classified as anything but normal
    pub fn special_rate(&self) -> f64 {
        if self.total_hits == 0 {
            return 0.0;
        }
        1.0 - self.count(HitClassification::Normal) as f64 / self.total_hits as f64
    }

    pub fn average_multiplier(&self) -> f64 {
        if self.total_hits == 0 {
            return 1.0;
        }
        self.total_multiplier / self.total_hits as f64
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CriticalHitSave {
    stats: CriticalHitStats,
    refresh_timer: f64,
    weak_points: Vec<WeakPoint>,
}

/// Weak-point and critical-hit analysis for one ship
#[derive(Debug, Clone)]
pub struct CriticalHitDetector {
    constants: CriticalHitConstants,
    /// Weak points as generated from the pristine layout
    base_points: Vec<WeakPoint>,
    /// Weak points scaled by live degradation
    weak_points: Vec<WeakPoint>,
    refresh_timer: f64,
    /// Candidate weak points per spatial cell. Refreshes only rescale
    /// vulnerability, so the geometry stays valid.
    cell_cache: HashMap<CellKey, Vec<usize>>,
    rng: ChaCha8Rng,
    stats: CriticalHitStats,
}

impl CriticalHitDetector {
    pub fn new(config: Arc<ShipArmorConfiguration>, constants: CriticalHitConstants, seed: u64) -> Self {
        let base_points = generate_weak_points(&config);
        CriticalHitDetector {
            constants,
            weak_points: base_points.clone(),
            base_points,
            refresh_timer: 0.0,
            cell_cache: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: CriticalHitStats::default(),
        }
    }

    pub fn weak_points(&self) -> &[WeakPoint] {
        &self.weak_points
    }

    pub fn stats(&self) -> &CriticalHitStats {
        &self.stats
    }

    pub fn constants(&self) -> &CriticalHitConstants {
        &self.constants
    }

    /// Rescale weak points from live zone degradation
    pub fn refresh(&mut self, degradation: &ArmorDegradationTracker) {
        self.weak_points = self
            .base_points
            .iter()
            .map(|base| {
                let wear = degradation.zone_degradation(&base.zone);
                WeakPoint {
                    vulnerability: base.vulnerability * (1.0 + wear),
                    bypass_potential: (base.bypass_potential * (1.0 + 2.0 * wear)).min(1.0),
                    ..base.clone()
                }
            })
            .collect();
        self.refresh_timer = 0.0;
    }

    /// Advance the refresh timer, refreshing weak points when it elapses
    pub fn tick(&mut self, delta: f64, degradation: &ArmorDegradationTracker) {
        self.refresh_timer += delta.max(0.0);
        if self.refresh_timer >= self.constants.refresh_interval {
            self.refresh(degradation);
        }
    }

    /// Critical chance before any weak-point bonus
    pub fn critical_chance(&self, damage_type: DamageType, weapon_bonus: f64, zone_degradation: f64) -> f64 {
        (self.constants.base_chance
            + weapon_bonus
            + type_critical_bonus(damage_type)
            + zone_degradation.clamp(0.0, 1.0) * self.constants.degradation_bonus)
            .clamp(0.0, self.constants.max_chance)
    }

    fn cell_key(point: DVec3) -> CellKey {
        let cell = (point / WEAK_POINT_CELL_SIZE).floor();
        (cell.x as i64, cell.y as i64, cell.z as i64)
    }

    fn candidates(&mut self, key: CellKey) -> &[usize] {
        if !self.cell_cache.contains_key(&key) && self.cell_cache.len() >= self.constants.max_cached_cells {
            self.cell_cache.clear();
        }

        let weak_points = &self.weak_points;
        self.cell_cache.entry(key).or_insert_with(|| {
            let min = DVec3::new(key.0 as f64, key.1 as f64, key.2 as f64) * WEAK_POINT_CELL_SIZE;
            let cell = Bounds::new(min, min + DVec3::splat(WEAK_POINT_CELL_SIZE));
            weak_points
                .iter()
                .enumerate()
                .filter(|(_, wp)| cell.distance_to(wp.location) <= wp.radius)
                .map(|(i, _)| i)
                .collect()
        })
    }

    /// Nearest weak point whose radius covers the point.
    /// Equidistant weak points resolve to the more vulnerable one.
    pub fn find_weak_point(&mut self, local_point: DVec3) -> Option<&WeakPoint> {
        let key = Self::cell_key(local_point);
        let candidates = self.candidates(key).to_vec();
        let best = candidates
            .into_iter()
            .filter_map(|i| {
                let wp = &self.weak_points[i];
                let distance = wp.location.distance(local_point);
                (distance <= wp.radius).then_some((i, distance, wp.vulnerability))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.2.total_cmp(&a.2)))
            .map(|(i, _, _)| i);
        best.map(|i| &self.weak_points[i])
    }

    /// Analyze a hit: roll for a critical, look for a weak point, and test
    /// whether the round bypasses the armor.
    pub fn analyze_hit(
        &mut self,
        local_point: DVec3,
        damage_type: DamageType,
        weapon: Option<&WeaponHit>,
        armor_thickness: f64,
        zone_degradation: f64,
    ) -> CriticalHitResult {
        let weak_point = self.find_weak_point(local_point).cloned();

        let weapon_bonus = weapon.map(|w| w.critical_bonus).unwrap_or(0.0);
        let point_bonus = weak_point.as_ref().map(|wp| wp.critical_bonus).unwrap_or(0.0);
        let chance = (self.critical_chance(damage_type, weapon_bonus, zone_degradation) + point_bonus)
            .clamp(0.0, self.constants.max_chance);
        let critical = self.rng.gen::<f64>() < chance;

        let bypass = self.check_bypass(weapon, armor_thickness, weak_point.as_ref(), zone_degradation);

        let mut multiplier = 1.0;
        if critical {
            multiplier *= self.constants.critical_multiplier;
        }
        if let Some(wp) = &weak_point {
            multiplier *= wp.vulnerability;
        }
        if bypass {
            multiplier *= self.constants.bypass_multiplier;
        }

        let classification = HitClassification::classify(critical, weak_point.is_some(), bypass);
        self.stats.total_hits += 1;
        self.stats.counts[classification.index()] += 1;
        self.stats.total_multiplier += multiplier;

        tracing::debug!(
            "Hit analysis at {:?}: {:?} (chance {:.3}, multiplier {:.2})",
            local_point,
            classification,
            chance,
            multiplier
        );

        CriticalHitResult {
            classification,
            multiplier,
            chance,
            critical,
            bypass,
            weak_point,
        }
    }

    fn check_bypass(
        &mut self,
        weapon: Option<&WeaponHit>,
        armor_thickness: f64,
        weak_point: Option<&WeakPoint>,
        zone_degradation: f64,
    ) -> bool {
        // Nothing to bypass on bare hull
        if armor_thickness <= 0.0 {
            return false;
        }

        if let Some(w) = weapon {
            if w.penetration_power / armor_thickness >= self.constants.bypass_ratio {
                return true;
            }
        }

        match weak_point {
            Some(wp) if wp.kind == WeakPointType::Joint => {
                let chance = (wp.bypass_potential * (zone_degradation.clamp(0.0, 1.0) + 0.1)).min(1.0);
                self.rng.gen::<f64>() < chance
            }
            _ => false,
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = CriticalHitStats::default();
    }

    pub fn save_data(&self) -> SaveData {
        to_save_data(&CriticalHitSave {
            stats: self.stats.clone(),
            refresh_timer: self.refresh_timer,
            weak_points: self.weak_points.clone(),
        })
    }

    /// Restore stats and the degraded weak points. Saved weak points that do
    /// not line up with this ship's layout are ignored and the current ones kept.
    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: CriticalHitSave = from_save_data(data)?;
        self.stats = save.stats;
        self.refresh_timer = save.refresh_timer.max(0.0);

        let matches_layout = save.weak_points.len() == self.base_points.len()
            && save
                .weak_points
                .iter()
                .zip(&self.base_points)
                .all(|(saved, base)| saved.kind == base.kind && saved.zone == base.zone);
        if matches_layout {
            self.weak_points = save.weak_points;
        } else if !save.weak_points.is_empty() {
            tracing::warn!(
                "Ignoring {} saved weak points that do not match the armor layout",
                save.weak_points.len()
            );
        }
        Ok(())
    }
}

fn structural_point(zone: &ArmorZone) -> WeakPoint {
    WeakPoint {
        kind: WeakPointType::Structural,
        zone: zone.name.clone(),
        location: zone.bounds.center(),
        radius: zone.bounds.size().min_element() * 0.25,
        vulnerability: 1.1 * zone.vulnerability,
        critical_bonus: 0.05,
        bypass_potential: 0.05,
    }
}

fn subsystem_point(zone: &ArmorZone) -> WeakPoint {
    WeakPoint {
        kind: WeakPointType::Subsystem,
        zone: zone.name.clone(),
        location: zone.bounds.center(),
        radius: zone.bounds.size().min_element() * 0.4,
        vulnerability: 1.5 * zone.vulnerability,
        critical_bonus: 0.15,
        bypass_potential: 0.1,
    }
}

/// Joint at the centre of the face two zones share
fn joint_point(a: &ArmorZone, b: &ArmorZone) -> Option<WeakPoint> {
    let min = a.bounds.min.max(b.bounds.min);
    let max = a.bounds.max.min(b.bounds.max);
    if !min.cmple(max).all() {
        return None;
    }

    let radius = a.bounds.size().min_element().min(b.bounds.size().min_element()) * 0.2;
    Some(WeakPoint {
        kind: WeakPointType::Joint,
        zone: a.name.clone(),
        location: (min + max) * 0.5,
        radius,
        vulnerability: 1.25,
        critical_bonus: 0.1,
        bypass_potential: 0.3,
    })
}

/// Weak points for a zone layout: structural at every zone centre,
/// subsystems in the core, stern and bridge, joints where the side
/// plating meets the bow and stern sections.
pub fn generate_weak_points(config: &ShipArmorConfiguration) -> Vec<WeakPoint> {
    let mut points: Vec<WeakPoint> = config.zones().iter().map(structural_point).collect();

    points.extend(
        config
            .zones()
            .iter()
            .filter(|z| matches!(z.role, ZoneRole::Core | ZoneRole::Stern | ZoneRole::Bridge))
            .map(subsystem_point),
    );

    let pairs = [
        (ZoneRole::Bow, ZoneRole::Port),
        (ZoneRole::Bow, ZoneRole::Starboard),
        (ZoneRole::Port, ZoneRole::Stern),
        (ZoneRole::Starboard, ZoneRole::Stern),
    ];
    for (a, b) in pairs {
        if let (Some(za), Some(zb)) = (config.zone_by_role(a), config.zone_by_role(b)) {
            points.extend(joint_point(za, zb));
        }
    }

    points
}
