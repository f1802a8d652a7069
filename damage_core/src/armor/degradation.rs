//! Armor degradation - per-zone wear, fatigue and failure prediction
//!
//! Impact degradation per hit:
//! `damage / (thickness * impact_scale) * type_factor * stress_concentration`
//! where `stress_concentration = min(3, 1 + 0.02 * impacts + 0.5 * fatigue)`.
//! Prior damage therefore makes later hits on the same zone count for more.

use super::configuration::ShipArmorConfiguration;
use crate::config::DegradationConstants;
use crate::error::DamageError;
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::DamageType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

const MAX_STRESS_CONCENTRATION: f64 = 3.0;

/// How strongly a damage type wears down plating
pub fn degradation_factor(damage_type: DamageType) -> f64 {
    match damage_type {
        DamageType::Kinetic => 1.2,
        DamageType::Explosive => 1.5,
        DamageType::Plasma => 1.3,
        DamageType::Energy => 0.7,
        DamageType::Beam => 0.8,
        DamageType::Emp => 0.1,
        DamageType::Ion => 0.2,
    }
}

/// One entry in a zone's impact history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub time: f64,
    pub damage: f64,
    pub damage_type: DamageType,
    /// Degradation added by this impact
    pub degradation: f64,
    /// Zone total degradation right after this impact
    pub total_after: f64,
}

/// Wear state of one armor zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorDegradationRecord {
    pub total_degradation: f64,
    pub impact_degradation: f64,
    pub thermal_degradation: f64,
    /// Permanent wear accumulated by repairs
    pub repair_degradation: f64,
    pub fatigue_level: f64,
    pub impact_count: u32,
    pub repair_cycles: u32,
    pub history: VecDeque<ImpactRecord>,
}

impl ArmorDegradationRecord {
    fn recompute_total(&mut self) {
        self.impact_degradation = self.impact_degradation.clamp(0.0, 1.0);
        self.thermal_degradation = self.thermal_degradation.clamp(0.0, 1.0);
        self.repair_degradation = self.repair_degradation.clamp(0.0, 1.0);
        self.fatigue_level = self.fatigue_level.clamp(0.0, 1.0);
        self.total_degradation =
            (self.impact_degradation + self.thermal_degradation + self.repair_degradation).clamp(0.0, 1.0);
    }

    /// Multiplier applied to new impact degradation
    pub fn stress_concentration(&self) -> f64 {
        (1.0 + 0.02 * self.impact_count as f64 + 0.5 * self.fatigue_level).min(MAX_STRESS_CONCENTRATION)
    }

    /// Remaining armor effectiveness (1.0 = pristine)
    pub fn effectiveness(&self) -> f64 {
        1.0 - self.total_degradation
    }
}

/// Read-only degradation snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationStatus {
    pub zone: String,
    pub total: f64,
    pub impact: f64,
    pub thermal: f64,
    pub repair: f64,
    pub fatigue: f64,
    pub impact_count: u32,
    pub repair_cycles: u32,
    pub effectiveness: f64,
    pub stress_concentration: f64,
    pub time_to_failure: Option<f64>,
}

/// Zone ranked for maintenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceItem {
    pub zone: String,
    pub priority: f64,
    pub total_degradation: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct ZoneInfo {
    thickness: f64,
    vulnerability: f64,
    repair_difficulty: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct DegradationSave {
    time: f64,
    zones: BTreeMap<String, ArmorDegradationRecord>,
}

/// Tracks wear for every zone of one ship
#[derive(Debug, Clone)]
pub struct ArmorDegradationTracker {
    constants: DegradationConstants,
    records: BTreeMap<String, ArmorDegradationRecord>,
    zone_info: BTreeMap<String, ZoneInfo>,
    time: f64,
}

impl ArmorDegradationTracker {
    pub fn new(config: &ShipArmorConfiguration, constants: DegradationConstants) -> Self {
        let mut records = BTreeMap::new();
        let mut zone_info = BTreeMap::new();
        for zone in config.zones() {
            records.insert(zone.name.clone(), ArmorDegradationRecord::default());
            zone_info.insert(
                zone.name.clone(),
                ZoneInfo {
                    thickness: zone.base_thickness,
                    vulnerability: zone.vulnerability,
                    repair_difficulty: zone.repair_difficulty,
                },
            );
        }

        ArmorDegradationTracker {
            constants,
            records,
            zone_info,
            time: 0.0,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn record(&self, zone: &str) -> Option<&ArmorDegradationRecord> {
        self.records.get(zone)
    }

    /// Total degradation of a zone (0.0 for unknown zones)
    pub fn zone_degradation(&self, zone: &str) -> f64 {
        self.records.get(zone).map(|r| r.total_degradation).unwrap_or(0.0)
    }

    /// Remaining effectiveness of a zone (1.0 for unknown zones)
    pub fn effectiveness(&self, zone: &str) -> f64 {
        self.records.get(zone).map(|r| r.effectiveness()).unwrap_or(1.0)
    }

    fn parts(&mut self, zone: &str) -> Result<(&mut ArmorDegradationRecord, &ZoneInfo), DamageError> {
        match (self.records.get_mut(zone), self.zone_info.get(zone)) {
            (Some(record), Some(info)) => Ok((record, info)),
            _ => Err(DamageError::UnknownZone(zone.to_string())),
        }
    }

    /// Record an impact on a zone, returning the degradation it added
    pub fn record_impact(&mut self, zone: &str, damage: f64, damage_type: DamageType) -> Result<f64, DamageError> {
        if damage < 0.0 || !damage.is_finite() {
            return Err(DamageError::InvalidParameter("impact damage must be finite and >= 0"));
        }

        let time = self.time;
        let impact_scale = self.constants.impact_scale;
        let thermal_scale = self.constants.thermal_scale;
        let history_size = self.constants.history_size;
        let (record, info) = self.parts(zone)?;
        let thickness = info.thickness.max(1.0);

        let base = damage / (thickness * impact_scale);
        let added = base * degradation_factor(damage_type) * record.stress_concentration();

        record.impact_degradation += added;
        record.fatigue_level += added * 0.5;
        if damage_type.is_thermal() {
            record.thermal_degradation += damage / (thickness * thermal_scale);
        }
        record.impact_count += 1;
        record.recompute_total();

        record.history.push_back(ImpactRecord {
            time,
            damage,
            damage_type,
            degradation: added,
            total_after: record.total_degradation,
        });
        while record.history.len() > history_size {
            record.history.pop_front();
        }

        Ok(added)
    }

    /// Heat a zone (beam exposure, stellar corona), returning the thermal wear added
    pub fn apply_thermal(&mut self, zone: &str, heat: f64) -> Result<f64, DamageError> {
        if heat < 0.0 || !heat.is_finite() {
            return Err(DamageError::InvalidParameter("heat must be finite and >= 0"));
        }
        let thermal_scale = self.constants.thermal_scale;
        let (record, info) = self.parts(zone)?;
        let before = record.thermal_degradation;
        record.thermal_degradation += heat / (info.thickness.max(1.0) * thermal_scale);
        record.recompute_total();
        Ok(record.thermal_degradation - before)
    }

    /// Repair a zone, returning the degradation removed.
    ///
    /// Every repair cycle leaves a little permanent wear behind.
    pub fn repair(&mut self, zone: &str, amount: f64) -> Result<f64, DamageError> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DamageError::InvalidParameter("repair amount must be finite and > 0"));
        }
        let repair_wear = self.constants.repair_degradation;
        let (record, info) = self.parts(zone)?;

        let from_impact = amount.min(record.impact_degradation);
        record.impact_degradation -= from_impact;
        let from_thermal = (amount - from_impact).min(record.thermal_degradation);
        record.thermal_degradation -= from_thermal;

        record.fatigue_level -= amount * 0.5;
        record.repair_degradation += repair_wear * info.repair_difficulty;
        record.repair_cycles += 1;
        record.recompute_total();

        Ok(from_impact + from_thermal)
    }

    /// Advance time: fatigue and heat slowly bleed off
    pub fn tick(&mut self, delta: f64) {
        if delta <= 0.0 {
            return;
        }
        self.time += delta;
        let fatigue_loss = self.constants.fatigue_recovery_rate * delta;
        let thermal_loss = self.constants.thermal_recovery_rate * delta;
        for record in self.records.values_mut() {
            record.fatigue_level -= fatigue_loss;
            record.thermal_degradation -= thermal_loss;
            record.recompute_total();
        }
    }

    /// Seconds until the zone's degradation reaches 1.0 at the recent impact rate.
    ///
    /// Uses a least-squares fit of total degradation against time over the
    /// most recent impacts inside the prediction window.
    pub fn predict_time_to_failure(&self, zone: &str) -> Option<f64> {
        let record = self.records.get(zone)?;
        if record.total_degradation >= 1.0 {
            return Some(0.0);
        }

        let window_start = self.time - self.constants.prediction_window;
        let samples: Vec<(f64, f64)> = record
            .history
            .iter()
            .rev()
            .filter(|r| r.time >= window_start)
            .take(self.constants.prediction_samples)
            .map(|r| (r.time, r.total_after))
            .collect();

        if samples.len() < 2 {
            return None;
        }

        let n = samples.len() as f64;
        let mean_t = samples.iter().map(|(t, _)| t).sum::<f64>() / n;
        let mean_d = samples.iter().map(|(_, d)| d).sum::<f64>() / n;
        let var_t: f64 = samples.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();
        if var_t <= f64::EPSILON {
            return None;
        }
        let cov: f64 = samples.iter().map(|(t, d)| (t - mean_t) * (d - mean_d)).sum();
        let slope = cov / var_t;

        if slope <= 0.0 {
            return None;
        }
        Some((1.0 - record.total_degradation) / slope)
    }

    /// Zones ranked by `total * vulnerability * (1 + fatigue)`, most urgent first
    pub fn maintenance_priorities(&self) -> Vec<MaintenanceItem> {
        let mut items: Vec<MaintenanceItem> = self
            .records
            .iter()
            .filter(|(_, r)| r.total_degradation > 0.0)
            .map(|(name, r)| {
                let vulnerability = self.zone_info.get(name).map(|i| i.vulnerability).unwrap_or(1.0);
                MaintenanceItem {
                    zone: name.clone(),
                    priority: r.total_degradation * vulnerability * (1.0 + r.fatigue_level),
                    total_degradation: r.total_degradation,
                }
            })
            .collect();
        items.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        items
    }

    pub fn get_degradation_status(&self, zone: &str) -> Option<DegradationStatus> {
        let record = self.records.get(zone)?;
        Some(DegradationStatus {
            zone: zone.to_string(),
            total: record.total_degradation,
            impact: record.impact_degradation,
            thermal: record.thermal_degradation,
            repair: record.repair_degradation,
            fatigue: record.fatigue_level,
            impact_count: record.impact_count,
            repair_cycles: record.repair_cycles,
            effectiveness: record.effectiveness(),
            stress_concentration: record.stress_concentration(),
            time_to_failure: self.predict_time_to_failure(zone),
        })
    }

    /// Zone names in stable order
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }

    pub fn save_data(&self) -> SaveData {
        to_save_data(&DegradationSave {
            time: self.time,
            zones: self.records.clone(),
        })
    }

    /// Restore wear state. Zones missing from the save start pristine;
    /// zones this ship does not have are ignored.
    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: DegradationSave = from_save_data(data)?;
        let history_size = self.constants.history_size;

        let mut records = BTreeMap::new();
        for name in self.zone_info.keys() {
            let mut record = save.zones.get(name).cloned().unwrap_or_default();
            while record.history.len() > history_size {
                record.history.pop_front();
            }
            record.recompute_total();
            records.insert(name.clone(), record);
        }

        self.records = records;
        self.time = save.time.max(0.0);
        Ok(())
    }
}
