//! Ship armor configuration - zone geometry per archetype
//!
//! Built once at spawn from a `ShipClass` and never mutated afterwards, so
//! ships of the same class can share one copy behind an `Arc`. Live wear is
//! tracked separately by the degradation tracker.

use crate::config::ShipClass;
use crate::types::{ArmorClass, ShipType};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds in ship-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Bounds {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    pub fn surface_area(&self) -> f64 {
        let s = self.size();
        2.0 * (s.x * s.y + s.y * s.z + s.x * s.z)
    }

    /// Distance from a point to the box (0 inside)
    pub fn distance_to(&self, point: DVec3) -> f64 {
        let clamped = point.clamp(self.min, self.max);
        clamped.distance(point)
    }
}

/// Functional role of a zone, used to pick critical events and weak points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRole {
    Bow,
    Stern,
    Port,
    Starboard,
    Bridge,
    Core,
}

/// A named armor zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorZone {
    pub name: String,
    pub role: ZoneRole,
    pub armor_class: ArmorClass,
    pub base_thickness: f64,
    /// Fraction of the zone surface actually plated (0.0 - 1.0)
    pub coverage: f64,
    pub bounds: Bounds,
    /// Damage multiplier for hits landing here (1.0 = normal)
    pub vulnerability: f64,
    /// Structural integrity scalar of the frame under the plating (0.0 - 1.0)
    pub structural_integrity: f64,
    /// Repair effort multiplier (1.0 = normal)
    pub repair_difficulty: f64,
}

impl ArmorZone {
    /// Thickness after coverage and frame integrity
    pub fn effective_thickness(&self) -> f64 {
        self.base_thickness * self.coverage * self.structural_integrity
    }

    /// Critical zones raise damage for hits inside them
    pub fn is_critical(&self) -> bool {
        self.vulnerability > 1.0
    }
}

/// What armor applies at a local point
#[derive(Debug, Clone, PartialEq)]
pub struct ArmorSample<'a> {
    pub zone: &'a ArmorZone,
    pub armor_class: ArmorClass,
    pub thickness: f64,
    /// Point lies inside the zone bounds (false when snapped to the nearest zone)
    pub inside: bool,
}

/// Zone layout for one ship archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipArmorConfiguration {
    pub ship_type: ShipType,
    pub armor_class: ArmorClass,
    zones: Vec<ArmorZone>,
}

impl ShipArmorConfiguration {
    /// Build a configuration from explicit zones
    pub fn new(ship_type: ShipType, armor_class: ArmorClass, zones: Vec<ArmorZone>) -> Self {
        ShipArmorConfiguration {
            ship_type,
            armor_class,
            zones,
        }
    }

    /// Standard six-zone layout for a ship class
    pub fn from_ship_class(class: &ShipClass) -> Self {
        Self::for_archetype(class.ship_type, class.armor_type, class.armor_thickness)
    }

    /// Standard six-zone layout: bow, stern, port, starboard, bridge, core
    pub fn for_archetype(ship_type: ShipType, armor_class: ArmorClass, thickness: f64) -> Self {
        let h = ship_type.half_extents();
        let third = h.z / 3.0;

        let zone = |name: &str,
                    role: ZoneRole,
                    class: ArmorClass,
                    thickness_mult: f64,
                    min: DVec3,
                    max: DVec3,
                    vulnerability: f64,
                    repair_difficulty: f64| ArmorZone {
            name: name.to_string(),
            role,
            armor_class: class,
            base_thickness: thickness * thickness_mult,
            coverage: if class == ArmorClass::None { 0.0 } else { 1.0 },
            bounds: Bounds::new(min, max),
            vulnerability,
            structural_integrity: 1.0,
            repair_difficulty,
        };

        let zones = vec![
            zone(
                "bow",
                ZoneRole::Bow,
                armor_class,
                1.2,
                DVec3::new(-h.x, -h.y, third),
                DVec3::new(h.x, h.y, h.z),
                1.0,
                1.0,
            ),
            zone(
                "stern",
                ZoneRole::Stern,
                armor_class.lighter().max(armor_class.min(ArmorClass::Light)),
                0.8,
                DVec3::new(-h.x, -h.y, -h.z),
                DVec3::new(h.x, h.y, -third),
                1.5,
                1.4,
            ),
            zone(
                "port",
                ZoneRole::Port,
                armor_class,
                1.0,
                DVec3::new(-h.x, -h.y, -third),
                DVec3::new(0.0, h.y, third),
                1.0,
                1.0,
            ),
            zone(
                "starboard",
                ZoneRole::Starboard,
                armor_class,
                1.0,
                DVec3::new(0.0, -h.y, -third),
                DVec3::new(h.x, h.y, third),
                1.0,
                1.0,
            ),
            zone(
                "bridge",
                ZoneRole::Bridge,
                armor_class,
                0.9,
                DVec3::new(-h.x * 0.3, h.y * 0.5, -third * 0.5),
                DVec3::new(h.x * 0.3, h.y, third * 0.5),
                1.3,
                1.2,
            ),
            zone(
                "core",
                ZoneRole::Core,
                armor_class.heavier().min(if armor_class == ArmorClass::None {
                    ArmorClass::None
                } else {
                    ArmorClass::SuperCapital
                }),
                1.5,
                DVec3::new(-h.x * 0.25, -h.y * 0.25, -third * 0.5),
                DVec3::new(h.x * 0.25, h.y * 0.25, third * 0.5),
                2.0,
                2.0,
            ),
        ];

        ShipArmorConfiguration {
            ship_type,
            armor_class,
            zones,
        }
    }

    pub fn zones(&self) -> &[ArmorZone] {
        &self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&ArmorZone> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn zone_by_role(&self, role: ZoneRole) -> Option<&ArmorZone> {
        self.zones.iter().find(|z| z.role == role)
    }

    /// Zone at a local point: the smallest containing zone, else the nearest
    pub fn zone_at(&self, local_point: DVec3) -> Option<&ArmorZone> {
        self.sample_zone(local_point).map(|(zone, _)| zone)
    }

    fn sample_zone(&self, local_point: DVec3) -> Option<(&ArmorZone, bool)> {
        let containing = self
            .zones
            .iter()
            .filter(|z| z.bounds.contains(local_point))
            .min_by(|a, b| a.bounds.volume().total_cmp(&b.bounds.volume()));

        if let Some(zone) = containing {
            return Some((zone, true));
        }

        self.zones
            .iter()
            .min_by(|a, b| {
                a.bounds
                    .distance_to(local_point)
                    .total_cmp(&b.bounds.distance_to(local_point))
            })
            .map(|zone| (zone, false))
    }

    /// What armor applies at a local point
    pub fn armor_at(&self, local_point: DVec3) -> Option<ArmorSample<'_>> {
        self.sample_zone(local_point).map(|(zone, inside)| ArmorSample {
            zone,
            armor_class: zone.armor_class,
            thickness: zone.effective_thickness(),
            inside,
        })
    }

    /// Zones that raise damage for hits inside them
    pub fn critical_zones(&self) -> impl Iterator<Item = &ArmorZone> {
        self.zones.iter().filter(|z| z.is_critical())
    }

    /// Surface-area weighted plating coverage (0.0 - 1.0)
    pub fn total_coverage(&self) -> f64 {
        let total_area: f64 = self.zones.iter().map(|z| z.bounds.surface_area()).sum();
        if total_area <= 0.0 {
            return 0.0;
        }
        self.zones
            .iter()
            .map(|z| z.bounds.surface_area() * z.coverage)
            .sum::<f64>()
            / total_area
    }

    /// Estimated armor mass: plated surface x thickness x density
    pub fn armor_mass(&self) -> f64 {
        self.zones
            .iter()
            .map(|z| z.bounds.surface_area() * z.coverage * z.base_thickness * 0.01 * z.armor_class.density())
            .sum()
    }

    /// Protection rating: area-weighted resistance-scaled thickness
    pub fn protection_rating(&self) -> f64 {
        let total_area: f64 = self.zones.iter().map(|z| z.bounds.surface_area()).sum();
        if total_area <= 0.0 {
            return 0.0;
        }
        self.zones
            .iter()
            .map(|z| {
                let class_rating = (z.armor_class.index() as f64 + 1.0) / 6.0;
                z.bounds.surface_area() * z.effective_thickness() * class_rating / z.vulnerability.max(0.1)
            })
            .sum::<f64>()
            / total_area
    }

    /// Zone with the lowest effective thickness per unit of vulnerability
    pub fn weakest_zone(&self) -> Option<&ArmorZone> {
        self.zones.iter().min_by(|a, b| {
            let wa = a.effective_thickness() / a.vulnerability.max(0.1);
            let wb = b.effective_thickness() / b.vulnerability.max(0.1);
            wa.total_cmp(&wb)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frigate() -> ShipArmorConfiguration {
        ShipArmorConfiguration::for_archetype(ShipType::Frigate, ArmorClass::Standard, 10.0)
    }

    #[test]
    fn test_six_zones() {
        let config = frigate();
        assert_eq!(config.zones().len(), 6);
        assert!(config.zone("core").is_some());
        assert!(config.zone("hangar").is_none());
    }

    #[test]
    fn test_zone_at_prefers_smallest_containing() {
        let config = frigate();
        // Origin is inside port/starboard and the core; core is smallest
        let zone = config.zone_at(DVec3::ZERO).unwrap();
        assert_eq!(zone.role, ZoneRole::Core);
    }

    #[test]
    fn test_zone_at_bow_and_stern() {
        let config = frigate();
        assert_eq!(config.zone_at(DVec3::new(0.0, 0.0, 25.0)).unwrap().role, ZoneRole::Bow);
        assert_eq!(config.zone_at(DVec3::new(0.0, 0.0, -25.0)).unwrap().role, ZoneRole::Stern);
        assert_eq!(config.zone_at(DVec3::new(-8.0, 0.0, 0.0)).unwrap().role, ZoneRole::Port);
        assert_eq!(config.zone_at(DVec3::new(8.0, -4.0, 0.0)).unwrap().role, ZoneRole::Starboard);
    }

    #[test]
    fn test_outside_point_snaps_to_nearest() {
        let config = frigate();
        let sample = config.armor_at(DVec3::new(0.0, 0.0, 80.0)).unwrap();
        assert_eq!(sample.zone.role, ZoneRole::Bow);
        assert!(!sample.inside);
    }

    #[test]
    fn test_bow_thickness_multiplier() {
        let config = frigate();
        let bow = config.zone("bow").unwrap();
        assert!((bow.effective_thickness() - 12.0).abs() < 1e-9);
        assert_eq!(config.zone("core").unwrap().armor_class, ArmorClass::Heavy);
        assert_eq!(config.zone("stern").unwrap().armor_class, ArmorClass::Light);
    }

    #[test]
    fn test_unarmored_layout() {
        let config = ShipArmorConfiguration::for_archetype(ShipType::Fighter, ArmorClass::None, 0.0);
        assert!(config.zones().iter().all(|z| z.armor_class == ArmorClass::None));
        assert!(config.total_coverage().abs() < f64::EPSILON);
        assert!(config.armor_mass().abs() < f64::EPSILON);
    }

    #[test]
    fn test_critical_zones() {
        let config = frigate();
        let names: Vec<&str> = config.critical_zones().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["stern", "bridge", "core"]);
    }

    #[test]
    fn test_heavier_armor_rates_higher() {
        let light = ShipArmorConfiguration::for_archetype(ShipType::Cruiser, ArmorClass::Light, 10.0);
        let heavy = ShipArmorConfiguration::for_archetype(ShipType::Cruiser, ArmorClass::Heavy, 10.0);
        assert!(heavy.protection_rating() > light.protection_rating());
        assert!(heavy.armor_mass() > light.armor_mass());
        assert!((heavy.total_coverage() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weakest_zone_is_stern() {
        let config = frigate();
        assert_eq!(config.weakest_zone().unwrap().role, ZoneRole::Stern);
    }
}
