//! Subsystem lookup and damage
//!
//! The hull manager only needs two things from the ship's subsystems: which
//! ones sit near a point, and how much damage each actually took.
//! `SubsystemGrid` answers the first with a uniform spatial hash instead of
//! walking every subsystem per hit.

use crate::error::DamageError;
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::ShipType;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

type CellKey = (i64, i64, i64);

/// Opaque reference to a subsystem inside a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsystemRef(pub usize);

/// A subsystem found near a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbySubsystem {
    pub subsystem: SubsystemRef,
    pub distance: f64,
}

/// Ship subsystems as seen by the damage model
pub trait SubsystemProvider: Debug + Send + Sync {
    /// Live subsystems within `radius` of a ship-local point
    fn get_subsystems_near_location(&self, point: DVec3, radius: f64) -> Vec<NearbySubsystem>;

    /// Damage a subsystem, returning the damage it actually took
    fn apply_damage(&mut self, subsystem: SubsystemRef, amount: f64, point: DVec3) -> f64;

    /// Health fraction (0.0 - 1.0) of a named subsystem, if present
    fn health_fraction(&self, _name: &str) -> Option<f64> {
        None
    }

    fn save_data(&self) -> SaveData {
        SaveData::new()
    }

    fn load_save_data(&mut self, _data: &SaveData) -> Result<(), DamageError> {
        Ok(())
    }
}

/// A named subsystem at a fixed ship-local location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsystem {
    pub name: String,
    pub location: DVec3,
    pub max_health: f64,
    pub health: f64,
}

impl Subsystem {
    pub fn is_operational(&self) -> bool {
        self.health > 0.0
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct GridSave {
    /// (name, health) pairs
    health: Vec<(String, f64)>,
}

/// Subsystems indexed by a uniform spatial hash
#[derive(Debug, Clone)]
pub struct SubsystemGrid {
    cell_size: f64,
    subsystems: Vec<Subsystem>,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl SubsystemGrid {
    pub fn new(cell_size: f64) -> Self {
        SubsystemGrid {
            cell_size: cell_size.max(0.1),
            subsystems: Vec::new(),
            cells: HashMap::new(),
        }
    }

    /// Standard subsystem layout for a hull archetype.
    /// Total subsystem health is `subsystem_health_pool`, split by importance.
    pub fn for_archetype(ship_type: ShipType, subsystem_health_pool: f64) -> Self {
        let h = ship_type.half_extents();
        let mut grid = SubsystemGrid::new((h.x.min(h.y) * 0.5).max(1.0));

        let layout = [
            ("reactor", DVec3::ZERO, 0.2),
            ("engines", DVec3::new(0.0, 0.0, -h.z * 0.8), 0.15),
            ("bridge", DVec3::new(0.0, h.y * 0.75, 0.0), 0.1),
            ("shield_generator", DVec3::new(0.0, -h.y * 0.5, -h.z * 0.3), 0.15),
            ("sensors", DVec3::new(0.0, 0.0, h.z * 0.8), 0.1),
            ("weapons_port", DVec3::new(-h.x * 0.7, 0.0, h.z * 0.2), 0.1),
            ("weapons_starboard", DVec3::new(h.x * 0.7, 0.0, h.z * 0.2), 0.1),
            ("life_support", DVec3::new(0.0, 0.0, h.z * 0.3), 0.1),
        ];
        for (name, location, share) in layout {
            grid.add(name, location, subsystem_health_pool * share);
        }
        grid
    }

    fn cell_key(&self, point: DVec3) -> CellKey {
        let cell = (point / self.cell_size).floor();
        (cell.x as i64, cell.y as i64, cell.z as i64)
    }

    pub fn add(&mut self, name: &str, location: DVec3, max_health: f64) -> SubsystemRef {
        let index = self.subsystems.len();
        self.subsystems.push(Subsystem {
            name: name.to_string(),
            location,
            max_health: max_health.max(0.0),
            health: max_health.max(0.0),
        });
        let key = self.cell_key(location);
        self.cells.entry(key).or_default().push(index);
        SubsystemRef(index)
    }

    pub fn get(&self, subsystem: SubsystemRef) -> Option<&Subsystem> {
        self.subsystems.get(subsystem.0)
    }

    pub fn find(&self, name: &str) -> Option<SubsystemRef> {
        self.subsystems.iter().position(|s| s.name == name).map(SubsystemRef)
    }

    pub fn subsystems(&self) -> &[Subsystem] {
        &self.subsystems
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    /// Sum of current health over all subsystems
    pub fn total_health(&self) -> f64 {
        self.subsystems.iter().map(|s| s.health).sum()
    }

    /// Repair one subsystem, returning the health restored
    pub fn repair(&mut self, subsystem: SubsystemRef, amount: f64) -> f64 {
        match self.subsystems.get_mut(subsystem.0) {
            Some(s) if amount > 0.0 => {
                let restored = amount.min(s.max_health - s.health).max(0.0);
                s.health += restored;
                restored
            }
            _ => 0.0,
        }
    }
}

impl SubsystemProvider for SubsystemGrid {
    fn get_subsystems_near_location(&self, point: DVec3, radius: f64) -> Vec<NearbySubsystem> {
        if radius < 0.0 {
            return Vec::new();
        }
        let min = self.cell_key(point - DVec3::splat(radius));
        let max = self.cell_key(point + DVec3::splat(radius));

        let mut found = Vec::new();
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                for z in min.2..=max.2 {
                    let Some(indices) = self.cells.get(&(x, y, z)) else {
                        continue;
                    };
                    for &i in indices {
                        let s = &self.subsystems[i];
                        let distance = s.location.distance(point);
                        if s.is_operational() && distance <= radius {
                            found.push(NearbySubsystem {
                                subsystem: SubsystemRef(i),
                                distance,
                            });
                        }
                    }
                }
            }
        }
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.subsystem.cmp(&b.subsystem)));
        found
    }

    fn apply_damage(&mut self, subsystem: SubsystemRef, amount: f64, _point: DVec3) -> f64 {
        match self.subsystems.get_mut(subsystem.0) {
            Some(s) if amount > 0.0 => {
                let actual = amount.min(s.health);
                s.health -= actual;
                if s.health <= 0.0 && actual > 0.0 {
                    tracing::info!("Subsystem {} destroyed", s.name);
                }
                actual
            }
            _ => 0.0,
        }
    }

    fn health_fraction(&self, name: &str) -> Option<f64> {
        self.subsystems
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.health_fraction())
    }

    fn save_data(&self) -> SaveData {
        to_save_data(&GridSave {
            health: self
                .subsystems
                .iter()
                .map(|s| (s.name.clone(), s.health))
                .collect(),
        })
    }

    fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: GridSave = from_save_data(data)?;
        for (name, health) in save.health {
            if let Some(s) = self.subsystems.iter_mut().find(|s| s.name == name) {
                s.health = health.clamp(0.0, s.max_health);
            }
        }
        Ok(())
    }
}
