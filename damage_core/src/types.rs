//! Core types shared by every damage component
//!
//! Local ship frame: +Z is forward (bow), +X is starboard, +Y is dorsal.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Damage type carried by a weapon, collision or hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Kinetic,
    Energy,
    Explosive,
    Beam,
    Plasma,
    Emp,
    Ion,
}

impl DamageType {
    /// Get all damage types
    pub fn all() -> &'static [DamageType] {
        &[
            DamageType::Kinetic,
            DamageType::Energy,
            DamageType::Explosive,
            DamageType::Beam,
            DamageType::Plasma,
            DamageType::Emp,
            DamageType::Ion,
        ]
    }

    /// Column in the armor resistance matrix and the scale applied to it.
    ///
    /// EMP and ion read the energy column at half strength.
    pub fn resistance_column(self) -> (usize, f64) {
        match self {
            DamageType::Kinetic => (0, 1.0),
            DamageType::Energy => (1, 1.0),
            DamageType::Explosive => (2, 1.0),
            DamageType::Beam => (3, 1.0),
            DamageType::Plasma => (4, 1.0),
            DamageType::Emp | DamageType::Ion => (1, 0.5),
        }
    }

    /// Whether this damage heats the armor (thermal degradation)
    pub fn is_thermal(self) -> bool {
        matches!(self, DamageType::Energy | DamageType::Beam | DamageType::Plasma)
    }

    pub fn name(self) -> &'static str {
        match self {
            DamageType::Kinetic => "kinetic",
            DamageType::Energy => "energy",
            DamageType::Explosive => "explosive",
            DamageType::Beam => "beam",
            DamageType::Plasma => "plasma",
            DamageType::Emp => "emp",
            DamageType::Ion => "ion",
        }
    }
}

/// Armor tier with a fixed resistance profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorClass {
    #[default]
    None,
    Light,
    Standard,
    Heavy,
    Capital,
    SuperCapital,
}

impl ArmorClass {
    /// Get all armor classes, lightest first
    pub fn all() -> &'static [ArmorClass] {
        &[
            ArmorClass::None,
            ArmorClass::Light,
            ArmorClass::Standard,
            ArmorClass::Heavy,
            ArmorClass::Capital,
            ArmorClass::SuperCapital,
        ]
    }

    /// Row index into the armor matrices
    pub fn index(self) -> usize {
        match self {
            ArmorClass::None => 0,
            ArmorClass::Light => 1,
            ArmorClass::Standard => 2,
            ArmorClass::Heavy => 3,
            ArmorClass::Capital => 4,
            ArmorClass::SuperCapital => 5,
        }
    }

    /// Material density used for armor mass estimates
    pub fn density(self) -> f64 {
        match self {
            ArmorClass::None => 0.0,
            ArmorClass::Light => 2.7,
            ArmorClass::Standard => 4.5,
            ArmorClass::Heavy => 7.8,
            ArmorClass::Capital => 11.3,
            ArmorClass::SuperCapital => 19.3,
        }
    }

    /// Armor class one tier lighter (saturates at `None`)
    pub fn lighter(self) -> ArmorClass {
        match self {
            ArmorClass::None | ArmorClass::Light => ArmorClass::None,
            ArmorClass::Standard => ArmorClass::Light,
            ArmorClass::Heavy => ArmorClass::Standard,
            ArmorClass::Capital => ArmorClass::Heavy,
            ArmorClass::SuperCapital => ArmorClass::Capital,
        }
    }

    /// Armor class one tier heavier (saturates at `SuperCapital`)
    pub fn heavier(self) -> ArmorClass {
        match self {
            ArmorClass::None => ArmorClass::Light,
            ArmorClass::Light => ArmorClass::Standard,
            ArmorClass::Standard => ArmorClass::Heavy,
            ArmorClass::Heavy => ArmorClass::Capital,
            ArmorClass::Capital | ArmorClass::SuperCapital => ArmorClass::SuperCapital,
        }
    }
}

/// Hull archetype size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    Fighter,
    Corvette,
    #[default]
    Frigate,
    Destroyer,
    Cruiser,
    Battleship,
    Carrier,
}

impl ShipType {
    /// Half-extents of the hull bounding box (x = beam, y = height, z = length)
    pub fn half_extents(self) -> DVec3 {
        match self {
            ShipType::Fighter => DVec3::new(3.0, 1.5, 6.0),
            ShipType::Corvette => DVec3::new(6.0, 3.0, 15.0),
            ShipType::Frigate => DVec3::new(10.0, 5.0, 30.0),
            ShipType::Destroyer => DVec3::new(14.0, 7.0, 45.0),
            ShipType::Cruiser => DVec3::new(20.0, 10.0, 70.0),
            ShipType::Battleship => DVec3::new(30.0, 15.0, 110.0),
            ShipType::Carrier => DVec3::new(40.0, 15.0, 130.0),
        }
    }

    /// Extra shield coverage half-angle in degrees for larger hulls
    pub fn shield_coverage_bonus(self) -> f64 {
        match self {
            ShipType::Fighter | ShipType::Corvette => 0.0,
            ShipType::Frigate | ShipType::Destroyer => 5.0,
            ShipType::Cruiser => 10.0,
            ShipType::Battleship | ShipType::Carrier => 15.0,
        }
    }
}

/// Weapon family used by the weapon-vs-armor effectiveness matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponType {
    MassDriver,
    Railgun,
    Laser,
    PlasmaCannon,
    Missile,
    Torpedo,
    IonCannon,
}

impl WeaponType {
    pub fn index(self) -> usize {
        match self {
            WeaponType::MassDriver => 0,
            WeaponType::Railgun => 1,
            WeaponType::Laser => 2,
            WeaponType::PlasmaCannon => 3,
            WeaponType::Missile => 4,
            WeaponType::Torpedo => 5,
            WeaponType::IonCannon => 6,
        }
    }

    /// Whether projectile velocity affects penetration
    pub fn is_kinetic(self) -> bool {
        matches!(self, WeaponType::MassDriver | WeaponType::Railgun)
    }
}

/// Ammunition loaded into a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmmunitionType {
    #[default]
    Standard,
    ArmorPiercing,
    HighExplosive,
    Incendiary,
    EmpCharge,
}

/// Stable opaque handle for an object outside this ship (projectile owner, collider)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// Weapon/ammunition descriptor attached to a hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponHit {
    pub weapon_type: WeaponType,
    #[serde(default)]
    pub ammunition: AmmunitionType,
    /// Raw penetration power of the round
    pub penetration_power: f64,
    /// Extra critical-hit chance granted by the weapon (0.0 - 1.0)
    #[serde(default)]
    pub critical_bonus: f64,
    /// Distance travelled before impact
    #[serde(default)]
    pub range: f64,
    pub optimal_range: f64,
    pub max_range: f64,
    /// Muzzle velocity the weapon is rated for
    pub reference_velocity: f64,
}

/// A single incoming hit, consumed synchronously and never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct DamageEvent {
    pub amount: f64,
    pub damage_type: DamageType,
    /// Impact point in world space
    pub world_point: DVec3,
    /// Velocity of the projectile at impact, world space
    pub impact_velocity: DVec3,
    pub weapon: Option<WeaponHit>,
    pub source: Option<ObjectHandle>,
}

impl DamageEvent {
    /// Create a new damage event with no velocity, weapon or source
    pub fn new(amount: f64, damage_type: DamageType, world_point: DVec3) -> Self {
        DamageEvent {
            amount,
            damage_type,
            world_point,
            impact_velocity: DVec3::ZERO,
            weapon: None,
            source: None,
        }
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.impact_velocity = velocity;
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponHit) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_source(mut self, source: ObjectHandle) -> Self {
        self.source = Some(source);
        self
    }
}

/// Angle in degrees between an incoming direction and the outward hull normal.
///
/// 0° is head-on. A zero velocity or a point at the hull origin counts as head-on.
pub fn impact_angle_degrees(local_point: DVec3, local_velocity: DVec3) -> f64 {
    let normal = local_point.normalize_or_zero();
    let incoming = local_velocity.normalize_or_zero();
    if normal == DVec3::ZERO || incoming == DVec3::ZERO {
        return 0.0;
    }

    // The projectile travels against the outward normal on a head-on hit
    let cos = (-incoming).dot(normal).clamp(-1.0, 1.0);
    cos.acos().to_degrees().min(90.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emp_reads_energy_column_at_half() {
        assert_eq!(DamageType::Emp.resistance_column(), (1, 0.5));
        assert_eq!(DamageType::Ion.resistance_column(), (1, 0.5));
        assert_eq!(DamageType::Plasma.resistance_column(), (4, 1.0));
    }

    #[test]
    fn test_armor_class_ordering() {
        let classes = ArmorClass::all();
        for (i, class) in classes.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
        assert_eq!(ArmorClass::SuperCapital.heavier(), ArmorClass::SuperCapital);
        assert_eq!(ArmorClass::Light.lighter(), ArmorClass::None);
    }

    #[test]
    fn test_head_on_impact_angle() {
        // Hit on the bow travelling aft
        let angle = impact_angle_degrees(DVec3::new(0.0, 0.0, 10.0), DVec3::new(0.0, 0.0, -300.0));
        assert!(angle.abs() < 1e-9);
    }

    #[test]
    fn test_grazing_impact_angle() {
        // Hit on the bow travelling sideways
        let angle = impact_angle_degrees(DVec3::new(0.0, 0.0, 10.0), DVec3::new(300.0, 0.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_velocity_is_head_on() {
        let angle = impact_angle_degrees(DVec3::new(5.0, 0.0, 0.0), DVec3::ZERO);
        assert!(angle.abs() < f64::EPSILON);
    }

    #[test]
    fn test_damage_type_serialization() {
        let json = serde_json::to_string(&DamageType::Emp).unwrap();
        assert_eq!(json, "\"emp\"");
        let parsed: ArmorClass = serde_json::from_str("\"super_capital\"").unwrap();
        assert_eq!(parsed, ArmorClass::SuperCapital);
    }
}
