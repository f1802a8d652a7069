//! Scripted combat scenario against a single ship
//!
//! A seeded barrage of registry weapons hits random points on the hull,
//! a piece of debris rams the ship a third of the way in, and the ship
//! drifts through a plasma storm over the middle of the run. Everything
//! is driven from one `ChaCha8Rng`, so a seed reproduces a run exactly.

use damage_core::collision::{CollisionBody, CollisionContact, HazardType};
use damage_core::config::{DamageConstants, ShipClass, WeaponRecord, WeaponRegistry};
use damage_core::critical::CriticalStatus;
use damage_core::hull::{DamageManager, HullStatus};
use damage_core::shield::ShieldStatus;
use damage_core::{DamageError, DamageEvent, DamageNotification, ObjectHandle};
use glam::DVec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Chance per tick that the attacker fires
const FIRE_CHANCE: f64 = 0.5;
const DEBRIS_HANDLE: ObjectHandle = ObjectHandle(9001);
const DEBRIS_MASS: f64 = 400.0;
const DEBRIS_SPEED: f64 = 120.0;
const STORM_INTENSITY: f64 = 1.5;

/// Scenario parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub seed: u64,
    /// Simulated seconds
    pub duration: f64,
    /// Ticks per simulated second
    pub tick_rate: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            seed: 42,
            duration: 60.0,
            tick_rate: 10.0,
        }
    }
}

/// Result of one scenario run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub ship_class: String,
    pub seed: u64,
    /// Simulated time actually covered
    pub elapsed: f64,
    pub shots_fired: u32,
    pub raw_damage: f64,
    pub shield_absorbed: f64,
    pub armor_absorbed: f64,
    pub hull_damage: f64,
    pub subsystem_damage: f64,
    pub ricochets: u32,
    pub penetrations: u32,
    pub collision_damage: f64,
    pub hazard_damage: f64,
    pub destroyed_at: Option<f64>,
    /// Notification counts keyed by kind
    pub notifications: BTreeMap<String, usize>,
    pub hull: HullStatus,
    pub shields: ShieldStatus,
    pub critical: CriticalStatus,
}

/// Runs the scripted scenario
pub struct CombatSimulation<'a> {
    ship_class: &'a ShipClass,
    weapons: Vec<&'a WeaponRecord>,
    constants: DamageConstants,
}

impl<'a> CombatSimulation<'a> {
    pub fn new(ship_class: &'a ShipClass, weapons: &'a WeaponRegistry, constants: DamageConstants) -> Self {
        CombatSimulation {
            ship_class,
            weapons: weapons.all(),
            constants,
        }
    }

    /// Simulate the scenario for `config.duration` seconds or until the ship dies
    pub fn run(&self, config: &ScenarioConfig) -> Result<ScenarioSummary, DamageError> {
        if config.tick_rate <= 0.0 || !config.tick_rate.is_finite() {
            return Err(DamageError::InvalidParameter("tick_rate must be positive"));
        }
        if config.duration < 0.0 || !config.duration.is_finite() {
            return Err(DamageError::InvalidParameter("duration must be non-negative"));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut ship = DamageManager::new(self.ship_class, self.constants.clone(), config.seed)?;
        let half_extents = self.ship_class.ship_type.half_extents();
        let dt = 1.0 / config.tick_rate;
        let ticks = (config.duration * config.tick_rate).round() as u64;

        let collision_tick = ticks / 3;
        let storm_ticks = (ticks / 2)..(ticks / 2 + (5.0 * config.tick_rate) as u64);

        let mut summary = ScenarioSummary {
            ship_class: self.ship_class.id.clone(),
            seed: config.seed,
            elapsed: 0.0,
            shots_fired: 0,
            raw_damage: 0.0,
            shield_absorbed: 0.0,
            armor_absorbed: 0.0,
            hull_damage: 0.0,
            subsystem_damage: 0.0,
            ricochets: 0,
            penetrations: 0,
            collision_damage: 0.0,
            hazard_damage: 0.0,
            destroyed_at: None,
            notifications: BTreeMap::new(),
            hull: ship.get_hull_status(),
            shields: ship.get_shield_status(),
            critical: ship.get_critical_status(),
        };

        for tick in 0..ticks {
            if ship.is_destroyed() {
                break;
            }
            let time = tick as f64 * dt;

            if !self.weapons.is_empty() && rng.gen_bool(FIRE_CHANCE) {
                let weapon = self.weapons[rng.gen_range(0..self.weapons.len())];
                let point = random_hull_point(&mut rng, half_extents);
                let range = rng.gen_range(0.0..=weapon.max_range.max(0.0));
                let event = DamageEvent::new(weapon.damage, weapon.damage_type, point)
                    .with_velocity(-point.normalize_or_zero() * weapon.velocity)
                    .with_weapon(weapon.hit_at(range));

                let report = ship.process_damage_event(&event);
                summary.shots_fired += 1;
                summary.raw_damage += report.raw_damage;
                summary.shield_absorbed += report.shield_absorbed;
                summary.armor_absorbed += report.armor_absorbed;
                summary.hull_damage += report.hull_damage;
                summary.subsystem_damage += report.subsystem_damage;
                if report.ricochet {
                    summary.ricochets += 1;
                }
                if report.penetrated {
                    summary.penetrations += 1;
                }
                tracing::debug!(
                    "t={:.1} {} hit {:?} for {:.1} hull",
                    time,
                    weapon.id,
                    report.zone,
                    report.hull_damage
                );
            }

            if tick == collision_tick {
                let point = random_hull_point(&mut rng, half_extents);
                let normal = point.normalize_or_zero();
                let contact = CollisionContact {
                    other: CollisionBody::new(DEBRIS_HANDLE, DEBRIS_MASS).with_tag("debris"),
                    relative_velocity: -normal * DEBRIS_SPEED,
                    impact_position: point,
                    impact_normal: normal,
                };
                if let Some(damage) = ship.process_collision(&contact) {
                    tracing::info!("t={:.1} debris impact for {:.1}", time, damage);
                    summary.collision_damage += damage;
                }
            }

            if storm_ticks.contains(&tick) {
                summary.hazard_damage += ship.apply_environmental_damage(HazardType::PlasmaStorm, STORM_INTENSITY, dt);
            }

            ship.tick(dt);
            summary.elapsed = time + dt;

            for event in ship.drain_events() {
                log_notification(time, &event);
                *summary.notifications.entry(event.kind().to_string()).or_default() += 1;
            }

            if ship.is_destroyed() && summary.destroyed_at.is_none() {
                summary.destroyed_at = Some(summary.elapsed);
            }
        }

        summary.hull = ship.get_hull_status();
        summary.shields = ship.get_shield_status();
        summary.critical = ship.get_critical_status();
        Ok(summary)
    }
}

/// Random point on the archetype's bounding box surface, ship-local
fn random_hull_point(rng: &mut impl Rng, half_extents: DVec3) -> DVec3 {
    let direction = DVec3::new(
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
        rng.gen_range(-1.0..=1.0),
    );
    let direction = if direction.length_squared() < 1e-9 {
        DVec3::Z
    } else {
        direction
    };
    // Scale so the largest normalized component lands on the box face
    let scaled = direction / half_extents;
    direction / scaled.abs().max_element()
}

fn log_notification(time: f64, event: &DamageNotification) {
    match event {
        DamageNotification::ShipDestroyed { .. }
        | DamageNotification::CatastrophicCountdownStarted { .. }
        | DamageNotification::ThresholdCrossed { .. } => {
            tracing::warn!("t={:.1} {:?}", time, event)
        }
        DamageNotification::CriticalEventTriggered { .. } | DamageNotification::ShieldDepleted { .. } => {
            tracing::info!("t={:.1} {:?}", time, event)
        }
        _ => tracing::debug!("t={:.1} {:?}", time, event),
    }
}
