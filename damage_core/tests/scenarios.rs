//! End-to-end damage scenarios through the public API

use damage_core::config::{load_constants, load_ship_classes, load_weapons};
use damage_core::prelude::*;
use damage_core::shield::Quadrant;
use glam::DVec3;
use std::path::PathBuf;

const BOW: DVec3 = DVec3::new(0.0, 0.0, 15.0);

fn unarmored_corvette(max_hull: f64, max_shield: f64) -> ShipClass {
    ShipClass::new("scenario_corvette", ShipType::Corvette, max_hull, max_shield, ArmorClass::None)
}

fn bare_grid() -> Box<dyn SubsystemProvider> {
    Box::new(SubsystemGrid::new(2.0))
}

fn count(events: &[DamageNotification], kind: &str) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("config")
}

/// Constants with the heavy/critical/structural thresholds pushed down to
/// fractions of a percent, so no threshold-driven critical events interfere
/// with the countdown
fn countdown_constants() -> DamageConstants {
    let mut constants = DamageConstants::default();
    constants.hull.heavy_threshold = 0.3;
    constants.hull.critical_threshold = 0.2;
    constants.hull.structural_failure_threshold = 0.1;
    constants
}

fn detonation_events(events: &[DamageNotification]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, DamageNotification::CriticalEventTriggered { severity, .. } if (severity - 3.0).abs() < 1e-9))
        .count()
}

#[test]
fn test_unarmored_hit_splits_between_hull_and_subsystems() {
    let class = unarmored_corvette(100.0, 0.0);
    let mut grid = SubsystemGrid::new(2.0);
    grid.add("sensors", DVec3::new(0.0, 0.0, 13.0), 50.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 1)
        .unwrap()
        .with_subsystems(Box::new(grid));

    let applied = ship.apply_hull_damage(40.0, BOW, DamageType::Kinetic, None);

    assert!((applied - 40.0).abs() < 1e-9);
    let status = ship.get_hull_status();
    assert!((status.current_strength - 72.0).abs() < 1e-9);
    // 12 of the sensor array's 50 health
    assert!((ship.subsystems().health_fraction("sensors").unwrap() - 0.76).abs() < 1e-9);
}

#[test]
fn test_front_quadrant_absorbs_head_on_hit() {
    let class = unarmored_corvette(100.0, 100.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 2).unwrap();

    let event = DamageEvent::new(10.0, DamageType::Energy, BOW).with_velocity(DVec3::new(0.0, 0.0, -500.0));
    let report = ship.process_damage_event(&event);

    assert!((report.shield_absorbed - 10.0).abs() < 1e-9);
    let shields = ship.get_shield_status();
    let front = &shields.quadrants[Quadrant::Front.index()];
    assert!((front.current - 15.0).abs() < 1e-9);
    assert!((front.max - 25.0).abs() < 1e-9);
    assert!((front.recharge_delay - 3.0).abs() < 1e-9);
    for quadrant in [Quadrant::Rear, Quadrant::Left, Quadrant::Right] {
        let q = &shields.quadrants[quadrant.index()];
        assert!((q.current - 25.0).abs() < 1e-9);
        assert!(q.recharge_delay.abs() < f64::EPSILON);
    }
}

#[test]
fn test_shield_recharges_after_delay() {
    let class = unarmored_corvette(100.0, 100.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 3).unwrap();
    ship.process_damage_event(&DamageEvent::new(10.0, DamageType::Energy, BOW));

    ship.tick(2.0);
    let front = ship.shields().quadrant(Quadrant::Front).current_strength;
    assert!((front - 15.0).abs() < 1e-9);

    ship.tick(2.0);
    assert!(ship.shields().quadrant(Quadrant::Front).current_strength > 15.0);
}

#[test]
fn test_each_threshold_fires_once() {
    let class = unarmored_corvette(1000.0, 0.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 4)
        .unwrap()
        .with_subsystems(bare_grid());

    let mut events = Vec::new();
    for _ in 0..13 {
        ship.apply_hull_damage(40.0, BOW, DamageType::Kinetic, None);
        events.extend(ship.drain_events());
    }
    // 520 of 1000 hull gone: moderate and heavy only
    let crossed: Vec<HullThreshold> = events
        .iter()
        .filter_map(|e| match e {
            DamageNotification::ThresholdCrossed { threshold, .. } => Some(*threshold),
            _ => None,
        })
        .collect();
    assert_eq!(crossed, vec![HullThreshold::Moderate, HullThreshold::Heavy]);

    // Re-evaluating while below fires nothing new
    ship.repair_hull(0.0);
    ship.apply_hull_damage(1.0, BOW, DamageType::Kinetic, None);
    assert_eq!(count(&ship.drain_events(), "threshold_crossed"), 0);
}

#[test]
fn test_hull_status_is_idempotent() {
    let class = ShipClassRegistry::with_defaults().get("escort_frigate").unwrap().clone();
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 5).unwrap();
    ship.process_damage_event(&DamageEvent::new(300.0, DamageType::Plasma, DVec3::new(0.0, 0.0, 30.0)));

    let first = ship.get_hull_status();
    let second = ship.get_hull_status();
    assert_eq!(first, second);
    assert_eq!(ship.get_critical_status(), ship.get_critical_status());
}

#[test]
fn test_countdown_detonation_destroys_exactly_once() {
    let class = unarmored_corvette(1000.0, 0.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 6)
        .unwrap()
        .with_subsystems(bare_grid());

    ship.apply_hull_damage(920.0, BOW, DamageType::Kinetic, None);
    assert_eq!(ship.get_hull_status().critical_state, ShipCriticalState::CatastrophicCountdown);

    let mut events = ship.drain_events();
    assert_eq!(count(&events, "catastrophic_countdown_started"), 1);

    // Threshold breaches and progressive failure keep draining the hull, but
    // the ship lives until the countdown runs out
    let mut last_countdown = f64::MAX;
    let mut destroyed_at = None;
    for step in 0..400 {
        ship.tick(0.1);
        events.extend(ship.drain_events());
        if ship.is_destroyed() {
            destroyed_at = Some(step);
            break;
        }
        assert!(ship.get_hull_status().current_strength > 0.0);
        if let Some(remaining) = ship.get_critical_status().countdown_remaining {
            last_countdown = remaining;
        }
    }

    assert!(destroyed_at.is_some());
    assert!(last_countdown < 0.2);
    assert_eq!(count(&events, "ship_destroyed"), 1);
    assert_eq!(ship.get_critical_status().state, ShipCriticalState::Destroyed);
    assert!(ship.get_hull_status().current_strength.abs() < f64::EPSILON);
    // Five hull sites plus the power core
    assert_eq!(detonation_events(&events), 6);

    let report = ship.process_damage_event(&DamageEvent::new(50.0, DamageType::Kinetic, BOW));
    assert!(report.ignored);
    ship.queue_damage(DamageEvent::new(50.0, DamageType::Kinetic, BOW));
    ship.tick(1.0);
    assert_eq!(ship.get_hull_status().queued_events, 0);
    assert!(ship.drain_events().is_empty());
}

#[test]
fn test_repair_aborts_countdown() {
    let class = unarmored_corvette(1000.0, 0.0);
    let mut ship = DamageManager::new(&class, countdown_constants(), 7)
        .unwrap()
        .with_subsystems(bare_grid());

    ship.apply_hull_damage(920.0, BOW, DamageType::Kinetic, None);
    ship.tick(1.0);
    assert!(ship.get_critical_status().countdown_remaining.is_some());

    ship.repair_hull(500.0);
    let status = ship.get_critical_status();
    assert!(status.countdown_remaining.is_none());
    assert_ne!(status.state, ShipCriticalState::CatastrophicCountdown);

    ship.tick(40.0);
    assert!(!ship.is_destroyed());
}

#[test]
fn test_hull_depletion_destroys_once() {
    let class = unarmored_corvette(100.0, 0.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 8)
        .unwrap()
        .with_subsystems(bare_grid());

    ship.apply_hull_damage(60.0, BOW, DamageType::Kinetic, None);
    ship.apply_hull_damage(60.0, BOW, DamageType::Kinetic, None);
    ship.apply_hull_damage(60.0, BOW, DamageType::Kinetic, None);
    let events = ship.drain_events();

    assert!(ship.is_destroyed());
    assert_eq!(count(&events, "ship_destroyed"), 1);
}

#[test]
fn test_identical_seeds_give_identical_runs() {
    let class = ShipClassRegistry::with_defaults().get("line_destroyer").unwrap().clone();
    let weapons = WeaponRegistry::with_defaults();

    let run = |seed: u64| {
        let mut ship = DamageManager::new(&class, DamageConstants::default(), seed).unwrap();
        for (i, weapon) in weapons.all().iter().enumerate() {
            let point = DVec3::new((i as f64 - 3.0) * 2.0, 0.0, 45.0);
            let event = DamageEvent::new(weapon.damage * 4.0, weapon.damage_type, point)
                .with_velocity(DVec3::new(0.0, 0.0, -weapon.velocity))
                .with_weapon(weapon.hit_at(1000.0));
            ship.queue_damage(event);
        }
        for _ in 0..50 {
            ship.tick(0.2);
        }
        (ship.get_hull_status(), ship.drain_events())
    };

    assert_eq!(run(99), run(99));
}

#[test]
fn test_save_round_trip_restores_observable_state() {
    let class = ShipClassRegistry::with_defaults().get("escort_frigate").unwrap().clone();
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 10).unwrap();

    for i in 0..8 {
        let point = DVec3::new(0.0, (i % 3) as f64, 30.0);
        ship.process_damage_event(
            &DamageEvent::new(150.0, DamageType::Kinetic, point).with_velocity(DVec3::new(0.0, 0.0, -900.0)),
        );
    }
    ship.trigger_critical_event(CriticalEventType::EngineFire, 1.0, DVec3::new(0.0, 0.0, -25.0));
    ship.tick(1.5);

    let data = ship.save_data();
    let json = serde_json::to_string(&data).unwrap();
    let parsed: SaveData = serde_json::from_str(&json).unwrap();

    let mut restored = DamageManager::new(&class, DamageConstants::default(), 10).unwrap();
    restored.load_save_data(&parsed).unwrap();

    assert_eq!(restored.get_hull_status(), ship.get_hull_status());
    assert_eq!(restored.get_shield_status(), ship.get_shield_status());
    for zone in ["bow", "stern", "port", "starboard", "bridge", "core"] {
        assert_eq!(restored.get_degradation_status(zone), ship.get_degradation_status(zone));
    }
    assert_eq!(restored.critical().active_events(), ship.critical().active_events());
    assert_eq!(restored.get_critical_status().state, ship.get_critical_status().state);
}

#[test]
fn test_load_with_missing_sections_keeps_defaults() {
    let class = unarmored_corvette(100.0, 100.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 11).unwrap();

    ship.load_save_data(&SaveData::new()).unwrap();
    let status = ship.get_hull_status();
    assert!((status.current_strength - 100.0).abs() < f64::EPSILON);
    assert!((ship.get_shield_status().total_current - 100.0).abs() < 1e-9);
}

#[test]
fn test_ramming_collision_reaches_hull() {
    let class = unarmored_corvette(1000.0, 0.0);
    let mut ship = DamageManager::new(&class, DamageConstants::default(), 12).unwrap();
    let rammer = CollisionBody::ship(
        ObjectHandle(3),
        ShipDescriptor {
            mass: 4000.0,
            armor_class: ArmorClass::Heavy,
            integrity: 1.0,
        },
    );
    let contact = CollisionContact {
        other: rammer,
        relative_velocity: DVec3::new(0.0, 0.0, -40.0),
        impact_position: BOW,
        impact_normal: DVec3::Z,
    };

    let applied = ship.process_collision(&contact).unwrap();
    assert!(applied > 0.0);
    let events = ship.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, DamageNotification::CollisionImpact { ramming: true, .. })));
}

#[test]
fn test_bundled_config_files_load() {
    let dir = config_dir();
    let constants = load_constants(&dir.join("constants.toml")).unwrap();
    let defaults = DamageConstants::default();
    assert!((constants.hull.subsystem_damage_ratio - defaults.hull.subsystem_damage_ratio).abs() < f64::EPSILON);
    assert!((constants.critical.cascade_factor - defaults.critical.cascade_factor).abs() < f64::EPSILON);

    let ships = load_ship_classes(&dir.join("ship_classes.toml")).unwrap();
    assert!(ships.get("escort_frigate").is_some());

    let weapons = load_weapons(&dir.join("weapons.toml")).unwrap();
    assert!(weapons.get("railgun").is_some());
}
