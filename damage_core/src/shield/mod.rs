//! Quadrant shields - directional absorption, recharge and redistribution
//!
//! A hit is covered by every quadrant whose normal lies within the coverage
//! half-angle of the hit direction. Each covering quadrant gets an
//! absorption factor `1 - angle / half_angle` and damage is split across
//! them in proportion to those factors.
//!
//! Recharge per quadrant:
//! `base_rate * share_of_capacity * energy_allocation * subsystem_health`

use crate::config::{ShieldConstants, ShipClass};
use crate::error::DamageError;
use crate::events::{DamageNotification, EventQueue};
use crate::save::{from_save_data, to_save_data, SaveData};
use crate::types::ShipType;
use glam::DVec3;
use serde::{Deserialize, Serialize};

const DISTRIBUTION_TOLERANCE: f64 = 0.001;

/// One of the four directional shield segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Front,
    Rear,
    Left,
    Right,
}

impl Quadrant {
    pub fn all() -> &'static [Quadrant] {
        &[Quadrant::Front, Quadrant::Rear, Quadrant::Left, Quadrant::Right]
    }

    pub fn index(self) -> usize {
        match self {
            Quadrant::Front => 0,
            Quadrant::Rear => 1,
            Quadrant::Left => 2,
            Quadrant::Right => 3,
        }
    }

    /// Outward normal in ship-local space
    pub fn normal(self) -> DVec3 {
        match self {
            Quadrant::Front => DVec3::Z,
            Quadrant::Rear => DVec3::NEG_Z,
            Quadrant::Left => DVec3::NEG_X,
            Quadrant::Right => DVec3::X,
        }
    }
}

impl TryFrom<usize> for Quadrant {
    type Error = DamageError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Quadrant::all()
            .get(index)
            .copied()
            .ok_or(DamageError::InvalidQuadrant(index))
    }
}

/// Live state of one quadrant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldQuadrant {
    pub max_strength: f64,
    pub current_strength: f64,
    /// Seconds until recharge resumes
    pub recharge_delay: f64,
    pub depleted: bool,
}

impl ShieldQuadrant {
    fn new(max_strength: f64) -> Self {
        ShieldQuadrant {
            max_strength,
            current_strength: max_strength,
            recharge_delay: 0.0,
            depleted: max_strength <= 0.0,
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.max_strength <= 0.0 {
            return 0.0;
        }
        (self.current_strength / self.max_strength * 100.0).clamp(0.0, 100.0)
    }

    pub fn headroom(&self) -> f64 {
        (self.max_strength - self.current_strength).max(0.0)
    }
}

/// Result of pushing a hit through the shields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShieldAbsorption {
    pub absorbed: f64,
    /// Damage that passed through un-absorbed
    pub residual: f64,
    /// Absorbed per quadrant, indexed by `Quadrant::index`
    pub per_quadrant: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantStatus {
    pub quadrant: Quadrant,
    pub current: f64,
    pub max: f64,
    pub percentage: f64,
    pub recharge_delay: f64,
    pub depleted: bool,
}

/// Read-only shield snapshot for HUD/AI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShieldStatus {
    pub quadrants: Vec<QuadrantStatus>,
    pub total_current: f64,
    pub total_max: f64,
    pub percentage: f64,
    pub distribution: [f64; 4],
    pub energy_allocation: f64,
    pub subsystem_health: f64,
    /// Recharge per second summed over quadrants that are not delayed
    pub effective_recharge_rate: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ShieldSave {
    quadrants: Vec<ShieldQuadrant>,
    distribution: Option<[f64; 4]>,
    energy_allocation: Option<f64>,
    subsystem_health: Option<f64>,
}

/// Four-quadrant shield generator for one ship
#[derive(Debug, Clone)]
pub struct ShieldQuadrantManager {
    constants: ShieldConstants,
    ship_type: ShipType,
    total_max: f64,
    base_recharge_rate: f64,
    distribution: [f64; 4],
    quadrants: [ShieldQuadrant; 4],
    energy_allocation: f64,
    subsystem_health: f64,
    events: EventQueue,
}

impl ShieldQuadrantManager {
    /// Shields with `total_max` split evenly over four quadrants
    pub fn new(total_max: f64, recharge_rate: f64, ship_type: ShipType, constants: ShieldConstants) -> Self {
        let total_max = total_max.max(0.0);
        let distribution = [0.25; 4];
        let quadrants = distribution.map(|share| ShieldQuadrant::new(total_max * share));

        ShieldQuadrantManager {
            constants,
            ship_type,
            total_max,
            base_recharge_rate: recharge_rate.max(0.0),
            distribution,
            quadrants,
            energy_allocation: 1.0,
            subsystem_health: 1.0,
            events: EventQueue::new(),
        }
    }

    pub fn from_ship_class(class: &ShipClass, constants: ShieldConstants) -> Self {
        Self::new(class.max_shield, class.shield_recharge_rate, class.ship_type, constants)
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> &ShieldQuadrant {
        &self.quadrants[quadrant.index()]
    }

    pub fn total_current(&self) -> f64 {
        self.quadrants.iter().map(|q| q.current_strength).sum()
    }

    pub fn total_max(&self) -> f64 {
        self.quadrants.iter().map(|q| q.max_strength).sum()
    }

    pub fn distribution(&self) -> [f64; 4] {
        self.distribution
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Coverage half-angle in degrees, widened for larger hulls
    pub fn coverage_half_angle(&self) -> f64 {
        self.constants.base_coverage_angle + self.ship_type.shield_coverage_bonus()
    }

    /// Quadrants covering a local hit direction, with their absorption factors.
    ///
    /// A zero direction (hit at the hull origin) is treated as a head-on front hit.
    /// At the base 90° half-angle a direction straight along ±Y lies exactly on
    /// every quadrant edge, so dorsal and ventral hits reach the hull unshielded.
    /// Frigates and larger widen the half-angle and close that gap.
    pub fn covering_quadrants(&self, local_direction: DVec3) -> Vec<(Quadrant, f64)> {
        let direction = local_direction.normalize_or_zero();
        if direction == DVec3::ZERO {
            return vec![(Quadrant::Front, 1.0)];
        }

        let half_angle = self.coverage_half_angle();
        Quadrant::all()
            .iter()
            .filter_map(|q| {
                let angle = direction.dot(q.normal()).clamp(-1.0, 1.0).acos().to_degrees();
                // Quadrants exactly at the edge contribute nothing
                (angle < half_angle - 1e-6).then(|| (*q, 1.0 - angle / half_angle))
            })
            .collect()
    }

    /// Absorb a hit at a local point, returning what got through
    pub fn absorb_damage(&mut self, amount: f64, local_point: DVec3) -> ShieldAbsorption {
        if amount <= 0.0 || !amount.is_finite() {
            return ShieldAbsorption::default();
        }

        let covering = self.covering_quadrants(local_point);
        let factor_sum: f64 = covering.iter().map(|(_, f)| f).sum();
        let mut result = ShieldAbsorption {
            residual: amount,
            ..Default::default()
        };
        if factor_sum <= 0.0 {
            return result;
        }

        for (quadrant, factor) in covering {
            let i = quadrant.index();
            let share = amount * factor / factor_sum;
            let q = &mut self.quadrants[i];
            let absorbed = share.min(q.current_strength);
            if absorbed <= 0.0 {
                continue;
            }

            q.current_strength = (q.current_strength - absorbed).max(0.0);
            q.recharge_delay = self.constants.recharge_delay;
            result.per_quadrant[i] = absorbed;
            result.absorbed += absorbed;
            self.events.push(DamageNotification::ShieldAbsorbed { quadrant, amount: absorbed });
            self.update_state_flags(i);
        }

        result.residual = (amount - result.absorbed).max(0.0);
        tracing::debug!(
            "Shields absorbed {:.2} of {:.2} ({:.2} through)",
            result.absorbed,
            amount,
            result.residual
        );
        result
    }

    /// Fire depleted/restored exactly once per transition
    fn update_state_flags(&mut self, index: usize) {
        let restore_fraction = self.constants.restore_fraction;
        let q = &mut self.quadrants[index];
        let quadrant = Quadrant::all()[index];

        if !q.depleted && q.max_strength > 0.0 && q.current_strength <= 0.0 {
            q.depleted = true;
            tracing::info!("Shield quadrant {:?} depleted", quadrant);
            self.events.push(DamageNotification::ShieldDepleted { quadrant });
        } else if q.depleted && q.max_strength > 0.0 && q.current_strength >= q.max_strength * restore_fraction {
            q.depleted = false;
            tracing::info!("Shield quadrant {:?} restored", quadrant);
            self.events.push(DamageNotification::ShieldRestored { quadrant });
        }
    }

    /// Recharge per second for a quadrant once its delay has elapsed
    pub fn quadrant_recharge_rate(&self, quadrant: Quadrant) -> f64 {
        let share = if self.total_max > 0.0 {
            self.quadrants[quadrant.index()].max_strength / self.total_max
        } else {
            0.0
        };
        self.base_recharge_rate * share * self.energy_allocation * self.subsystem_health
    }

    /// Advance recharge delays and recharge quadrants
    pub fn tick(&mut self, delta: f64) {
        if delta <= 0.0 {
            return;
        }

        for i in 0..4 {
            let rate = self.quadrant_recharge_rate(Quadrant::all()[i]);
            let q = &mut self.quadrants[i];

            // Time left over after the delay expires this tick still recharges
            let recharge_time = (delta - q.recharge_delay).max(0.0);
            q.recharge_delay = (q.recharge_delay - delta).max(0.0);

            if recharge_time > 0.0 && q.current_strength < q.max_strength {
                q.current_strength = (q.current_strength + rate * recharge_time).min(q.max_strength);
                self.update_state_flags(i);
            }
        }
    }

    pub fn set_energy_allocation(&mut self, allocation: f64) -> Result<(), DamageError> {
        if !(0.0..=self.constants.max_energy_allocation).contains(&allocation) {
            tracing::warn!("Rejected shield energy allocation {}", allocation);
            return Err(DamageError::InvalidParameter("energy allocation out of range"));
        }
        self.energy_allocation = allocation;
        Ok(())
    }

    pub fn set_subsystem_health(&mut self, health: f64) -> Result<(), DamageError> {
        if !(0.0..=1.0).contains(&health) {
            tracing::warn!("Rejected shield subsystem health {}", health);
            return Err(DamageError::InvalidParameter("subsystem health must be in [0, 1]"));
        }
        self.subsystem_health = health;
        Ok(())
    }

    /// Redistribute capacity across quadrants. Shares must be non-negative
    /// and sum to 1.0. Current strength is kept, clamped to the new maxima.
    pub fn set_distribution(&mut self, distribution: [f64; 4]) -> Result<(), DamageError> {
        let sum: f64 = distribution.iter().sum();
        if distribution.iter().any(|d| *d < 0.0 || !d.is_finite())
            || (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE
        {
            tracing::warn!("Rejected shield distribution {:?}", distribution);
            return Err(DamageError::InvalidDistribution(sum));
        }

        self.distribution = distribution;
        for (i, share) in distribution.iter().enumerate() {
            let q = &mut self.quadrants[i];
            q.max_strength = self.total_max * share;
            q.current_strength = q.current_strength.min(q.max_strength);
            self.update_state_flags(i);
        }
        Ok(())
    }

    /// Move strength between quadrants, returning the amount actually moved.
    /// Bounded by what the source holds and what the destination can take.
    pub fn transfer(&mut self, from: usize, to: usize, amount: f64) -> Result<f64, DamageError> {
        let from_q = Quadrant::try_from(from)?;
        let to_q = Quadrant::try_from(to)?;
        if from_q == to_q {
            return Err(DamageError::InvalidParameter("cannot transfer to the same quadrant"));
        }
        if amount <= 0.0 || !amount.is_finite() {
            return Err(DamageError::InvalidParameter("transfer amount must be positive"));
        }

        let moved = amount
            .min(self.quadrants[from].current_strength)
            .min(self.quadrants[to].headroom());
        if moved <= 0.0 {
            return Ok(0.0);
        }

        self.quadrants[from].current_strength -= moved;
        self.quadrants[to].current_strength += moved;
        self.update_state_flags(from);
        self.update_state_flags(to);
        tracing::debug!("Transferred {:.2} shield strength {:?} -> {:?}", moved, from_q, to_q);
        Ok(moved)
    }

    /// Instantly refill every quadrant (dock repair)
    pub fn restore_full(&mut self) {
        for i in 0..4 {
            let q = &mut self.quadrants[i];
            q.current_strength = q.max_strength;
            q.recharge_delay = 0.0;
            self.update_state_flags(i);
        }
    }

    pub fn get_shield_status(&self) -> ShieldStatus {
        let quadrants: Vec<QuadrantStatus> = Quadrant::all()
            .iter()
            .map(|quadrant| {
                let q = self.quadrant(*quadrant);
                QuadrantStatus {
                    quadrant: *quadrant,
                    current: q.current_strength,
                    max: q.max_strength,
                    percentage: q.percentage(),
                    recharge_delay: q.recharge_delay,
                    depleted: q.depleted,
                }
            })
            .collect();

        let total_current = self.total_current();
        let total_max = self.total_max();
        let effective_recharge_rate = Quadrant::all()
            .iter()
            .filter(|q| self.quadrant(**q).recharge_delay <= 0.0)
            .map(|q| self.quadrant_recharge_rate(*q))
            .sum();

        ShieldStatus {
            quadrants,
            total_current,
            total_max,
            percentage: if total_max > 0.0 {
                (total_current / total_max * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            },
            distribution: self.distribution,
            energy_allocation: self.energy_allocation,
            subsystem_health: self.subsystem_health,
            effective_recharge_rate,
        }
    }

    pub fn save_data(&self) -> SaveData {
        to_save_data(&ShieldSave {
            quadrants: self.quadrants.to_vec(),
            distribution: Some(self.distribution),
            energy_allocation: Some(self.energy_allocation),
            subsystem_health: Some(self.subsystem_health),
        })
    }

    /// Restore shield state. Missing quadrants keep their current values.
    pub fn load_save_data(&mut self, data: &SaveData) -> Result<(), DamageError> {
        let save: ShieldSave = from_save_data(data)?;

        let distribution = save.distribution.unwrap_or(self.distribution);
        let sum: f64 = distribution.iter().sum();
        if distribution.iter().any(|d| *d < 0.0) || (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(DamageError::MalformedSave(format!(
                "shield distribution sums to {}",
                sum
            )));
        }

        let mut quadrants = self.quadrants.clone();
        for (i, q) in quadrants.iter_mut().enumerate() {
            let max_strength = self.total_max * distribution[i];
            match save.quadrants.get(i) {
                Some(saved) => {
                    q.max_strength = max_strength;
                    q.current_strength = saved.current_strength.clamp(0.0, max_strength);
                    q.recharge_delay = saved.recharge_delay.max(0.0);
                    q.depleted = saved.depleted;
                }
                None => {
                    q.max_strength = max_strength;
                    q.current_strength = q.current_strength.min(max_strength);
                }
            }
        }

        self.quadrants = quadrants;
        self.distribution = distribution;
        self.energy_allocation = save
            .energy_allocation
            .unwrap_or(self.energy_allocation)
            .clamp(0.0, self.constants.max_energy_allocation);
        self.subsystem_health = save.subsystem_health.unwrap_or(self.subsystem_health).clamp(0.0, 1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BOW: DVec3 = DVec3::new(0.0, 0.0, 15.0);

    fn corvette() -> ShieldQuadrantManager {
        // 25 per quadrant, 10/s recharge overall
        ShieldQuadrantManager::new(100.0, 10.0, ShipType::Corvette, ShieldConstants::default())
    }

    #[test]
    fn test_head_on_hit_front_only() {
        let mut shields = corvette();
        let result = shields.absorb_damage(10.0, BOW);

        assert!((result.absorbed - 10.0).abs() < 1e-9);
        assert!(result.residual.abs() < 1e-9);
        let front = shields.quadrant(Quadrant::Front);
        assert!((front.current_strength - 15.0).abs() < 1e-9);
        assert!((front.recharge_delay - 3.0).abs() < f64::EPSILON);
        for q in [Quadrant::Rear, Quadrant::Left, Quadrant::Right] {
            assert!((shields.quadrant(q).current_strength - 25.0).abs() < f64::EPSILON);
            assert!(shields.quadrant(q).recharge_delay.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_covering_factors() {
        let shields = corvette();
        let covering = shields.covering_quadrants(DVec3::new(1.0, 0.0, 1.0));
        // 45° off both front and right
        assert_eq!(covering.len(), 2);
        for (_, factor) in &covering {
            assert!((factor - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_larger_hull_widens_coverage() {
        let shields = ShieldQuadrantManager::new(100.0, 10.0, ShipType::Battleship, ShieldConstants::default());
        assert!((shields.coverage_half_angle() - 105.0).abs() < f64::EPSILON);
        // Side quadrants now reach a head-on hit
        assert_eq!(shields.covering_quadrants(BOW).len(), 3);
    }

    #[test]
    fn test_dorsal_gap_closes_on_larger_hulls() {
        assert!(corvette().covering_quadrants(DVec3::Y).is_empty());
        assert!(corvette().covering_quadrants(DVec3::NEG_Y).is_empty());

        let frigate = ShieldQuadrantManager::new(100.0, 10.0, ShipType::Frigate, ShieldConstants::default());
        let covering = frigate.covering_quadrants(DVec3::Y);
        assert_eq!(covering.len(), 4);
        for (_, factor) in &covering {
            assert!((factor - (1.0 - 90.0 / 95.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_overflow_passes_through() {
        let mut shields = corvette();
        let result = shields.absorb_damage(40.0, BOW);
        assert!((result.absorbed - 25.0).abs() < 1e-9);
        assert!((result.residual - 15.0).abs() < 1e-9);

        let events = shields.events_mut().drain();
        assert_eq!(events.iter().filter(|e| e.kind() == "shield_depleted").count(), 1);
    }

    #[test]
    fn test_depleted_and_restored_fire_once() {
        let mut shields = corvette();
        shields.absorb_damage(30.0, BOW);
        shields.absorb_damage(30.0, BOW);
        // Delay 3 s, then 2.5/s for the front quadrant: 10% of 25 takes 1 s
        for _ in 0..60 {
            shields.tick(0.1);
        }

        let events = shields.events_mut().drain();
        let depleted = events.iter().filter(|e| e.kind() == "shield_depleted").count();
        let restored = events.iter().filter(|e| e.kind() == "shield_restored").count();
        assert_eq!(depleted, 1);
        assert_eq!(restored, 1);
        assert!(!shields.quadrant(Quadrant::Front).depleted);
    }

    #[test]
    fn test_recharge_waits_for_delay() {
        let mut shields = corvette();
        shields.absorb_damage(10.0, BOW);
        shields.tick(2.0);
        assert!((shields.quadrant(Quadrant::Front).current_strength - 15.0).abs() < 1e-9);

        // 1 s of delay left, then 1 s of recharge at 2.5/s
        shields.tick(2.0);
        assert!((shields.quadrant(Quadrant::Front).current_strength - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_recharge_multipliers() {
        let mut shields = corvette();
        shields.absorb_damage(10.0, BOW);
        shields.set_energy_allocation(2.0).unwrap();
        shields.set_subsystem_health(0.5).unwrap();
        shields.tick(4.0);
        // 2.5 * 2.0 * 0.5 = 2.5/s for 1 s
        assert!((shields.quadrant(Quadrant::Front).current_strength - 17.5).abs() < 1e-9);

        assert!(shields.set_energy_allocation(3.5).is_err());
        assert!(shields.set_subsystem_health(-0.1).is_err());
    }

    #[test]
    fn test_distribution_validation() {
        let mut shields = corvette();
        let before = shields.get_shield_status();
        let result = shields.set_distribution([0.5, 0.5, 0.5, 0.0]);
        assert!(matches!(result, Err(DamageError::InvalidDistribution(_))));
        assert_eq!(shields.get_shield_status(), before);

        shields.set_distribution([0.4, 0.2, 0.2, 0.2]).unwrap();
        assert!((shields.quadrant(Quadrant::Front).max_strength - 40.0).abs() < 1e-9);
        assert!((shields.quadrant(Quadrant::Rear).current_strength - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_transfer_bounds() {
        let mut shields = corvette();
        shields.absorb_damage(10.0, BOW);

        // Front has 10 headroom
        let moved = shields.transfer(1, 0, 50.0).unwrap();
        assert!((moved - 10.0).abs() < 1e-9);
        assert!((shields.quadrant(Quadrant::Front).current_strength - 25.0).abs() < 1e-9);
        assert!((shields.quadrant(Quadrant::Rear).current_strength - 15.0).abs() < 1e-9);

        assert!(matches!(shields.transfer(4, 0, 1.0), Err(DamageError::InvalidQuadrant(4))));
        assert!(shields.transfer(2, 2, 1.0).is_err());
    }

    #[test]
    fn test_quadrant_try_from() {
        assert_eq!(Quadrant::try_from(3).unwrap(), Quadrant::Right);
        assert!(Quadrant::try_from(9).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let mut shields = corvette();
        shields.set_distribution([0.4, 0.2, 0.2, 0.2]).unwrap();
        shields.absorb_damage(30.0, BOW);
        shields.tick(1.0);

        let data = shields.save_data();
        let mut restored = corvette();
        restored.load_save_data(&data).unwrap();
        assert_eq!(restored.get_shield_status(), shields.get_shield_status());
    }

    #[test]
    fn test_load_rejects_bad_distribution() {
        let mut shields = corvette();
        let mut data = shields.save_data();
        data.insert("distribution".to_string(), serde_json::json!([0.9, 0.9, 0.0, 0.0]));
        assert!(shields.load_save_data(&data).is_err());
        assert_eq!(shields.distribution(), [0.25; 4]);
    }

    proptest! {
        #[test]
        fn prop_quadrant_totals_bounded(
            hits in prop::collection::vec((0.0f64..200.0, -1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0, 0.0f64..2.0), 1..40)
        ) {
            let mut shields = ShieldQuadrantManager::new(400.0, 40.0, ShipType::Cruiser, ShieldConstants::default());
            for (amount, x, y, z, dt) in hits {
                let result = shields.absorb_damage(amount, DVec3::new(x, y, z));
                prop_assert!(result.absorbed <= amount + 1e-9);
                shields.tick(dt);

                prop_assert!(shields.total_current() <= shields.total_max() + 1e-9);
                for q in Quadrant::all() {
                    let state = shields.quadrant(*q);
                    prop_assert!(state.current_strength >= 0.0);
                    prop_assert!(state.current_strength <= state.max_strength + 1e-9);
                }
            }
        }
    }
}
