//! Defense primitives - armor resistance, penetration, weapon effectiveness

mod penetration;
mod resistance;
mod weapon_penetration;

pub use penetration::{PenetrationCalculator, PenetrationResult};
pub use resistance::{
    angle_modifier, base_resistance, effective_resistance, thickness_modifier, ArmorHit,
    ArmorResistanceCalculator, ResistanceOutcome,
};
pub use weapon_penetration::{WeaponPenetrationResult, WeaponPenetrationSystem};

/// Fixed defense tables
pub mod constants {
    /// Armor class x damage type resistance
    /// Columns: kinetic, energy, explosive, beam, plasma
    pub const RESISTANCE_MATRIX: [[f64; 5]; 6] = [
        [0.00, 0.00, 0.00, 0.00, 0.00], // none
        [0.15, 0.10, 0.12, 0.08, 0.10], // light
        [0.30, 0.20, 0.25, 0.15, 0.20], // standard
        [0.45, 0.35, 0.40, 0.30, 0.35], // heavy
        [0.60, 0.50, 0.55, 0.45, 0.50], // capital
        [0.75, 0.65, 0.70, 0.60, 0.65], // super capital
    ];

    /// Weapon type x armor class effectiveness
    /// Columns: none, light, standard, heavy, capital, super capital
    pub const WEAPON_ARMOR_MATRIX: [[f64; 6]; 7] = [
        [1.00, 1.00, 0.90, 0.75, 0.60, 0.50], // mass driver
        [1.00, 1.10, 1.10, 1.05, 1.00, 0.90], // railgun
        [1.20, 1.10, 0.95, 0.80, 0.70, 0.60], // laser
        [1.10, 1.10, 1.05, 0.95, 0.85, 0.75], // plasma cannon
        [1.30, 1.20, 1.00, 0.85, 0.75, 0.65], // missile
        [1.20, 1.20, 1.15, 1.10, 1.05, 1.00], // torpedo
        [0.60, 0.60, 0.55, 0.50, 0.45, 0.40], // ion cannon
    ];

    /// Impact angle bands (upper bound in degrees, resistance modifier)
    pub const ANGLE_BANDS: [(f64, f64); 3] = [(15.0, 1.0), (45.0, 0.85), (75.0, 0.5)];

    /// Modifier for anything past the last band
    pub const DEFLECTION_MODIFIER: f64 = 0.25;

    /// Angle above which kinetic rounds can ricochet
    pub const RICOCHET_ANGLE: f64 = 70.0;

    /// Line-of-sight thickness never exceeds this multiple of nominal
    pub const MAX_SLOPE_FACTOR: f64 = 5.0;

    /// Maximum cached penetration / interaction results
    pub const MAX_CACHE_ENTRIES: usize = 1024;
}
