//! Hull state, subsystem damage and the per-ship damage coordinator

mod manager;
mod state;
mod subsystems;

pub use manager::{DamageManager, DamageReport, HullStatus};
pub use state::{HullState, HullThreshold};
pub use subsystems::{NearbySubsystem, Subsystem, SubsystemGrid, SubsystemProvider, SubsystemRef};
