//! Critical events, cascades, emergency protocols and catastrophic failure

mod active;
mod protocols;
mod system;
mod types;

pub use active::{ActiveEventStatus, CriticalEvent};
pub use protocols::{EmergencyProtocol, EmergencyProtocols, ProtocolState, ProtocolStatus};
pub use system::{
    BlastDamage, CriticalDamageSystem, CriticalStats, CriticalStatus, CriticalUpdate, PerformanceState,
    ShipCriticalState,
};
pub use types::{CriticalEventConfig, CriticalEventType, SpecialEffect};
