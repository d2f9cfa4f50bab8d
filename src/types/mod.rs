//! Core value types for the SAT>IP client

mod channel;
mod device;

pub use channel::{ChannelSpec, ModulationSystem, ModulationType, Polarisation};
pub use device::{Capability, DeviceInfo};
