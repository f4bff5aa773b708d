mod collector;
mod models;

pub use collector::NetworkCountersProbe;
pub use models::{InterfaceCounters, NetworkCounters};
