pub mod models;
pub mod collector;

pub use models::{ProcessScan, ProcessSnapshot, HIGH_CPU_PERCENT};
pub use collector::ProcessScanProbe;
