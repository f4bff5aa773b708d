pub mod commands;
pub mod filesystem;
pub mod lvm;
pub mod network;
pub mod platform;
pub mod process;
pub mod system_metrics;
