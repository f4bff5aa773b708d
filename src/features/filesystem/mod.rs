pub mod models;
pub mod collector;

pub use models::{parse_mount_table, MountEntry};
pub use collector::{NfsMountsProbe, PROC_MOUNTS};
