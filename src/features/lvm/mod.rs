mod collector;

pub use collector::{PhysicalVolumeProbe, VolumeGroupProbe, LOGICAL_VOLUME_ROW};
