use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use crate::engine::models::{Payload, ProbeContext, ProbeKind};
use crate::shared::command::{enumerate, CommandSpec, Transcript};
use crate::shared::error::ProbeFailure;
use crate::shared::traits::Probe;

/// Budget for each LVM and disk attribute command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
/// `iostat -DlR` samples for a second but can hang on a sick disk.
pub const DISK_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Data rows of `lsvg -l <vg>` start with `NAME TYPE LPs`; headers do not.
pub const LOGICAL_VOLUME_ROW: &str = r"^\S+\s+\S+\s+\d+";

fn lvm_command(program: &str, args: &[&str]) -> CommandSpec {
    CommandSpec::new(program)
        .args(args.iter().copied())
        .timeout(COMMAND_TIMEOUT)
}

/// Lists physical volumes, then disk attributes and I/O for each of them.
pub struct PhysicalVolumeProbe {
    kind: ProbeKind,
    listing: CommandSpec,
}

impl PhysicalVolumeProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self::with_listing(kind, CommandSpec::new("lspv").timeout(COMMAND_TIMEOUT))
    }

    pub fn with_listing(kind: ProbeKind, listing: CommandSpec) -> Self {
        Self { kind, listing }
    }

    fn disk_commands(disk: &str) -> [CommandSpec; 2] {
        [
            CommandSpec::new("lsattr")
                .args(["-El", disk])
                .timeout(COMMAND_TIMEOUT),
            CommandSpec::new("iostat")
                .args(["-DlR", disk, "1", "1"])
                .timeout(DISK_IO_TIMEOUT),
        ]
    }
}

#[async_trait]
impl Probe for PhysicalVolumeProbe {
    fn name(&self) -> &str {
        "physical_volumes"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        let disks = enumerate(&self.listing).await?;
        if disks.is_empty() {
            return Ok(Payload::Text("No physical volumes found.".to_string()));
        }

        let mut transcript = Transcript::new();
        transcript.note(format!("Physical volumes: {}", disks.join(", ")));
        for disk in &disks {
            debug!("Collecting information for disk: {}", disk);
            for spec in Self::disk_commands(disk) {
                transcript.run(&spec).await;
            }
        }
        transcript.finish()
    }
}

/// Walks volume groups and their logical volumes.
pub struct VolumeGroupProbe {
    kind: ProbeKind,
    listing: CommandSpec,
}

impl VolumeGroupProbe {
    pub fn new(kind: ProbeKind) -> Self {
        Self::with_listing(kind, CommandSpec::new("lsvg").timeout(COMMAND_TIMEOUT))
    }

    pub fn with_listing(kind: ProbeKind, listing: CommandSpec) -> Self {
        Self { kind, listing }
    }

    async fn collect_group(transcript: &mut Transcript, vg: &str) {
        debug!("Collecting information for volume group: {}", vg);
        transcript.run(&lvm_command("lsvg", &[vg])).await;
        transcript.run(&lvm_command("lsvg", &["-l", vg])).await;
        transcript.run(&lvm_command("lsvg", &["-p", vg])).await;

        let rows = lvm_command("lsvg", &["-l", vg]).grep(LOGICAL_VOLUME_ROW);
        let lvs = match enumerate(&rows).await {
            Ok(lvs) => lvs,
            // Already recorded by the `lsvg -l` section above.
            Err(_) => return,
        };
        for lv in &lvs {
            transcript.run(&lvm_command("lslv", &["-l", lv])).await;
            transcript.run(&lvm_command("lslv", &["-m", lv])).await;
        }
    }
}

#[async_trait]
impl Probe for VolumeGroupProbe {
    fn name(&self) -> &str {
        "volume_groups"
    }

    fn kind(&self) -> ProbeKind {
        self.kind
    }

    async fn run(&self, _ctx: &ProbeContext) -> Result<Payload, ProbeFailure> {
        let groups = enumerate(&self.listing).await?;
        if groups.is_empty() {
            return Ok(Payload::Text("No volume groups found.".to_string()));
        }

        let mut transcript = Transcript::new();
        transcript.note(format!("Volume groups: {}", groups.join(", ")));
        for vg in &groups {
            Self::collect_group(&mut transcript, vg).await;
        }
        transcript.finish()
    }
}
