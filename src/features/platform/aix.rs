use std::sync::Arc;
use std::time::Duration;
use crate::engine::models::ProbeKind::{self, Concurrent, Sequential};
use crate::features::commands::CommandProbe;
use crate::features::lvm::{PhysicalVolumeProbe, VolumeGroupProbe};
use crate::features::platform::ProbeSet;
use crate::shared::command::CommandSpec;

/// Per-command budget; a stuck AIX tool is cut off and the probe moves on.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

fn commands(name: &str, kind: ProbeKind) -> CommandProbe {
    CommandProbe::new(name, kind).command_timeout(COMMAND_TIMEOUT)
}

pub(super) fn info_probes() -> ProbeSet {
    vec![Arc::new(
        commands("system_info", Sequential)
            .line("uname -a")
            .line("oslevel -s")
            .line("lsattr -El sys0")
            .line("pmcycles -d")
            .line("lparstat -i"),
    )]
}

pub(super) fn collection_probes() -> ProbeSet {
    vec![
        Arc::new(PhysicalVolumeProbe::new(Concurrent)),
        Arc::new(
            commands("network", Concurrent)
                .line("netstat -v")
                .line("entstat -d ent0")
                .line("ifconfig -a"),
        ),
        Arc::new(
            commands("cpu_memory", Sequential)
                .line("vmstat 1 3")
                .line("lsattr -El sys0")
                .line("mpstat 1 3")
                .command(CommandSpec::parse("svmon -G -O affinity=on").head(20)),
        ),
        Arc::new(VolumeGroupProbe::new(Sequential)),
        Arc::new(
            commands("processes", Sequential)
                .line("ps -ef")
                .line("svmon -G")
                .command(CommandSpec::parse("svmon -P").head(20))
                .line("topas"),
        ),
        Arc::new(
            commands("paging", Sequential)
                .line("lsps -a")
                .line("vmstat -s"),
        ),
        Arc::new(
            commands("filesystem_nfs", Sequential)
                .line("lsfs")
                .line("nfsstat -s")
                .line("nfsstat -c")
                .line("mount"),
        ),
        Arc::new(commands("error_report", Sequential).command(CommandSpec::parse("errpt -a").head(20))),
    ]
}
