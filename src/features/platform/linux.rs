use std::sync::Arc;
use crate::engine::models::ProbeKind::{Concurrent, Sequential};
use crate::features::commands::CommandProbe;
use crate::features::filesystem::NfsMountsProbe;
use crate::features::network::NetworkCountersProbe;
use crate::features::platform::ProbeSet;
use crate::features::process::ProcessScanProbe;
use crate::features::system_metrics::{CpuMemoryProbe, DiskUsageProbe, PagingProbe};
use crate::shared::command::CommandSpec;

const SYSLOG: &str = "/var/log/syslog";
const MESSAGES: &str = "/var/log/messages";

pub(super) fn info_probes() -> ProbeSet {
    vec![Arc::new(
        CommandProbe::new("system_info", Sequential)
            .line("uname -a")
            .line("lsb_release -a"),
    )]
}

pub(super) fn collection_probes() -> ProbeSet {
    vec![
        Arc::new(CpuMemoryProbe::new(Concurrent)),
        Arc::new(CommandProbe::new("proc_stat", Concurrent).command(
            CommandSpec::parse("cat /proc/stat")
                .head(5)
                .requires_path("/proc/stat"),
        )),
        Arc::new(DiskUsageProbe::new(Concurrent)),
        Arc::new(CommandProbe::new("disk_io", Concurrent).command_or(
            CommandSpec::parse("iostat -xm 1 5"),
            CommandSpec::parse("vmstat 1 5"),
        )),
        Arc::new(NetworkCountersProbe::new(Concurrent)),
        Arc::new(CommandProbe::single("network_interfaces", Concurrent, "netstat -i")),
        Arc::new(CommandProbe::single("socket_summary", Concurrent, "ss -s")),
        Arc::new(PagingProbe::new(Concurrent)),
        Arc::new(CommandProbe::single("paging_vmstat", Concurrent, "vmstat 1 5")),
        Arc::new(ProcessScanProbe::new(Sequential)),
        Arc::new(CommandProbe::single("process_top", Sequential, "top -bn1")),
        Arc::new(CommandProbe::single("open_files", Sequential, "lsof")),
        Arc::new(CommandProbe::single("process_tree", Sequential, "pstree")),
        Arc::new(
            CommandProbe::new("filesystem", Sequential)
                .line("df -h")
                .line("mount")
                .line("du -sh /var"),
        ),
        Arc::new(
            CommandProbe::new("nfs_stats", Sequential)
                .line("nfsstat -s")
                .line("nfsstat -c"),
        ),
        Arc::new(NfsMountsProbe::new(Sequential)),
        Arc::new(
            CommandProbe::new("system_logs", Sequential)
                .command(CommandSpec::new("tail").args(["-n", "50", SYSLOG]).requires_path(SYSLOG))
                .command(CommandSpec::new("tail").args(["-n", "50", MESSAGES]).requires_path(MESSAGES)),
        ),
    ]
}
