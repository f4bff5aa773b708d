use std::sync::Arc;
use crate::engine::models::ProbeKind::{Concurrent, Sequential};
use crate::features::commands::CommandProbe;
use crate::features::network::NetworkCountersProbe;
use crate::features::platform::ProbeSet;
use crate::features::system_metrics::{CpuMemoryProbe, DiskUsageProbe};
use crate::shared::command::CommandSpec;

pub(super) fn info_probes() -> ProbeSet {
    vec![Arc::new(
        CommandProbe::new("system_info", Sequential)
            .line("uname -a")
            .line("sw_vers"),
    )]
}

pub(super) fn collection_probes() -> ProbeSet {
    vec![
        Arc::new(CpuMemoryProbe::new(Concurrent)),
        Arc::new(DiskUsageProbe::new(Concurrent)),
        Arc::new(NetworkCountersProbe::new(Concurrent)),
        Arc::new(CommandProbe::single("vm_stat", Concurrent, "vm_stat")),
        Arc::new(CommandProbe::new("cpu_sysctl", Concurrent).command(
            CommandSpec::parse("sysctl -a").grep(r"machdep\.cpu"),
        )),
        Arc::new(CommandProbe::single("memsize", Concurrent, "sysctl -n hw.memsize")),
        Arc::new(CommandProbe::single("disk_free", Concurrent, "df -h")),
        Arc::new(CommandProbe::single("diskutil", Concurrent, "diskutil list")),
        Arc::new(CommandProbe::single("disk_io", Concurrent, "iostat -Id 1 2")),
        Arc::new(CommandProbe::single("network_interfaces", Concurrent, "netstat -i")),
        Arc::new(CommandProbe::single("ifconfig", Concurrent, "ifconfig")),
        Arc::new(CommandProbe::single("process_list", Sequential, "ps aux")),
        Arc::new(CommandProbe::single("process_top", Sequential, "top -l 1 -n 10")),
        Arc::new(CommandProbe::single("top_summary", Sequential, "top -l 1")),
        Arc::new(
            CommandProbe::new("filesystem_nfs", Sequential)
                .line("mount")
                .line("nfsstat"),
        ),
        Arc::new(CommandProbe::new("error_log", Sequential).command(error_log_query())),
    ]
}

/// Unified log errors from the last ten minutes; an unbounded `log show`
/// walks the whole store.
pub(super) fn error_log_query() -> CommandSpec {
    CommandSpec::new("log").args([
        "show",
        "--last",
        "10m",
        "--predicate",
        "eventMessage contains \"error\"",
        "--info",
    ])
}
