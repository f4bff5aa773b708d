use serde::{Deserialize, Serialize};

/// One line of a mount table (`/proc/mounts` format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub file_system: String,
    pub options: String,
}

impl MountEntry {
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        Some(Self {
            device: fields.next()?.to_string(),
            mount_point: fields.next()?.to_string(),
            file_system: fields.next()?.to_string(),
            options: fields.next().unwrap_or_default().to_string(),
        })
    }

    pub fn is_nfs(&self) -> bool {
        self.file_system.starts_with("nfs")
    }
}

pub fn parse_mount_table(content: &str) -> Vec<MountEntry> {
    content.lines().filter_map(MountEntry::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid 0 0
filer:/export/home /home nfs4 rw,vers=4.1 0 0
filer:/export/data /data nfs rw,vers=3 0 0

";

    #[test]
    fn parses_and_filters_nfs() {
        let entries = parse_mount_table(MOUNTS);
        assert_eq!(entries.len(), 4);

        let nfs: Vec<_> = entries.iter().filter(|e| e.is_nfs()).collect();
        assert_eq!(nfs.len(), 2);
        assert_eq!(nfs[0].device, "filer:/export/home");
        assert_eq!(nfs[0].mount_point, "/home");
        assert_eq!(nfs[1].file_system, "nfs");
    }

    #[test]
    fn short_lines_are_skipped() {
        assert!(MountEntry::parse("garbage").is_none());
    }
}
