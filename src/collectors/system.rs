use crate::collectors::{DiskUsage, MemoryUsage, ResourceSnapshot};
use crate::tools::HostTools;
use std::io::{self, Write};
use sysinfo::{System, SystemExt};
#[cfg(unix)]
use tracing::debug;

const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

pub fn collect_resources(system: &mut System, tools: &dyn HostTools) -> ResourceSnapshot {
    system.refresh_memory();

    let disk = root_fs_stats().map(DiskUsage::from);
    let memory = memory_usage(system.total_memory(), system.available_memory());
    let temperature = tools.read_temperature();

    ResourceSnapshot {
        disk,
        memory,
        temperature,
    }
}

pub fn render_resources(snapshot: &ResourceSnapshot, out: &mut impl Write) -> io::Result<()> {
    match &snapshot.disk {
        Some(d) => writeln!(
            out,
            "💾 Disk Usage: {} GB used / {} GB total",
            d.used_gb, d.total_gb
        )?,
        None => writeln!(out, "💾 Disk info:  Not available")?,
    }
    match &snapshot.memory {
        Some(m) => writeln!(
            out,
            "🧠 RAM Usage:  {} MB used / {} MB total",
            m.used_mb, m.total_mb
        )?,
        None => writeln!(out, "🧠 RAM info:   Not available (Are you on Linux?)")?,
    }
    if let Some(temp) = &snapshot.temperature {
        writeln!(out, "🔥 CPU Temp:   {temp}")?;
    }
    Ok(())
}

pub fn report(
    system: &mut System,
    tools: &dyn HostTools,
    out: &mut impl Write,
) -> io::Result<ResourceSnapshot> {
    let snapshot = collect_resources(system, tools);
    render_resources(&snapshot, out)?;
    Ok(snapshot)
}

/// Raw block counters of one filesystem, as statvfs reports them.
#[derive(Debug, Clone, Copy)]
struct FsStats {
    blocks: u64,
    blocks_free: u64,
    blocks_available: u64,
    fragment_size: u64,
}

// Used counts blocks reserved for root, like `df`: total minus free, not minus available.
impl From<FsStats> for DiskUsage {
    fn from(stats: FsStats) -> Self {
        let total = stats.blocks.saturating_mul(stats.fragment_size);
        let free = stats.blocks_free.saturating_mul(stats.fragment_size);
        DiskUsage {
            used_gb: total.saturating_sub(free) / GIB,
            total_gb: total / GIB,
        }
    }
}

#[cfg(unix)]
fn root_fs_stats() -> Option<FsStats> {
    use nix::sys::statvfs::statvfs;

    match statvfs("/") {
        Ok(stats) => {
            let fs = FsStats {
                blocks: stats.blocks() as u64,
                blocks_free: stats.blocks_free() as u64,
                blocks_available: stats.blocks_available() as u64,
                fragment_size: stats.fragment_size() as u64,
            };
            debug!(
                blocks = fs.blocks,
                free = fs.blocks_free,
                available = fs.blocks_available,
                fragment_size = fs.fragment_size,
                "root filesystem counters"
            );
            Some(fs)
        }
        Err(err) => {
            debug!(error = %err, "statvfs on / failed");
            None
        }
    }
}

#[cfg(not(unix))]
fn root_fs_stats() -> Option<FsStats> {
    None
}

// Both counters are in bytes; a zero total means the platform exposes none.
fn memory_usage(total_bytes: u64, available_bytes: u64) -> Option<MemoryUsage> {
    if total_bytes == 0 {
        return None;
    }
    let total_mb = total_bytes / MIB;
    let available_mb = available_bytes / MIB;
    Some(MemoryUsage {
        used_mb: total_mb.saturating_sub(available_mb),
        total_mb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolError;

    struct FixedTemp(Option<&'static str>);

    impl HostTools for FixedTemp {
        fn list_containers(&self) -> Result<Vec<String>, ToolError> {
            Ok(Vec::new())
        }

        fn read_temperature(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn rendered(snapshot: &ResourceSnapshot) -> String {
        let mut buf = Vec::new();
        render_resources(snapshot, &mut buf).expect("write to vec");
        String::from_utf8(buf).expect("utf8")
    }

    const BLOCK: u64 = 4096;

    #[test]
    fn disk_used_counts_reserved_blocks_as_free() {
        let usage = DiskUsage::from(FsStats {
            blocks: 100 * GIB / BLOCK,
            blocks_free: 60 * GIB / BLOCK,
            blocks_available: 40 * GIB / BLOCK,
            fragment_size: BLOCK,
        });
        assert_eq!(
            usage,
            DiskUsage {
                used_gb: 40,
                total_gb: 100
            }
        );
    }

    #[test]
    fn disk_usage_truncates_to_whole_gigabytes() {
        let usage = DiskUsage::from(FsStats {
            blocks: (100 * GIB + GIB / 2) / BLOCK,
            blocks_free: (40 * GIB + GIB / 3) / BLOCK,
            blocks_available: 0,
            fragment_size: BLOCK,
        });
        assert_eq!(
            usage,
            DiskUsage {
                used_gb: 60,
                total_gb: 100
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn root_filesystem_is_readable() {
        let stats = root_fs_stats().expect("statvfs on /");
        assert!(stats.blocks_free <= stats.blocks);
        let usage = DiskUsage::from(stats);
        assert!(usage.used_gb <= usage.total_gb);
    }

    #[test]
    fn memory_used_is_total_minus_available() {
        let usage = memory_usage(8000 * MIB, 2500 * MIB + 512).expect("counters present");
        assert_eq!(usage.total_mb, 8000);
        assert_eq!(usage.used_mb, 5500);
        assert_eq!(memory_usage(0, 0), None);
        let odd = memory_usage(MIB, 2 * MIB).expect("counters present");
        assert_eq!(odd.used_mb, 0);
    }

    #[test]
    fn renders_all_lines() {
        let text = rendered(&ResourceSnapshot {
            disk: Some(DiskUsage {
                used_gb: 12,
                total_gb: 58,
            }),
            memory: Some(MemoryUsage {
                used_mb: 1024,
                total_mb: 3906,
            }),
            temperature: Some("temp=51.0'C".to_string()),
        });
        assert_eq!(
            text,
            "💾 Disk Usage: 12 GB used / 58 GB total\n\
             🧠 RAM Usage:  1024 MB used / 3906 MB total\n\
             🔥 CPU Temp:   temp=51.0'C\n"
        );
    }

    #[test]
    fn missing_counters_fall_back_and_temperature_is_omitted() {
        let text = rendered(&ResourceSnapshot::default());
        assert!(text.contains("Disk info:  Not available"));
        assert!(text.contains("RAM info:   Not available"));
        assert!(!text.contains("CPU Temp"));
    }

    #[test]
    fn report_reads_live_counters() {
        let mut system = System::new();
        let mut buf = Vec::new();
        let snapshot =
            report(&mut system, &FixedTemp(Some("temp=40.0'C")), &mut buf).expect("report");
        assert_eq!(snapshot.temperature.as_deref(), Some("temp=40.0'C"));
        if let Some(mem) = &snapshot.memory {
            assert!(mem.used_mb <= mem.total_mb);
        }
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("CPU Temp:   temp=40.0'C"));
    }
}
