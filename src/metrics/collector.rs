use std::path::Path;

use sysinfo::{Disks, System};

use super::{MetricsError, MetricsProvider};

/// Live readings via `sysinfo`. Each accessor refreshes only the subsystem it
/// reports on; CPU usage is relative to the previous refresh, so the first
/// reading after construction reports 0.
pub struct SystemMetrics {
    sys: System,
    disks: Disks,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMetrics {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        SystemMetrics {
            sys,
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl MetricsProvider for SystemMetrics {
    fn cpu_percent(&mut self) -> Result<f32, MetricsError> {
        self.sys.refresh_cpu_all();
        Ok(self.sys.global_cpu_usage())
    }

    fn memory_used_bytes(&mut self) -> Result<u64, MetricsError> {
        self.sys.refresh_memory();
        Ok(self.sys.used_memory())
    }

    fn disk_used_bytes(&mut self, path: &Path) -> Result<u64, MetricsError> {
        self.disks.refresh(true);
        // Nested mounts: the longest mount-point prefix wins.
        let disk = self
            .disks
            .iter()
            .filter(|d| path.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| MetricsError::DiskNotFound(path.to_path_buf()))?;
        Ok(disk.total_space().saturating_sub(disk.available_space()))
    }
}
