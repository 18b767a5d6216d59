mod collector;

pub use collector::SystemMetrics;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("no mounted filesystem contains {}", .0.display())]
    DiskNotFound(PathBuf),
    #[error("metrics source unavailable: {0}")]
    Unavailable(String),
}

/// Source of instantaneous host readings. The sampler never derives these
/// values itself; everything comes through this trait so tests can substitute
/// a scripted provider for the live system.
pub trait MetricsProvider {
    /// Global processor utilization since the previous reading, in percent.
    fn cpu_percent(&mut self) -> Result<f32, MetricsError>;

    /// Bytes of physical memory currently in use.
    fn memory_used_bytes(&mut self) -> Result<u64, MetricsError>;

    /// Bytes in use on the filesystem containing `path`.
    fn disk_used_bytes(&mut self, path: &Path) -> Result<u64, MetricsError>;
}
