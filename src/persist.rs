use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sampler::Observation;

pub const CSV_HEADER: &str = "time,cpu,memory,disk,rows_written";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Overwrite `path` with the full snapshot. Every flush rewrites the file
/// from scratch; there is no append mode and no rotation, so I/O cost per
/// flush grows with the buffer.
///
/// Returns the number of data rows written.
pub fn write_snapshot(path: &Path, rows: &[Observation]) -> Result<usize, PersistError> {
    let wrap = |source: io::Error| PersistError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(wrap)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{CSV_HEADER}").map_err(wrap)?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{},{}",
            row.timestamp.format(TIMESTAMP_FORMAT),
            row.cpu_percent,
            row.memory_used,
            row.disk_used,
            row.rows_written,
        )
        .map_err(wrap)?;
    }
    out.flush().map_err(wrap)?;
    Ok(rows.len())
}
