mod log;

pub use log::{Observation, ObservationLog};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::format::format_bytes;
use crate::metrics::{MetricsError, MetricsProvider};
use crate::persist::{self, PersistError};

#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub sample_interval: Duration,
    pub save_interval: Duration,
    pub output_path: PathBuf,
    pub disk_path: PathBuf,
    pub max_samples: Option<usize>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            sample_interval: Duration::from_secs(1),
            save_interval: Duration::from_secs(10),
            output_path: PathBuf::from("monitor.csv"),
            disk_path: PathBuf::from("/"),
            max_samples: None,
        }
    }
}

impl SamplerSettings {
    pub fn from_config(config: &Config) -> Self {
        SamplerSettings {
            sample_interval: Duration::from_secs(config.sampler.sample_interval_secs),
            save_interval: Duration::from_secs(config.sampler.save_interval_secs),
            output_path: config.persistence.path.clone(),
            disk_path: config.disk.path.clone(),
            max_samples: config.sampler.max_samples,
        }
    }
}

/// Everything shared between the loop and callers lives behind one lock, so
/// the stop flag and the log can never be observed in an inconsistent
/// combination.
struct SamplerState {
    log: ObservationLog,
    stop_requested: bool,
}

/// Owns the observation buffer and the polling policy. `run` executes on its
/// own task; `fetch` and `stop` are called from the controlling side.
pub struct Sampler {
    settings: SamplerSettings,
    state: Mutex<SamplerState>,
}

impl Sampler {
    pub fn new(settings: SamplerSettings) -> Self {
        Sampler {
            state: Mutex::new(SamplerState {
                log: ObservationLog::new(settings.max_samples),
                stop_requested: false,
            }),
            settings,
        }
    }

    fn state(&self) -> MutexGuard<'_, SamplerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Poll until a stop request is observed. Readings or flushes that fail
    /// skip the iteration with a warning; the loop itself only ends on
    /// `stop`. The sleep is the sole suspension point and happens outside
    /// the lock.
    pub async fn run<P: MetricsProvider>(&self, provider: &mut P) {
        let mut last_save = Instant::now();
        loop {
            if self.state().stop_requested {
                break;
            }
            if let Err(err) = self.sample(provider, &mut last_save) {
                tracing::warn!(error = %err, "sample skipped");
            }
            tokio::time::sleep(self.settings.sample_interval).await;
        }

        // One last flush so a stop between save intervals loses nothing.
        let snapshot = self.state().log.snapshot();
        if snapshot.is_empty() {
            return;
        }
        match persist::write_snapshot(&self.settings.output_path, &snapshot) {
            Ok(rows) => tracing::info!(rows, "final flush complete"),
            Err(err) => tracing::warn!(error = %err, "final flush failed"),
        }
    }

    /// Capture one observation, append it, and flush the whole log when the
    /// save interval has elapsed. A provider failure propagates before
    /// anything is appended, so a failed iteration leaves no partial record.
    /// A flush failure leaves `last_save` untouched and the buffer intact,
    /// so the next interval retries.
    pub fn sample<P: MetricsProvider>(
        &self,
        provider: &mut P,
        last_save: &mut Instant,
    ) -> Result<(), SampleError> {
        let observation = Observation {
            timestamp: Utc::now(),
            cpu_percent: provider.cpu_percent()?,
            memory_used: provider.memory_used_bytes()?,
            disk_used: provider.disk_used_bytes(&self.settings.disk_path)?,
            rows_written: 0,
        };
        tracing::debug!(
            cpu = observation.cpu_percent,
            memory = %format_bytes(observation.memory_used),
            disk = %format_bytes(observation.disk_used),
            "sampled"
        );

        let now = Instant::now();
        let due = {
            let mut state = self.state();
            state.log.push(observation);
            if now.duration_since(*last_save) >= self.settings.save_interval {
                Some(state.log.snapshot())
            } else {
                None
            }
        };

        if let Some(snapshot) = due {
            let rows = persist::write_snapshot(&self.settings.output_path, &snapshot)?;
            *last_save = now;
            tracing::debug!(rows, path = %self.settings.output_path.display(), "flushed");
        }
        Ok(())
    }

    /// Copy of the buffered observations, optionally restricted to an
    /// inclusive time window. Never hands out a live reference, so callers
    /// can iterate while the loop keeps appending.
    pub fn fetch(
        &self,
        time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Vec<Observation> {
        let state = self.state();
        match time_range {
            None => state.log.snapshot(),
            Some((start, end)) => state.log.range(start, end),
        }
    }

    /// Request the loop to stop. Asynchronous and idempotent: the loop
    /// observes the flag at the top of its next iteration, finishing any
    /// in-flight sample first.
    pub fn stop(&self) {
        self.state().stop_requested = true;
    }
}

/// A running sampler: the shared `Sampler` plus the task executing its loop.
pub struct SamplerHandle {
    sampler: Arc<Sampler>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn spawn<P>(sampler: Arc<Sampler>, mut provider: P) -> Self
    where
        P: MetricsProvider + Send + 'static,
    {
        let task = tokio::spawn({
            let sampler = Arc::clone(&sampler);
            async move { sampler.run(&mut provider).await }
        });
        SamplerHandle { sampler, task }
    }

    pub fn fetch(
        &self,
        time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Vec<Observation> {
        self.sampler.fetch(time_range)
    }

    pub fn stop(&self) {
        self.sampler.stop();
    }

    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(self) {
        self.sampler.stop();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "sampling task did not shut down cleanly");
        }
    }
}
