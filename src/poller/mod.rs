//! Adaptive status poller for uploaded records.
//!
//! Polls the record list while any record is still processing. The
//! scheduled interval stretches as consecutive poll cycles fail, scheduled
//! fetches are debounced against recent ones, and each fetch retries
//! internally with exponential backoff before giving up on the cycle.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, AudioRecord, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    /// Nothing is processing; no polls are scheduled.
    Idle,
    /// At least one record is processing and polls are on schedule.
    Polling,
    /// The last cycle gave up; polling continues at a stretched interval.
    Backoff,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub base_interval: Duration,
    pub max_interval: Duration,
    /// Scheduled fetches this close to the previous fetch are skipped.
    pub min_spacing: Duration,
    pub attempt_base_delay: Duration,
    pub attempt_max_delay: Duration,
    pub max_attempt_failures: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
            min_spacing: Duration::from_secs(5),
            attempt_base_delay: Duration::from_secs(1),
            attempt_max_delay: Duration::from_secs(30),
            max_attempt_failures: 3,
        }
    }
}

impl PollerConfig {
    pub fn from_settings(settings: &crate::config::PollerConfig) -> Self {
        Self {
            base_interval: Duration::from_secs(settings.base_interval_seconds),
            max_interval: Duration::from_secs(settings.max_interval_seconds),
            min_spacing: Duration::from_secs(settings.min_spacing_seconds),
            ..Self::default()
        }
    }
}

/// Scheduled interval stretched by the number of failed cycles:
/// base * (1 + retries * 0.5), capped at the maximum.
pub fn adaptive_interval(config: &PollerConfig, retry_count: u32) -> Duration {
    let stretched = config
        .base_interval
        .mul_f64(1.0 + retry_count as f64 * 0.5);
    stretched.min(config.max_interval)
}

/// Within-fetch retry delay: base * 2^attempt, capped.
pub fn attempt_backoff(config: &PollerConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    let delay = config.attempt_base_delay.saturating_mul(factor);
    delay.min(config.attempt_max_delay)
}

#[async_trait]
pub trait RecordSource {
    async fn fetch_records(&self) -> Result<Vec<AudioRecord>, ApiError>;
}

#[async_trait]
impl RecordSource for ApiClient {
    async fn fetch_records(&self) -> Result<Vec<AudioRecord>, ApiError> {
        self.list_records().await
    }
}

#[async_trait]
impl RecordSource for std::sync::Arc<ApiClient> {
    async fn fetch_records(&self) -> Result<Vec<AudioRecord>, ApiError> {
        self.list_records().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// User-initiated; never debounced.
    Manual,
    /// Timer-initiated; debounced against the previous fetch.
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New data committed.
    Updated,
    /// Fetch succeeded but the records were structurally identical.
    Unchanged,
    /// Debounced; no request was made.
    Skipped,
    /// All attempts failed; the cycle counts as a failure.
    GaveUp,
}

pub struct StatusPoller<S: RecordSource> {
    source: S,
    config: PollerConfig,
    phase: PollerPhase,
    records: Vec<AudioRecord>,
    retry_count: u32,
    last_fetch: Option<Instant>,
    commits: u64,
}

impl<S: RecordSource> StatusPoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self {
            source,
            config,
            phase: PollerPhase::Idle,
            records: Vec::new(),
            retry_count: 0,
            last_fetch: None,
            commits: 0,
        }
    }

    pub fn phase(&self) -> PollerPhase {
        self.phase
    }

    pub fn records(&self) -> &[AudioRecord] {
        &self.records
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Number of commits so far; unchanged fetches do not count.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// One poll cycle: debounce, fetch with internal retries, commit.
    pub async fn fetch(&mut self, kind: FetchKind) -> FetchOutcome {
        if kind == FetchKind::Scheduled {
            if let Some(last) = self.last_fetch {
                if last.elapsed() < self.config.min_spacing {
                    debug!("Skipping scheduled fetch, too soon after the last one");
                    return FetchOutcome::Skipped;
                }
            }
        }
        self.last_fetch = Some(Instant::now());

        let mut failures = 0;
        loop {
            match self.source.fetch_records().await {
                Ok(records) => return self.commit(records),
                Err(e) if e.is_not_found() => {
                    // An empty account reads as a valid empty state.
                    debug!("Record list not found, treating as empty");
                    self.records.clear();
                    self.retry_count = 0;
                    self.phase = PollerPhase::Idle;
                    self.commits += 1;
                    return FetchOutcome::Updated;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.max_attempt_failures {
                        warn!("Poll cycle failed after {} attempts: {}", failures, e);
                        self.retry_count += 1;
                        self.phase = PollerPhase::Backoff;
                        return FetchOutcome::GaveUp;
                    }
                    let delay = attempt_backoff(&self.config, failures - 1);
                    debug!("Fetch attempt {} failed, retrying in {:?}", failures, delay);
                    sleep(delay).await;
                }
            }
        }
    }

    fn commit(&mut self, records: Vec<AudioRecord>) -> FetchOutcome {
        self.retry_count = 0;
        let any_processing = records
            .iter()
            .any(|r| r.status == RecordStatus::Processing);
        self.phase = if any_processing {
            PollerPhase::Polling
        } else {
            PollerPhase::Idle
        };

        if records == self.records {
            return FetchOutcome::Unchanged;
        }
        self.records = records;
        self.commits += 1;
        FetchOutcome::Updated
    }

    /// Poll until no record is processing, invoking `on_update` on every
    /// commit. Starts with an immediate manual fetch.
    pub async fn run<F>(&mut self, mut on_update: F)
    where
        F: FnMut(&[AudioRecord]),
    {
        // The first fetch always reports, even when an empty list matches
        // the poller's initial empty state.
        if self.fetch(FetchKind::Manual).await != FetchOutcome::GaveUp {
            on_update(&self.records);
        }
        while self.phase != PollerPhase::Idle {
            let interval = adaptive_interval(&self.config, self.retry_count);
            debug!("Next poll in {:?} (retry_count={})", interval, self.retry_count);
            sleep(interval).await;
            if self.fetch(FetchKind::Scheduled).await == FetchOutcome::Updated {
                on_update(&self.records);
            }
        }
        info!("All records settled, polling stopped");
    }
}

/// Test source backed by a queue of canned responses.
#[cfg(test)]
pub struct QueueSource {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<Vec<AudioRecord>, ApiError>>>,
}

#[cfg(test)]
impl QueueSource {
    pub fn new(responses: Vec<Result<Vec<AudioRecord>, ApiError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl RecordSource for QueueSource {
    async fn fetch_records(&self) -> Result<Vec<AudioRecord>, ApiError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
