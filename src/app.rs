use std::fs;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

pub use tracing::Level;

use crate::catalog::CatalogClient;
use crate::config::SyncConfig;
use crate::content::ContentClient;
use crate::domain::{DatasetDescriptor, RunOutcome};
use crate::error::SyncError;
use crate::fetcher::DatasetFetcher;
use crate::plan::{SyncPlan, plan, settle_watermark};
use crate::watermark::{WatermarkMap, WatermarkStore};

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Vec::new(),
            elapsed: None,
        }
    }

    pub fn field(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    /// `message key=value ...` as written to the log.
    pub fn render(&self) -> String {
        let mut line = self.message.clone();
        for (key, value) in &self.fields {
            line.push_str(&format!(" {key}={value}"));
        }
        if let Some(elapsed) = self.elapsed {
            line.push_str(&format!(" elapsed_ms={}", elapsed.as_millis()));
        }
        line
    }
}

/// Receives run events; called from worker threads.
pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

/// Forwards events to the `tracing` subscriber installed by the binary.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        let line = event.render();
        match event.level {
            Level::ERROR => tracing::error!("{line}"),
            Level::WARN => tracing::warn!("{line}"),
            Level::INFO => tracing::info!("{line}"),
            Level::DEBUG => tracing::debug!("{line}"),
            _ => tracing::trace!("{line}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_date: String,
    pub output_dir: String,
    pub catalog_size: usize,
    pub unchanged: usize,
    pub successful: usize,
    pub failed: usize,
    pub outcomes: Vec<RunOutcome>,
}

impl RunSummary {
    pub fn summary_line(&self) -> String {
        format!("{} successful, {} failed", self.successful, self.failed)
    }
}

pub struct App<K: CatalogClient, C: ContentClient> {
    config: SyncConfig,
    store: WatermarkStore,
    catalog: K,
    content: C,
}

impl<K: CatalogClient, C: ContentClient> App<K, C> {
    pub fn new(config: SyncConfig, catalog: K, content: C) -> Self {
        let store = WatermarkStore::new(config.watermark_path.clone());
        Self {
            config,
            store,
            catalog,
            content,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn output_dir(&self, date: NaiveDate) -> Utf8PathBuf {
        self.config
            .data_root
            .join(date.format("%Y-%m-%d").to_string())
    }

    /// Loads the watermark and catalog and computes the work list without
    /// downloading or saving anything.
    pub fn plan(&self, sink: &dyn ProgressSink) -> Result<SyncPlan, SyncError> {
        let previous = self.store.load()?;
        let descriptors = self.fetch_catalog(sink)?;
        Ok(plan(descriptors, &previous))
    }

    pub fn run(&self, sink: &dyn ProgressSink) -> Result<RunSummary, SyncError> {
        self.run_on(chrono::Local::now().date_naive(), sink)
    }

    pub fn run_on(
        &self,
        date: NaiveDate,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, SyncError> {
        let output_dir = self.output_dir(date);
        fs::create_dir_all(output_dir.as_std_path())
            .map_err(|err| SyncError::Filesystem(format!("create {output_dir}: {err}")))?;
        sink.event(
            ProgressEvent::new(Level::INFO, "starting sync").field("output_dir", &output_dir),
        );

        let previous = self.store.load()?;
        let descriptors = self.fetch_catalog(sink)?;
        let catalog_size = descriptors.len();
        let plan = plan(descriptors, &previous);

        let mut summary = RunSummary {
            run_date: date.to_string(),
            output_dir: output_dir.to_string(),
            catalog_size,
            unchanged: plan.unchanged,
            successful: 0,
            failed: 0,
            outcomes: Vec::new(),
        };

        if plan.is_empty() {
            sink.event(ProgressEvent::new(Level::INFO, "no new datasets to download"));
            self.save_watermark(&plan, &previous, &[], sink)?;
            return Ok(summary);
        }

        sink.event(
            ProgressEvent::new(Level::INFO, "downloading datasets")
                .field("count", plan.work.len())
                .field("workers", self.config.max_workers),
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .thread_name(|index| format!("catalog-sync-{index}"))
            .build()
            .map_err(|err| SyncError::WorkerPool(err.to_string()))?;

        let start = Instant::now();
        let fetcher = DatasetFetcher::new(&self.content, sink);
        let outcomes: Vec<RunOutcome> = pool.install(|| {
            plan.work
                .par_iter()
                .map(|descriptor| fetcher.process(descriptor, &output_dir))
                .collect()
        });

        for outcome in &outcomes {
            if outcome.succeeded() {
                summary.successful += 1;
                sink.event(
                    ProgressEvent::new(Level::INFO, "ok").field("dataset", &outcome.identifier),
                );
            } else {
                summary.failed += 1;
                sink.event(
                    ProgressEvent::new(Level::ERROR, "failed")
                        .field("dataset", &outcome.identifier),
                );
            }
        }

        self.save_watermark(&plan, &previous, &outcomes, sink)?;
        summary.outcomes = outcomes;
        sink.event(
            ProgressEvent::new(Level::INFO, "sync complete")
                .field("successful", summary.successful)
                .field("failed", summary.failed)
                .elapsed(start.elapsed()),
        );
        Ok(summary)
    }

    fn fetch_catalog(
        &self,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<DatasetDescriptor>, SyncError> {
        match self.catalog.fetch_catalog() {
            Ok(descriptors) => {
                sink.event(
                    ProgressEvent::new(Level::INFO, "catalog fetched")
                        .field("theme", &self.config.theme)
                        .field("datasets", descriptors.len()),
                );
                Ok(descriptors)
            }
            Err(err) => {
                sink.event(
                    ProgressEvent::new(Level::ERROR, "catalog fetch failed")
                        .field("url", &self.config.catalog_url)
                        .field("error", &err),
                );
                Err(err)
            }
        }
    }

    fn save_watermark(
        &self,
        plan: &SyncPlan,
        previous: &WatermarkMap,
        outcomes: &[RunOutcome],
        sink: &dyn ProgressSink,
    ) -> Result<(), SyncError> {
        let watermark = settle_watermark(
            plan.watermark.clone(),
            previous,
            outcomes,
            self.config.watermark_policy,
        );
        self.store.save(&watermark).inspect_err(|err| {
            sink.event(
                ProgressEvent::new(Level::ERROR, "watermark save failed")
                    .field("path", self.store.path())
                    .field("error", err),
            );
        })
    }
}
