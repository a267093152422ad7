use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::app::{Level, ProgressEvent, ProgressSink};
use crate::content::ContentClient;
use crate::domain::{DatasetDescriptor, OutcomeStatus, RunOutcome, Stage};
use crate::error::SyncError;
use crate::table::{ParseStrategy, parse_table, write_table};

pub const OUTPUT_EXTENSION: &str = "csv";

type StageResult<T> = Result<T, (Stage, SyncError)>;

/// Downloads one dataset, normalizes its headers and writes it under the run directory.
pub struct DatasetFetcher<'a, C: ContentClient> {
    content: &'a C,
    sink: &'a dyn ProgressSink,
}

impl<'a, C: ContentClient> DatasetFetcher<'a, C> {
    pub fn new(content: &'a C, sink: &'a dyn ProgressSink) -> Self {
        Self { content, sink }
    }

    /// The identifier must be a single plain file name so the output stays in `output_dir`.
    pub fn output_path(
        output_dir: &Utf8Path,
        descriptor: &DatasetDescriptor,
    ) -> Result<Utf8PathBuf, SyncError> {
        let id = descriptor.identifier.as_str();
        let mut components = Utf8Path::new(id).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Utf8Component::Normal(name)), None) if name == id
        );
        if !single_name || id.contains(['/', '\\']) {
            return Err(SyncError::InvalidIdentifier(id.to_string()));
        }
        Ok(output_dir.join(format!("{id}.{OUTPUT_EXTENSION}")))
    }

    /// Never fails: every stage error becomes a failed outcome for this dataset.
    pub fn process(&self, descriptor: &DatasetDescriptor, output_dir: &Utf8Path) -> RunOutcome {
        self.sink.event(
            ProgressEvent::new(Level::INFO, "downloading dataset")
                .field("dataset", &descriptor.identifier)
                .field("title", &descriptor.title),
        );

        let status = match self.run_stages(descriptor, output_dir) {
            Ok(status) => status,
            Err((stage, err)) => {
                self.sink.event(
                    ProgressEvent::new(Level::ERROR, "dataset failed")
                        .field("dataset", &descriptor.identifier)
                        .field("title", &descriptor.title)
                        .field("stage", stage)
                        .field("error", &err),
                );
                OutcomeStatus::Failed {
                    stage,
                    error: err.to_string(),
                }
            }
        };

        RunOutcome {
            identifier: descriptor.identifier.clone(),
            title: descriptor.title.clone(),
            modified: descriptor.modified.clone(),
            status,
        }
    }

    fn run_stages(
        &self,
        descriptor: &DatasetDescriptor,
        output_dir: &Utf8Path,
    ) -> StageResult<OutcomeStatus> {
        let path =
            Self::output_path(output_dir, descriptor).map_err(|err| (Stage::Persist, err))?;

        let url = descriptor
            .download_url()
            .map_err(|err| (Stage::ResolveUrl, err))?;

        let content = self
            .content
            .fetch(url)
            .map_err(|err| (Stage::Retrieve, err))?;

        let parsed = parse_table(&content).map_err(|err| (Stage::Parse, err))?;
        if parsed.strategy != ParseStrategy::Strict {
            self.sink.event(
                ProgressEvent::new(Level::WARN, "parsed with fallback strategy")
                    .field("dataset", &descriptor.identifier)
                    .field("strategy", format!("{:?}", parsed.strategy))
                    .field("skipped_rows", parsed.skipped_rows),
            );
        }
        let mut table = parsed.table;
        table.normalize_headers();

        write_table(&table, &path).map_err(|err| (Stage::Persist, err))?;

        self.sink.event(
            ProgressEvent::new(Level::INFO, "dataset processed")
                .field("dataset", &descriptor.identifier)
                .field("rows", table.row_count())
                .field("columns", table.column_count()),
        );
        Ok(OutcomeStatus::Succeeded {
            path: path.to_string(),
            rows: table.row_count(),
            columns: table.column_count(),
        })
    }
}
