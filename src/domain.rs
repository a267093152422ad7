use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

pub const CSV_MEDIA_TYPE: &str = "text/csv";

/// One published dataset as listed by the catalog's metastore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub identifier: String,
    pub title: String,
    pub modified: String,
    pub theme: Vec<String>,
    pub distribution: Vec<Distribution>,
}

impl DatasetDescriptor {
    pub fn has_theme(&self, theme: &str) -> bool {
        self.theme.iter().any(|tag| tag == theme)
    }

    /// Prefers a delimited-text distribution, then the first one listed.
    pub fn download_url(&self) -> Result<&str, SyncError> {
        self.distribution
            .iter()
            .find(|dist| dist.is_delimited_text())
            .or_else(|| self.distribution.first())
            .map(|dist| dist.download_url.as_str())
            .ok_or_else(|| SyncError::NoDownloadUrl(self.identifier.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

impl Distribution {
    pub fn is_delimited_text(&self) -> bool {
        self.media_type == CSV_MEDIA_TYPE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolveUrl,
    Retrieve,
    Parse,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ResolveUrl => write!(f, "resolve-url"),
            Stage::Retrieve => write!(f, "retrieve"),
            Stage::Parse => write!(f, "parse"),
            Stage::Persist => write!(f, "persist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded {
        path: String,
        rows: usize,
        columns: usize,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub identifier: String,
    pub title: String,
    pub modified: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Which markers are written back to the watermark file after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkPolicy {
    /// Every dataset seen in the catalog is recorded, even if its download failed.
    #[default]
    Observed,
    /// Failed downloads keep their previous marker so the next run retries them.
    Succeeded,
}

impl fmt::Display for WatermarkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkPolicy::Observed => write!(f, "observed"),
            WatermarkPolicy::Succeeded => write!(f, "succeeded"),
        }
    }
}

impl FromStr for WatermarkPolicy {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(WatermarkPolicy::Observed),
            "succeeded" => Ok(WatermarkPolicy::Succeeded),
            other => Err(SyncError::InvalidConfig(format!(
                "unknown watermark policy: {other}"
            ))),
        }
    }
}
