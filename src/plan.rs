use serde::Serialize;

use crate::domain::{DatasetDescriptor, RunOutcome, WatermarkPolicy};
use crate::watermark::WatermarkMap;

/// True when the dataset was never recorded or its marker changed in any way.
pub fn needs_update(descriptor: &DatasetDescriptor, watermark: &WatermarkMap) -> bool {
    watermark.get(&descriptor.identifier) != Some(&descriptor.modified)
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncPlan {
    pub work: Vec<DatasetDescriptor>,
    pub unchanged: usize,
    /// Markers of every catalog entry, written back once the run finishes.
    #[serde(skip)]
    pub watermark: WatermarkMap,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.work.is_empty()
    }
}

pub fn plan(descriptors: Vec<DatasetDescriptor>, previous: &WatermarkMap) -> SyncPlan {
    let mut work = Vec::new();
    let mut unchanged = 0;
    let mut watermark = WatermarkMap::new();

    for descriptor in descriptors {
        watermark.insert(descriptor.identifier.clone(), descriptor.modified.clone());
        if needs_update(&descriptor, previous) {
            work.push(descriptor);
        } else {
            unchanged += 1;
        }
    }

    SyncPlan {
        work,
        unchanged,
        watermark,
    }
}

/// Applies the policy to the observed map once all outcomes are in.
pub fn settle_watermark(
    mut observed: WatermarkMap,
    previous: &WatermarkMap,
    outcomes: &[RunOutcome],
    policy: WatermarkPolicy,
) -> WatermarkMap {
    if policy == WatermarkPolicy::Succeeded {
        for outcome in outcomes.iter().filter(|outcome| !outcome.succeeded()) {
            match previous.get(&outcome.identifier) {
                Some(marker) => {
                    observed.insert(outcome.identifier.clone(), marker.clone());
                }
                None => {
                    observed.remove(&outcome.identifier);
                }
            }
        }
    }
    observed
}
