use catalog_sync::domain::{
    DatasetDescriptor, Distribution, OutcomeStatus, RunOutcome, Stage, WatermarkPolicy,
};
use catalog_sync::plan::{needs_update, plan, settle_watermark};
use catalog_sync::watermark::WatermarkMap;

fn descriptor(id: &str, modified: &str) -> DatasetDescriptor {
    DatasetDescriptor {
        identifier: id.to_string(),
        title: format!("Dataset {id}"),
        modified: modified.to_string(),
        theme: vec!["Hospitals".to_string()],
        distribution: vec![Distribution {
            media_type: "text/csv".to_string(),
            download_url: format!("https://example.test/{id}.csv"),
        }],
    }
}

fn failed(id: &str, modified: &str) -> RunOutcome {
    RunOutcome {
        identifier: id.to_string(),
        title: String::new(),
        modified: modified.to_string(),
        status: OutcomeStatus::Failed {
            stage: Stage::Retrieve,
            error: "timeout".to_string(),
        },
    }
}

#[test]
fn change_detection_follows_marker() {
    let mut watermark = WatermarkMap::new();
    let mut ds = descriptor("xubh-q36u", "2024-01-01");
    assert!(needs_update(&ds, &watermark));

    watermark.insert(ds.identifier.clone(), ds.modified.clone());
    assert!(!needs_update(&ds, &watermark));

    ds.modified = "2024-02-01".to_string();
    assert!(needs_update(&ds, &watermark));
}

#[test]
fn any_marker_difference_triggers_update() {
    let mut watermark = WatermarkMap::new();
    watermark.insert("a".to_string(), "2024-01-01".to_string());
    // An older-looking marker still counts as changed.
    assert!(needs_update(&descriptor("a", "2023-12-31"), &watermark));
    assert!(needs_update(&descriptor("a", "2024-01-01T00:00:00"), &watermark));
}

#[test]
fn plan_records_every_marker() {
    let mut previous = WatermarkMap::new();
    previous.insert("a".to_string(), "1".to_string());
    previous.insert("b".to_string(), "1".to_string());
    previous.insert("gone".to_string(), "1".to_string());

    let plan = plan(
        vec![descriptor("a", "1"), descriptor("b", "2"), descriptor("c", "1")],
        &previous,
    );

    let work = plan
        .work
        .iter()
        .map(|ds| ds.identifier.as_str())
        .collect::<Vec<_>>();
    assert_eq!(work, vec!["b", "c"]);
    assert_eq!(plan.unchanged, 1);
    assert_eq!(plan.watermark.len(), 3);
    assert_eq!(plan.watermark["b"], "2");
    assert!(!plan.watermark.contains_key("gone"));
}

#[test]
fn observed_policy_keeps_failed_markers() {
    let previous = WatermarkMap::new();
    let plan = plan(vec![descriptor("a", "2")], &previous);
    let settled = settle_watermark(
        plan.watermark,
        &previous,
        &[failed("a", "2")],
        WatermarkPolicy::Observed,
    );
    assert_eq!(settled["a"], "2");
}

#[test]
fn succeeded_policy_restores_previous_marker() {
    let mut previous = WatermarkMap::new();
    previous.insert("a".to_string(), "1".to_string());
    let plan = plan(vec![descriptor("a", "2"), descriptor("b", "1")], &previous);
    let settled = settle_watermark(
        plan.watermark,
        &previous,
        &[failed("a", "2"), failed("b", "1")],
        WatermarkPolicy::Succeeded,
    );
    assert_eq!(settled["a"], "1");
    assert!(!settled.contains_key("b"));
}
