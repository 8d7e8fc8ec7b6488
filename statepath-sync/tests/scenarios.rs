use statepath_core::{FlatEdge, FlatGraph};
use statepath_paths::{EnumeratorConfig, PathEnumerator, TestCase};
use statepath_sync::{Manifest, SyncAction, SyncEngine, SyncStatus};

fn cases(graph: &FlatGraph) -> Vec<TestCase> {
    PathEnumerator::new(EnumeratorConfig::default())
        .unwrap()
        .test_cases(graph)
}

fn fan_out() -> FlatGraph {
    FlatGraph::new("A")
        .with_edge("A", FlatEdge::new("Go", "B"))
        .with_edge("A", FlatEdge::new("Skip", "C"))
        .with_edge("A", FlatEdge::new("Jump", "D"))
}

#[test]
fn resync_of_unchanged_graph_is_clean() {
    let graph = fan_out();
    let engine = SyncEngine::new();
    let mut manifest = Manifest::default();

    let first = engine.plan(&cases(&graph), &manifest);
    assert_eq!(first.report.new, vec!["96A0", "C5C5", "FE04"]);
    manifest.apply(&first.actions);

    let second = engine.plan(&cases(&graph), &manifest);
    assert!(second.report.is_clean());
    assert_eq!(second.report.unchanged.len(), 3);
    assert!(second.is_noop());
}

#[test]
fn removed_path_is_isolated_as_obsolete() {
    let engine = SyncEngine::new();
    let mut manifest = Manifest::from_test_cases(&cases(&fan_out()));

    let shrunk = FlatGraph::new("A")
        .with_edge("A", FlatEdge::new("Go", "B"))
        .with_edge("A", FlatEdge::new("Jump", "D"));
    let plan = engine.plan(&cases(&shrunk), &manifest);

    assert_eq!(plan.report.obsolete, vec!["C5C5"]);
    assert_eq!(plan.report.unchanged, vec!["96A0", "FE04"]);
    assert!(plan.report.new.is_empty());
    assert!(plan.report.modified.is_empty());
    assert!(matches!(
        &plan.actions[..],
        [SyncAction::MarkObsolete { hash, previous, .. }]
            if hash == "C5C5" && previous == &vec!["A_Skip_C".to_string()]
    ));

    manifest.apply(&plan.actions);
    assert_eq!(manifest.len(), 3);
    assert!(manifest.entries["C5C5"].is_obsolete());
    assert!(!manifest.entries["FE04"].is_obsolete());
}

#[test]
fn retargeted_path_is_isolated_as_modified() {
    let engine = SyncEngine::new();
    let mut manifest = Manifest::from_test_cases(&cases(&fan_out()));

    let retargeted = FlatGraph::new("A")
        .with_edge("A", FlatEdge::new("Go", "E"))
        .with_edge("A", FlatEdge::new("Skip", "C"))
        .with_edge("A", FlatEdge::new("Jump", "D"));
    let plan = engine.plan(&cases(&retargeted), &manifest);

    assert_eq!(plan.report.status_of("FE04"), Some(SyncStatus::Modified));
    assert_eq!(plan.report.unchanged, vec!["96A0", "C5C5"]);
    assert_eq!(
        plan.actions,
        vec![SyncAction::ReplaceExpected {
            hash: "FE04".to_string(),
            previous: vec!["A_Go_B".to_string()],
            current: vec!["A_Go_E".to_string()],
        }]
    );

    manifest.apply(&plan.actions);
    let entry = &manifest.entries["FE04"];
    assert_eq!(entry.expected_transitions, vec!["A_Go_E"]);
    // The name is user-owned and survives the replacement.
    assert_eq!(entry.name, "_1_FE04_from_A_to_B");
}

#[test]
fn dry_run_matches_real_classification() {
    let engine = SyncEngine::new();
    let manifest = Manifest::from_test_cases(&cases(&fan_out()));
    let current = cases(&FlatGraph::new("A").with_edge("A", FlatEdge::new("Go", "B")));

    let plan = engine.plan(&current, &manifest);
    let report = engine.classify(&current, &manifest.previous_tests());

    assert_eq!(plan.report.new, report.new);
    assert_eq!(plan.report.unchanged, report.unchanged);
    assert_eq!(plan.report.modified, report.modified);
    assert_eq!(plan.report.obsolete, report.obsolete);
    assert_eq!(manifest, Manifest::from_test_cases(&cases(&fan_out())));
}
