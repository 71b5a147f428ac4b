use super::*;
use crate::{error::ErrorClass, value::KeyTuple};

fn failure(outer: Option<KeyTuple>) -> IterationFailure {
    IterationFailure {
        context: "blogs".to_string(),
        phase: FailurePhase::MoveNext,
        class: ErrorClass::RowSource,
        message: "cursor advance failed: reset by peer".to_string(),
        active_outer_key: outer,
    }
}

#[test]
fn failure_display_includes_phase_and_class() {
    let text = failure(None).to_string();

    assert_eq!(
        text,
        "blogs: iteration failed during move_next (row_source): cursor advance failed: reset by peer"
    );
}

#[test]
fn failure_display_appends_active_outer_key() {
    let key = KeyTuple::from(vec![7i64.into()]);
    let text = failure(Some(key)).to_string();

    assert!(text.ends_with("[outer key (7)]"), "{text}");
}

#[test]
fn memory_sink_collects_reports_in_order() {
    let sink = MemoryDiagnosticsSink::new();
    assert!(sink.is_empty());

    sink.report_iteration_failure(&failure(None));
    let mut second = failure(None);
    second.phase = FailurePhase::Open;
    sink.report_iteration_failure(&second);

    let failures = sink.failures();
    assert_eq!(sink.len(), 2);
    assert_eq!(failures[0].phase, FailurePhase::MoveNext);
    assert_eq!(failures[1].phase, FailurePhase::Open);
}

#[test]
fn log_sink_accepts_reports_without_a_logger() {
    LogDiagnosticsSink.report_iteration_failure(&failure(None));
}

#[test]
fn stats_serialize_as_flat_counters() {
    let stats = EnumerationStats {
        rows_advanced: 3,
        roots_yielded: 2,
        duplicates_skipped: 1,
    };

    let json = serde_json::to_value(stats).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "rows_advanced": 3,
            "roots_yielded": 2,
            "duplicates_skipped": 1,
        })
    );
}
