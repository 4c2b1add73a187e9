//! Statistics Tests.

use mcsim_core::stats::{PipelineStats, StallCause};
use pretty_assertions::assert_eq;

#[test]
fn stalls_are_counted_by_cause() {
    let mut s = PipelineStats::default();
    s.record_stall(StallCause::Rename);
    s.record_stall(StallCause::MemQueueFull);
    s.record_stall(StallCause::MemQueueFull);
    s.record_stall(StallCause::ShadowMapperExhausted);
    assert_eq!(s.stall_rename, 1);
    assert_eq!(s.stall_memq_full, 2);
    assert_eq!(s.stall_shadow, 1);
    assert_eq!(s.stall_rob_full, 0);
}

#[test]
fn totals_take_the_longest_run() {
    let a = PipelineStats {
        cycles: 100,
        graduated: 50,
        mispredictions: 2,
        ..PipelineStats::default()
    };
    let b = PipelineStats {
        cycles: 80,
        graduated: 30,
        mispredictions: 1,
        ..PipelineStats::default()
    };
    let mut total = PipelineStats::default();
    total += &a;
    total += &b;
    assert_eq!(total.cycles, 100);
    assert_eq!(total.graduated, 80);
    assert_eq!(total.mispredictions, 3);
    assert!((total.ipc() - 0.8).abs() < 1e-9);
}

#[test]
fn accuracy_reflects_mispredictions() {
    let s = PipelineStats {
        branches: 4,
        mispredictions: 1,
        ..PipelineStats::default()
    };
    assert!((s.branch_accuracy() - 0.75).abs() < 1e-9);
}

#[test]
fn report_lists_every_section() {
    let text = PipelineStats::default().to_string();
    for section in ["CORE", "DECODE STALLS", "BRANCHES", "MEMORY", "EXCEPTIONS"] {
        assert!(text.contains(section), "missing {section}");
    }
    assert!(text.contains("shadow-mapper-exhausted"));
}
