//! Configuration Tests.

use mcsim_core::common::error::ConfigError;
use mcsim_core::config::{AliasRecovery, BranchPredictor, Config, ConsistencyModel};
use rstest::rstest;

#[test]
fn defaults() {
    let c = Config::default();
    assert_eq!(c.pipeline.active_list_size, 64);
    assert_eq!(c.pipeline.int_phys_regs, 96);
    assert_eq!(c.pipeline.shadow_mappers, 8);
    assert_eq!(c.memory.queue_size, 32);
    assert_eq!(c.memory.model, ConsistencyModel::Sequential);
    assert_eq!(c.memory.alias_recovery, AliasRecovery::Reexecute);
    assert_eq!(c.pipeline.branch_predictor, BranchPredictor::Static);
    assert_eq!(c.trap.table_base, 0x1_0000);
    assert_eq!(c.system.page_shift, 13);
}

#[rstest]
#[case("SC", ConsistencyModel::Sequential)]
#[case("Processor", ConsistencyModel::Processor)]
#[case("RC", ConsistencyModel::Release)]
fn model_names(#[case] name: &str, #[case] expected: ConsistencyModel) {
    let json = format!(r#"{{ "memory": {{ "model": "{name}" }} }}"#);
    assert_eq!(Config::from_json_str(&json).unwrap().memory.model, expected);
}

#[test]
fn nested_sections_override_independently() {
    let c = Config::from_json_str(
        r#"{
            "pipeline": { "branch_predictor": "Bimodal", "graduation_width": 2 },
            "memory": { "alias_recovery": "SoftException", "speculative_loads": false },
            "units": { "mem_ports": 1 }
        }"#,
    )
    .unwrap();
    assert_eq!(c.pipeline.branch_predictor, BranchPredictor::Bimodal);
    assert_eq!(c.pipeline.graduation_width, 2);
    assert_eq!(c.pipeline.decode_width, 4);
    assert_eq!(c.memory.alias_recovery, AliasRecovery::SoftException);
    assert!(!c.memory.speculative_loads);
    assert!(c.memory.speculative_disambiguation);
    assert_eq!(c.units.mem_ports, 1);
}

#[rstest]
#[case::zero_queue(r#"{ "memory": { "queue_size": 0 } }"#)]
#[case::no_checkpoints(r#"{ "pipeline": { "shadow_mappers": 0 } }"#)]
#[case::small_fp_file(r#"{ "pipeline": { "fp_phys_regs": 36 } }"#)]
#[case::odd_line(r#"{ "system": { "line_size": 48 } }"#)]
#[case::zero_latency(r#"{ "latency": { "int_alu": { "latency": 0, "repeat": 1 } } }"#)]
fn rejects_unusable_settings(#[case] json: &str) {
    assert!(matches!(Config::from_json_str(json), Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_model_is_a_parse_error() {
    let err = Config::from_json_str(r#"{ "memory": { "model": "TSO" } }"#);
    assert!(matches!(err, Err(ConfigError::Json(_))));
}
