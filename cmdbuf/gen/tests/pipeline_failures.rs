//! Pipeline tests for definitions that must not generate, and for sizing
//! options the raster protocol does not use.

use tempfile::TempDir;

use cmdbuf_define::{FunctionOverride, OverrideTable, StrategyKind};
use cmdbuf_gen::driver::{GenerateOptions, generate, load_protocol};
use cmdbuf_gen::errors::{GeneratorError, MergeError};

#[test]
fn out_of_range_valid_arg_fails_the_build() {
    let mut protocol = load_protocol("raster").unwrap();
    let overrides = protocol
        .overrides
        .iter()
        .cloned()
        .map(|entry| {
            if entry.name == "Finish" {
                entry.valid_arg(9, "0")
            } else {
                entry
            }
        })
        .collect();
    protocol.overrides = OverrideTable::new(overrides).unwrap();
    let temp_dir = TempDir::new().unwrap();

    let diagnostics = generate(&protocol, &GenerateOptions::new(temp_dir.path())).unwrap_err();

    assert!(diagnostics.errors().iter().any(|err| matches!(
        err,
        GeneratorError::Merge(MergeError::ValidArgIndex { function, index: 9, count: 0 })
            if function == "Finish"
    )));
    assert!(!temp_dir.path().join("common").exists());
}

#[test]
fn failed_run_keeps_previous_output() {
    let protocol = load_protocol("raster").unwrap();
    let temp_dir = TempDir::new().unwrap();
    let options = GenerateOptions::new(temp_dir.path());
    generate(&protocol, &options).unwrap();
    let ids = temp_dir.path().join("common/raster_cmd_ids_autogen.rs");
    let before = std::fs::read_to_string(&ids).unwrap();

    let mut broken = protocol.clone();
    broken.functions.push_str("void Broken(GLuint x\n");
    assert!(generate(&broken, &options).is_err());

    assert_eq!(std::fs::read_to_string(&ids).unwrap(), before);
}

#[test]
fn runtime_sized_put_carries_count_field() {
    let mut protocol = load_protocol("raster").unwrap();
    protocol.functions = "void SetMailbox(GLuint texture, const GLbyte* mailbox);\n".to_string();
    protocol.overrides = OverrideTable::new(vec![
        FunctionOverride::new("SetMailbox")
            .strategy(StrategyKind::Put)
            .count(16)
            .use_count_func(),
    ])
    .unwrap();
    let temp_dir = TempDir::new().unwrap();

    let report = generate(&protocol, &GenerateOptions::new(temp_dir.path()).dry_run(true)).unwrap();
    let format = report.artifact("common/raster_cmd_format_autogen.rs").unwrap();

    assert!(format.contains("pub const MAX_DATA_UNITS: usize = 16"));
    assert!(format.contains("pub count: u32"));
    assert!(!format.contains("pub const DATA_UNITS"));
}
