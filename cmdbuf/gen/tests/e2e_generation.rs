//! End-to-end tests: generate the raster protocol and inspect the output.
//!
//! These run the full pipeline from the compiled-in definition to rendered
//! artifacts, without touching the output directory unless a test asks for it.

use std::collections::BTreeMap;
use std::fs;

use tempfile::TempDir;

use cmdbuf_define::OverrideTable;
use cmdbuf_gen::driver::{GenerateOptions, GenerationReport, generate, load_protocol};

const CMD_IDS: &str = "common/raster_cmd_ids_autogen.rs";
const FORMAT: &str = "common/raster_cmd_format_autogen.rs";
const INTERFACE: &str = "client/raster_interface_autogen.rs";
const IMPLEMENTATION: &str = "client/raster_implementation_autogen.rs";
const DECODER: &str = "service/raster_decoder_autogen.rs";
const VALIDATION: &str = "service/raster_cmd_validation_autogen.rs";

fn generate_raster() -> GenerationReport {
    let protocol = load_protocol("raster").expect("Failed to load raster protocol");
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    generate(&protocol, &GenerateOptions::new(temp_dir.path()).dry_run(true))
        .expect("Failed to generate raster protocol")
}

/// Command name to id, read from the `CommandId` enum declarations.
fn command_ids(report: &GenerationReport) -> BTreeMap<u32, String> {
    let code = report.artifact(CMD_IDS).expect("Missing command id artifact");
    code.lines()
        .filter_map(|line| {
            let (name, id) = line.trim().strip_suffix(',')?.split_once(" = ")?;
            Some((id.parse().ok()?, name.to_string()))
        })
        .collect()
}

#[test]
fn raster_counts() {
    let report = generate_raster();

    assert_eq!(report.records, 48);
    assert_eq!(report.commands, 38);
    assert_eq!(report.artifacts.len(), 12);
}

#[test]
fn repeated_runs_are_identical() {
    let first = generate_raster();
    let second = generate_raster();

    assert_eq!(first.artifacts, second.artifacts);
}

#[test]
fn rewriting_produces_identical_files() {
    let protocol = load_protocol("raster").unwrap();
    let temp_dir = TempDir::new().unwrap();
    let options = GenerateOptions::new(temp_dir.path());

    generate(&protocol, &options).unwrap();
    let first = fs::read(temp_dir.path().join(DECODER)).unwrap();
    generate(&protocol, &options).unwrap();
    let second = fs::read(temp_dir.path().join(DECODER)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn command_ids_are_gapless_from_base() {
    let report = generate_raster();
    let code = report.artifact(CMD_IDS).unwrap();
    let ids: Vec<u32> = command_ids(&report).into_keys().collect();

    assert!(code.contains("pub const FIRST_COMMAND_ID: u32 = 256;"));
    assert!(code.contains("pub const NUM_COMMANDS: usize = 38;"));
    assert_eq!(ids, (256..294).collect::<Vec<_>>());
}

#[test]
fn command_ids_follow_declaration_order() {
    let report = generate_raster();
    let ids = command_ids(&report);

    let position = |name: &str| {
        ids.iter()
            .find(|(_, n)| n.starts_with(name))
            .map(|(id, _)| *id)
            .unwrap_or_else(|| panic!("{} has no id", name))
    };
    assert_eq!(position("DeleteTexturesImmediate"), 256);
    assert!(position("Finish") < position("Flush"));
    assert!(position("BeginQueryEXT") < position("EndQueryEXT"));
}

#[test]
fn same_put_shape_gets_distinct_ids() {
    let report = generate_raster();
    let ids = command_ids(&report);

    let put_commands: Vec<_> = ids
        .iter()
        .filter(|(_, name)| {
            matches!(
                name.as_str(),
                "CreateAndConsumeTextureINTERNALImmediate"
                    | "ProduceTextureDirectImmediate"
                    | "BeginRasterCHROMIUMImmediate"
            )
        })
        .map(|(id, _)| *id)
        .collect();

    assert_eq!(put_commands.len(), 3);
    let format = report.artifact(FORMAT).unwrap();
    assert_eq!(format.matches("pub const DATA_UNITS: usize = 16").count(), 3);
}

#[test]
fn no_command_function_gets_direct_stub_only() {
    let report = generate_raster();
    let ids = command_ids(&report);

    assert!(!ids.values().any(|name| name.starts_with("ShallowFlushCHROMIUM")));
    assert!(!report.artifact(FORMAT).unwrap().contains("pub struct ShallowFlushCHROMIUM"));
    assert!(report.artifact(INTERFACE).unwrap().contains("fn shallow_flush_chromium(&mut self)"));
    assert!(report
        .artifact(IMPLEMENTATION)
        .unwrap()
        .contains("self.shallow_flush_chromium_direct()"));
}

#[test]
fn hand_written_marshal_keeps_client_entry() {
    let report = generate_raster();

    assert!(report.artifact(INTERFACE).unwrap().contains("fn produce_texture_direct("));
    assert!(report.artifact(DECODER).unwrap().contains("self.do_produce_texture_direct("));
}

#[test]
fn hidden_function_is_still_decoded() {
    let mut protocol = load_protocol("raster").unwrap();
    let overrides = protocol
        .overrides
        .iter()
        .cloned()
        .map(|entry| {
            if entry.name == "ProduceTextureDirect" {
                entry.no_client_entry()
            } else {
                entry
            }
        })
        .collect();
    protocol.overrides = OverrideTable::new(overrides).unwrap();
    let temp_dir = TempDir::new().unwrap();

    let report = generate(&protocol, &GenerateOptions::new(temp_dir.path()).dry_run(true)).unwrap();

    assert!(!report.artifact(INTERFACE).unwrap().contains("fn produce_texture_direct("));
    assert!(!report.artifact(IMPLEMENTATION).unwrap().contains("fn produce_texture_direct("));
    assert!(report.artifact(DECODER).unwrap().contains("self.do_produce_texture_direct("));
}

#[test]
fn referenced_named_types_get_validators() {
    let report = generate_raster();
    let code = report.artifact(VALIDATION).unwrap();

    assert!(code.contains("pub struct QueryTargetValidator;"));
    assert!(code.contains("pub type GlStateValidator = ValueValidator<GLenum>;"));
}
