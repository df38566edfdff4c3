//! Shared test utilities for cmdbuf-gen tests.
//!
//! This module provides common helper functions for creating test fixtures
//! across the codebase, reducing duplication and ensuring consistency.

use std::collections::BTreeMap;

use cmdbuf_define::{
    CType, FunctionOverride, NamedType, NamedTypeRegistry, OverrideTable, ProtocolDefinition,
    StrategyKind, TransferMethod,
};
use proc_macro2::TokenStream;

use crate::builder::build_records;
use crate::parser::parse_signatures;
use crate::record::{BaseFlags, FunctionRecord, Strategy, TestFlags};
use crate::validators::ValidatorSet;
use crate::wire::{WireCommand, plan_commands};

/// Creates a registry with a few named types.
///
/// Order: `GLState`, `QueryTarget` (complete), `TextureParameter`,
/// `TextureWrapMode` (no validator), `gfx::BufferUsage`.
pub fn make_registry() -> NamedTypeRegistry {
    NamedTypeRegistry::new(vec![
        NamedType::new("GLState", "GLenum")
            .valid(["GL_ACTIVE_TEXTURE"])
            .invalid(["GL_FOG_HINT"]),
        NamedType::new("QueryTarget", "GLenum")
            .complete()
            .valid(["GL_COMMANDS_ISSUED_CHROMIUM", "GL_COMMANDS_COMPLETED_CHROMIUM"])
            .invalid(["GL_LATENCY_QUERY_CHROMIUM"]),
        NamedType::new("TextureParameter", "GLenum")
            .valid(["GL_TEXTURE_MAG_FILTER", "GL_TEXTURE_MIN_FILTER"])
            .invalid(["GL_GENERATE_MIPMAP"]),
        NamedType::new("TextureWrapMode", "GLenum")
            .valid(["GL_CLAMP_TO_EDGE"])
            .without_validator(),
        NamedType::new("gfx::BufferUsage", "gfx::BufferUsage")
            .valid(["gfx::BufferUsage::GPU_READ", "gfx::BufferUsage::SCANOUT"])
            .invalid(["gfx::BufferUsage::CAMERA_AND_CPU_READ_WRITE"]),
    ])
    .expect("test registry is valid")
}

/// Creates a record with default flags and no arguments.
///
/// ID-bearing strategies get `shm` as their only transfer method.
pub fn make_record(name: &str, strategy: Strategy) -> FunctionRecord {
    let transfer = if strategy.kind().is_id_bearing() {
        vec![TransferMethod::Shm]
    } else {
        vec![]
    };
    FunctionRecord {
        name: name.to_string(),
        line: 1,
        return_type: CType::void(),
        declared_args: vec![],
        args: vec![],
        strategy,
        transfer,
        base: BaseFlags {
            client_entry: true,
            generated_marshal: true,
            internal: false,
            trace_level: None,
            extension: None,
        },
        tests: TestFlags {
            unit_test: true,
            client_test: true,
            expectation: true,
            invalid_test: true,
        },
        decoder: None,
        valid_args: BTreeMap::new(),
        resource: None,
        test_func: None,
    }
}

/// Signatures of the test protocol.
const TEST_FUNCTIONS: &str = "\
void Finish();
void DeleteTextures(GLsizei n, const GLuint* textures);
void GetIntegerv(GLenum<GLState> pname, GLint* params);
void ProduceTextureDirect(GLuint texture, const GLbyte* mailbox);
GLenum GetError();
GLuint CreateTexture(bool use_buffer, gfx::BufferUsage buffer_usage);
void ShallowFlushCHROMIUM();
void BeginQueryEXT(GLenum<QueryTarget> target, GLuint id);
void WaitSync(GLuint sync, GLbitfield flags, GLuint64 timeout);
";

/// Creates a small protocol covering every emitter path.
///
/// Wire commands, in id order from 256: `Finish`,
/// `DeleteTexturesImmediate`, `GetIntegerv`,
/// `ProduceTextureDirectImmediate`, `GetError`, `CreateTexture`,
/// `BeginQueryEXT`, `WaitSync`. `ShallowFlushCHROMIUM` has no command.
pub fn make_protocol() -> ProtocolDefinition {
    let overrides = OverrideTable::new(vec![
        FunctionOverride::new("DeleteTextures").resource("Textures"),
        FunctionOverride::new("ProduceTextureDirect")
            .strategy(StrategyKind::Put)
            .count(16),
        FunctionOverride::new("GetError").decoder("get_gl_error"),
        FunctionOverride::new("CreateTexture")
            .strategy(StrategyKind::Create)
            .resource("Textures"),
        FunctionOverride::new("ShallowFlushCHROMIUM").strategy(StrategyKind::NoCommand),
        FunctionOverride::new("BeginQueryEXT")
            .extension("CHROMIUM_sync_query", Some("chromium_sync_query")),
        FunctionOverride::new("WaitSync").trace_level(1),
    ])
    .expect("test overrides are valid");

    ProtocolDefinition {
        name: "Test".to_string(),
        prefix: "test".to_string(),
        description: "Test command buffer protocol".to_string(),
        command_base: 256,
        support_path: "crate::command_buffer".to_string(),
        named_types: make_registry(),
        overrides,
        functions: TEST_FUNCTIONS.to_string(),
    }
}

/// Parses and builds the records of `protocol`, with their validators.
pub fn plan_fixture(protocol: &ProtocolDefinition) -> (Vec<FunctionRecord>, ValidatorSet) {
    let signatures =
        parse_signatures(&protocol.functions, &protocol.named_types).expect("fixture parses");
    let records = build_records(&signatures, &protocol.named_types, &protocol.overrides)
        .expect("fixture builds");
    let validators = ValidatorSet::synthesize(&records, &protocol.named_types);
    (records, validators)
}

/// Plans the wire commands of `text` against [`make_registry`] and hands
/// them to `f`.
pub fn plan_single(
    text: &str,
    overrides: Vec<FunctionOverride>,
    f: impl FnOnce(&[WireCommand<'_>]) -> String,
) -> String {
    let registry = make_registry();
    let signatures = parse_signatures(text, &registry).expect("signatures parse");
    let table = OverrideTable::new(overrides).expect("overrides are valid");
    let records = build_records(&signatures, &registry, &table).expect("records build");
    let commands = plan_commands(&records, 256).expect("commands plan");
    f(&commands)
}

/// Validates that generated code is syntactically correct.
///
/// ## Errors
///
/// Returns an error string if the generated code fails to parse.
pub fn validate_generated_code(tokens: &TokenStream) -> Result<(), String> {
    syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(())
}

/// Formats generated code using prettyplease.
///
/// ## Errors
///
/// Returns an error string if the code fails to parse.
pub fn format_generated_code(tokens: &TokenStream) -> Result<String, String> {
    let file = syn::parse2::<syn::File>(tokens.clone()).map_err(|e| e.to_string())?;
    Ok(prettyplease::unparse(&file))
}

/// Strips all whitespace from formatted code.
///
/// Macro arguments keep their token spacing after formatting, so assertions
/// on code inside `assert_eq!` and friends compare compacted text.
pub fn compact_code(code: &str) -> String {
    code.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_registry_orders_types() {
        let registry = make_registry();
        let names: Vec<_> = registry.iter().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "GLState",
                "QueryTarget",
                "TextureParameter",
                "TextureWrapMode",
                "gfx::BufferUsage"
            ]
        );
    }

    #[test]
    fn make_record_defaults_to_shm() {
        let record = make_record("Finish", Strategy::Direct);
        assert_eq!(record.transfer, vec![TransferMethod::Shm]);
        assert!(record.has_public_entry());
    }

    #[test]
    fn fixture_plans_eight_commands() {
        let protocol = make_protocol();
        let (records, validators) = plan_fixture(&protocol);
        let commands = plan_commands(&records, protocol.command_base).unwrap();

        assert_eq!(records.len(), 9);
        assert_eq!(commands.len(), 8);
        assert_eq!(commands.last().map(|c| c.id), Some(263));
        assert_eq!(validators.len(), 3);
    }

    #[test]
    fn generated_code_helpers_reject_garbage() {
        assert!(validate_generated_code(&quote::quote!(fn ok() {})).is_ok());
        assert!(format_generated_code(&quote::quote!(struct)).is_err());
    }
}
