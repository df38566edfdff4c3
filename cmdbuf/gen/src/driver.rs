//! Generation pipeline.
//!
//! parse → build → cross-reference validation → plan → emit → format → write.
//!
//! Every stage reports all of its errors before the run stops, and the run
//! stops at the first stage that reported any. Nothing is written unless
//! every stage succeeded.

use std::path::{Path, PathBuf};

use cmdbuf_define::ProtocolDefinition;
use tracing::{debug, info};

use crate::builder::build_records;
use crate::codegen::{EmitContext, emit_all};
use crate::errors::{Diagnostics, GeneratorError};
use crate::output::{Formatter, PrettyPleaseFormatter, RenderedArtifact, print_artifacts, write_staged};
use crate::parser::parse_signatures;
use crate::record::FunctionRecord;
use crate::validation::validate_records;
use crate::validators::ValidatorSet;
use crate::wire::plan_commands;

/// Runtime options of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub output_dir: PathBuf,
    /// Print artifacts instead of writing them.
    pub dry_run: bool,
}

impl GenerateOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub records: usize,
    pub commands: usize,
    pub validators: usize,
    /// Rendered artifacts, in emission order.
    pub artifacts: Vec<RenderedArtifact>,
}

impl GenerationReport {
    /// Content of the artifact at `path`, relative to the output directory.
    pub fn artifact(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|a| a.path == path.as_ref())
            .map(|a| a.content.as_str())
    }
}

/// Resolves a protocol by its `--protocol` name.
///
/// ## Errors
///
/// Returns `GeneratorError::Config` for an unknown name and
/// `GeneratorError::Definition` if the definition itself is invalid.
pub fn load_protocol(name: &str) -> Result<ProtocolDefinition, GeneratorError> {
    match name {
        "raster" => Ok(cmdbuf_definitions::define_raster_protocol()?),
        _ => Err(GeneratorError::Config(format!(
            "unknown protocol '{}' (available: raster)",
            name
        ))),
    }
}

/// Parses, builds and cross-checks the records of `protocol`, and
/// synthesizes their validators.
///
/// ## Errors
///
/// Returns every error of the first stage that failed.
pub fn build_protocol_records(
    protocol: &ProtocolDefinition,
) -> Result<(Vec<FunctionRecord>, ValidatorSet), Diagnostics> {
    let signatures =
        parse_signatures(&protocol.functions, &protocol.named_types).map_err(collect)?;
    debug!("parsed {} signatures", signatures.len());

    let records =
        build_records(&signatures, &protocol.named_types, &protocol.overrides).map_err(collect)?;
    validate_records(&records, &protocol.overrides).map_err(collect)?;

    let validators = ValidatorSet::synthesize(&records, &protocol.named_types);
    Ok((records, validators))
}

/// Runs the pipeline with the default formatter.
///
/// ## Errors
///
/// Returns the collected diagnostics of the first failing stage.
pub fn generate(
    protocol: &ProtocolDefinition,
    options: &GenerateOptions,
) -> Result<GenerationReport, Diagnostics> {
    generate_with(protocol, options, &PrettyPleaseFormatter)
}

/// Runs the pipeline with `formatter`.
///
/// ## Errors
///
/// Returns the collected diagnostics of the first failing stage.
pub fn generate_with(
    protocol: &ProtocolDefinition,
    options: &GenerateOptions,
    formatter: &dyn Formatter,
) -> Result<GenerationReport, Diagnostics> {
    let (records, validators) = build_protocol_records(protocol)?;
    let commands = plan_commands(&records, protocol.command_base).map_err(collect)?;

    let ctx = EmitContext::new(protocol, &records, &validators, &commands)?;
    let artifacts = emit_all(&ctx).map_err(collect)?;
    let rendered = formatter.format(&artifacts)?;

    if options.dry_run {
        print_artifacts(&rendered);
    } else {
        write_staged(&options.output_dir, &rendered)?;
    }

    info!(
        "{}: {} records, {} commands, {} validators, {} files{}",
        protocol.name,
        records.len(),
        commands.len(),
        validators.len(),
        rendered.len(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    Ok(GenerationReport {
        records: records.len(),
        commands: commands.len(),
        validators: validators.len(),
        artifacts: rendered,
    })
}

fn collect<E: Into<GeneratorError>>(errors: Vec<E>) -> Diagnostics {
    let mut diagnostics = Diagnostics::default();
    diagnostics.extend(errors);
    diagnostics
}
