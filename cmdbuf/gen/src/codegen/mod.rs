//! Code generation modules for command-buffer protocols.
//!
//! This module contains the emitters that turn function records and the
//! wire plan into Rust source. Each emitter is a pure function of an
//! [`EmitContext`] and produces one artifact.
//!
//! ## Submodules
//!
//! - [`command_ids`] - The `CommandId` enum and id table
//! - [`format`] - `#[repr(C)]` command structs with layout assertions
//! - [`format_tests`] - Per-command struct tests
//! - [`interface`] - The client interface trait
//! - [`implementation_header`] - Trait impl delegating to marshaling functions
//! - [`implementation_body`] - Generated `marshal_*` functions
//! - [`client_tests`] - Client marshaling tests
//! - [`cmd_helper`] - Per-command buffer writers
//! - [`decoder`] - Service dispatch and handlers
//! - [`decoder_tests`] - Service handler tests
//! - [`service_validation`] - Validator container and validator types
//!
//! ## Output Format
//!
//! All emitters return `proc_macro2::TokenStream`, which is then:
//! - Validated with `syn::parse2` to ensure correctness
//! - Formatted with `prettyplease` for consistent style
//!
//! See [`crate::output`] for formatting and file writing.

pub mod client_tests;
pub mod cmd_helper;
pub mod command_ids;
pub mod decoder;
pub mod format;
pub mod implementation_body;
pub mod implementation_header;
pub mod interface;
pub mod module_docs;
pub mod service_validation;
pub mod types;
pub mod values;

use std::path::PathBuf;

use cmdbuf_define::{NamedTypeRegistry, ProtocolDefinition};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::debug;

use crate::errors::{EmitError, GeneratorError};
use crate::record::FunctionRecord;
use crate::validators::ValidatorSet;
use crate::wire::WireCommand;

pub use client_tests::generate_client_tests;
pub use cmd_helper::generate_cmd_helper;
pub use command_ids::generate_command_ids;
pub use decoder::generate_decoder;
pub use decoder_tests::generate_decoder_tests;
pub use format::generate_format;
pub use format_tests::generate_format_tests;
pub use implementation_body::generate_implementation_body;
pub use implementation_header::generate_implementation_header;
pub use interface::generate_interface;
pub use module_docs::ModuleDocBuilder;
pub use service_validation::{generate_validation_header, generate_validation_implementation};

/// Everything an emitter reads.
pub struct EmitContext<'a> {
    pub protocol: &'a ProtocolDefinition,
    pub records: &'a [FunctionRecord],
    pub validators: &'a ValidatorSet,
    pub commands: &'a [WireCommand<'a>],
    support: syn::Path,
}

impl<'a> EmitContext<'a> {
    /// Creates a context, checking the protocol's support path.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::Config` if the support path is not a Rust
    /// path.
    pub fn new(
        protocol: &'a ProtocolDefinition,
        records: &'a [FunctionRecord],
        validators: &'a ValidatorSet,
        commands: &'a [WireCommand<'a>],
    ) -> Result<Self, GeneratorError> {
        let support = syn::parse_str::<syn::Path>(&protocol.support_path).map_err(|e| {
            GeneratorError::Config(format!(
                "support path '{}' is not a valid path: {}",
                protocol.support_path, e
            ))
        })?;
        Ok(Self {
            protocol,
            records,
            validators,
            commands,
            support,
        })
    }

    pub fn registry(&self) -> &'a NamedTypeRegistry {
        &self.protocol.named_types
    }

    /// The glob import every artifact starts with.
    pub fn support_use(&self) -> TokenStream {
        let support = &self.support;
        quote! {
            #[allow(unused_imports)]
            use #support::*;
        }
    }

    /// Protocol-prefixed type name, e.g. `RasterDecoder`.
    pub fn protocol_type(&self, suffix: &str) -> Ident {
        format_ident!("{}{}", self.protocol.name, suffix)
    }

    /// Wire commands planned for `record`, in transfer preference order.
    pub fn commands_for(&self, record: &FunctionRecord) -> impl Iterator<Item = &'a WireCommand<'a>> {
        let name = record.name.clone();
        self.commands
            .iter()
            .filter(move |command| command.record.name == name)
    }

    pub fn docs(&self, title: &'a str) -> ModuleDocBuilder<'a> {
        ModuleDocBuilder::new(self.protocol, title)
    }
}

/// The generated files, one per emitter output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    CommandIds,
    Format,
    FormatTests,
    Interface,
    ImplementationHeader,
    ImplementationBody,
    ClientTests,
    CmdHelper,
    Decoder,
    DecoderTests,
    ValidationHeader,
    ValidationImplementation,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 12] = [
        Self::CommandIds,
        Self::Format,
        Self::FormatTests,
        Self::Interface,
        Self::ImplementationHeader,
        Self::ImplementationBody,
        Self::ClientTests,
        Self::CmdHelper,
        Self::Decoder,
        Self::DecoderTests,
        Self::ValidationHeader,
        Self::ValidationImplementation,
    ];

    /// Output path relative to the output directory.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cmdbuf_gen::codegen::ArtifactKind;
    ///
    /// assert_eq!(
    ///     ArtifactKind::CommandIds.relative_path("raster"),
    ///     std::path::PathBuf::from("common/raster_cmd_ids_autogen.rs")
    /// );
    /// ```
    pub fn relative_path(self, prefix: &str) -> PathBuf {
        let (dir, stem) = match self {
            Self::CommandIds => ("common", "cmd_ids"),
            Self::Format => ("common", "cmd_format"),
            Self::FormatTests => ("common", "cmd_format_test"),
            Self::Interface => ("client", "interface"),
            Self::ImplementationHeader => ("client", "implementation"),
            Self::ImplementationBody => ("client", "implementation_impl"),
            Self::ClientTests => ("client", "implementation_unittest"),
            Self::CmdHelper => ("client", "cmd_helper"),
            Self::Decoder => ("service", "decoder"),
            Self::DecoderTests => ("service", "decoder_unittest"),
            Self::ValidationHeader => ("service", "cmd_validation"),
            Self::ValidationImplementation => ("service", "cmd_validation_implementation"),
        };
        PathBuf::from(dir).join(format!("{}_{}_autogen.rs", prefix, stem))
    }

    fn generate(self, ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
        match self {
            Self::CommandIds => generate_command_ids(ctx),
            Self::Format => generate_format(ctx),
            Self::FormatTests => generate_format_tests(ctx),
            Self::Interface => generate_interface(ctx),
            Self::ImplementationHeader => generate_implementation_header(ctx),
            Self::ImplementationBody => generate_implementation_body(ctx),
            Self::ClientTests => generate_client_tests(ctx),
            Self::CmdHelper => generate_cmd_helper(ctx),
            Self::Decoder => generate_decoder(ctx),
            Self::DecoderTests => generate_decoder_tests(ctx),
            Self::ValidationHeader => generate_validation_header(ctx),
            Self::ValidationImplementation => generate_validation_implementation(ctx),
        }
    }
}

/// One emitted file before formatting.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub tokens: TokenStream,
}

/// Runs every emitter.
///
/// ## Errors
///
/// Returns the `EmitError` of every emitter that failed.
pub fn emit_all(ctx: &EmitContext<'_>) -> Result<Vec<Artifact>, Vec<EmitError>> {
    let mut artifacts = Vec::with_capacity(ArtifactKind::ALL.len());
    let mut errors = Vec::new();

    for kind in ArtifactKind::ALL {
        match kind.generate(ctx) {
            Ok(tokens) => artifacts.push(Artifact {
                kind,
                path: kind.relative_path(&ctx.protocol.prefix),
                tokens,
            }),
            Err(err) => errors.push(err),
        }
    }

    debug!("emitted {} artifacts ({} errors)", artifacts.len(), errors.len());

    if errors.is_empty() {
        Ok(artifacts)
    } else {
        Err(errors)
    }
}
