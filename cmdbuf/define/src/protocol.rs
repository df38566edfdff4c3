//! The complete description of one command-buffer protocol.

use crate::named_type::NamedTypeRegistry;
use crate::overrides::OverrideTable;

/// Everything the generator needs to produce one protocol's artifacts.
///
/// Built once at startup and passed by reference through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDefinition {
    /// Protocol name in UpperCamelCase, e.g. `Raster`.
    pub name: String,
    /// Prefix for output file names, e.g. `raster`.
    pub prefix: String,
    pub description: String,
    /// First command id; ids below it belong to the common command set.
    pub command_base: u32,
    /// Module path glob-imported by every generated artifact.
    pub support_path: String,
    pub named_types: NamedTypeRegistry,
    pub overrides: OverrideTable,
    /// Contents of the signature file.
    pub functions: String,
}
