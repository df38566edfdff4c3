//! Command Buffer Definition Library
//!
//! This crate provides the primitives for describing a command-buffer
//! protocol declaratively. Definitions are consumed by the `cmdbuf-gen`
//! binary, which turns them into command ids, wire layouts, client
//! marshaling, validators, and service decoders.
//!
//! ## Core Types
//!
//! - [`NamedType`] - An enumerated argument type with legal and illegal values
//! - [`NamedTypeRegistry`] - Validated, ordered set of named types
//! - [`NamedTypeId`] - Interned key handed out by the registry
//! - [`FunctionOverride`] - Per-function generation directives
//! - [`OverrideTable`] - Ordered overrides, unique by name
//! - [`StrategyKind`] - Generation pattern (Put, GetN, DelN, ...)
//! - [`TransferMethod`] - How pointer data travels (immediate, shm, bucket)
//! - [`FunctionSignature`] - A parsed declaration
//! - [`ProtocolDefinition`] - All of the above for one protocol
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_define::{FunctionOverride, NamedType, NamedTypeRegistry, OverrideTable, StrategyKind};
//!
//! let registry = NamedTypeRegistry::new(vec![
//!     NamedType::new("QueryTarget", "GLenum").valid(["GL_COMMANDS_ISSUED_CHROMIUM"]),
//! ])
//! .unwrap();
//! let overrides = OverrideTable::new(vec![
//!     FunctionOverride::new("GetError").strategy(StrategyKind::Is).decoder("get_gl_error"),
//! ])
//! .unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! assert!(overrides.get("GetError").is_some());
//! ```
//!
//! ## Protocol Definitions
//!
//! Actual protocols (like raster) live in the separate
//! `cmdbuf-definitions` crate.

pub mod error;
pub mod named_type;
pub mod overrides;
pub mod prelude;
pub mod protocol;
pub mod signature;
pub mod strategy;

// Re-export main types at crate root
pub use error::DefineError;
pub use named_type::{NamedType, NamedTypeId, NamedTypeRegistry};
pub use overrides::{FunctionOverride, OverrideTable};
pub use protocol::ProtocolDefinition;
pub use signature::{CType, FunctionSignature, Param};
pub use strategy::{Extension, StrategyKind, TransferMethod};
