//! Command buffer code generator library.
//!
//! This crate turns a protocol defined with `cmdbuf-define` into the Rust
//! sources both ends of a command-buffer protocol need. From one signature
//! file, a named type registry and an override table it generates:
//!
//! - Command ids and `#[repr(C)]` wire-format structs with layout assertions
//! - A client interface trait, its implementation and `marshal_*` functions
//! - A command helper with one buffer writer per wire command
//! - A service decoder with validation and dispatch
//! - Validators for every named type passed over the wire
//! - Unit tests for the formats, the client and the decoder
//!
//! ## Modules
//!
//! - [`parser`] - Signature file parsing
//! - [`inference`] - Strategy inference from signature shapes
//! - [`builder`] - Merges signatures, overrides and the registry into records
//! - [`validation`] - Cross-reference checks between overrides and records
//! - [`validators`] - Validator synthesis for named types
//! - [`wire`] - Wire layout planning and command id assignment
//! - [`codegen`] - One emitter per generated artifact
//! - [`output`] - Formatting and staged file writing
//! - [`driver`] - The end-to-end pipeline
//! - [`errors`] - Error types and the diagnostics collector
//!
//! ## Example Usage
//!
//! ```no_run
//! use cmdbuf_gen::driver::{GenerateOptions, generate, load_protocol};
//!
//! let protocol = load_protocol("raster").unwrap();
//! let options = GenerateOptions::new("gpu/command_buffer").dry_run(true);
//!
//! let report = generate(&protocol, &options).unwrap();
//! println!("{} commands", report.commands);
//! ```

pub mod builder;
pub mod codegen;
pub mod driver;
pub mod errors;
pub mod inference;
pub mod naming;
pub mod output;
pub mod parser;
pub mod record;
pub mod validation;
pub mod validators;
pub mod wire;

#[cfg(test)]
mod test_utils;
