//! Module documentation for generated artifacts.
//!
//! This module provides [`ModuleDocBuilder`], which renders the inner doc
//! attributes at the top of each generated file: what the artifact is, which
//! protocol it belongs to, what it contains, and where its support types
//! come from.

use cmdbuf_define::ProtocolDefinition;
use proc_macro2::TokenStream;
use quote::quote;

/// Builds module-level documentation for one generated artifact.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{NamedTypeRegistry, OverrideTable, ProtocolDefinition};
/// use cmdbuf_gen::codegen::ModuleDocBuilder;
///
/// let protocol = ProtocolDefinition {
///     name: "Raster".to_string(),
///     prefix: "raster".to_string(),
///     description: "OOP raster commands.".to_string(),
///     command_base: 256,
///     support_path: "crate::command_buffer".to_string(),
///     named_types: NamedTypeRegistry::default(),
///     overrides: OverrideTable::default(),
///     functions: String::new(),
/// };
///
/// let docs = ModuleDocBuilder::new(&protocol, "Command identifiers")
///     .item("38 commands")
///     .build()
///     .to_string();
/// assert!(docs.contains("Command identifiers for the Raster protocol."));
/// assert!(docs.contains("38 commands"));
/// ```
pub struct ModuleDocBuilder<'a> {
    protocol: &'a ProtocolDefinition,
    title: &'a str,
    items: Vec<String>,
}

impl<'a> ModuleDocBuilder<'a> {
    /// Creates a builder for an artifact described by `title`.
    pub fn new(protocol: &'a ProtocolDefinition, title: &'a str) -> Self {
        Self {
            protocol,
            title,
            items: Vec::new(),
        }
    }

    /// Adds a bullet to the contents section.
    pub fn item(mut self, text: impl Into<String>) -> Self {
        self.items.push(text.into());
        self
    }

    /// Builds the `#![doc = ...]` attributes.
    pub fn build(&self) -> TokenStream {
        let intro = self.intro_paragraph();
        let support = self.support_section();

        let contents = if self.items.is_empty() {
            quote! {}
        } else {
            let section = self.contents_section();
            quote! {
                //!
                #![doc = #section]
            }
        };

        quote! {
            #![doc = #intro]
            #contents
            //!
            #![doc = #support]
        }
    }

    fn intro_paragraph(&self) -> String {
        let desc = self.protocol.description.trim();
        if desc.is_empty() {
            format!(" {} for the {} protocol.", self.title, self.protocol.name)
        } else {
            format!(
                " {} for the {} protocol.\n\n {}",
                self.title, self.protocol.name, desc
            )
        }
    }

    fn contents_section(&self) -> String {
        let mut section = String::from(" ## Contents\n");
        for item in &self.items {
            section.push_str(&format!("\n - {}", item));
        }
        section
    }

    fn support_section(&self) -> String {
        format!(
            " Runtime types come from `{}`.",
            self.protocol.support_path
        )
    }
}
