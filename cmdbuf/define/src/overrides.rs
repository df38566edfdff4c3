//! Per-function generation directives.
//!
//! A [`FunctionOverride`] carries everything a protocol author can say about
//! one function beyond its signature. Every field is optional or has a
//! default; the record builder fills the gaps by inference.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DefineError;
use crate::strategy::{Extension, StrategyKind, TransferMethod};

/// Directives for a single function, keyed by the function's name.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{FunctionOverride, StrategyKind, TransferMethod};
///
/// let produce = FunctionOverride::new("ProduceTextureDirect")
///     .strategy(StrategyKind::Put)
///     .count(16)
///     .no_client_entry();
///
/// assert_eq!(produce.count, Some(16));
/// assert!(!produce.client_entry);
/// assert!(produce.unit_test);
///
/// let trace = FunctionOverride::new("TraceBeginCHROMIUM")
///     .strategy(StrategyKind::Custom)
///     .transfer([TransferMethod::Bucket]);
/// assert_eq!(trace.transfer_methods, Some(vec![TransferMethod::Bucket]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionOverride {
    pub name: String,
    pub strategy: Option<StrategyKind>,
    /// Service-side handler that replaces the derived `do_<name>`.
    pub decoder: Option<String>,
    /// Argument list that replaces the declared parameters on the wire.
    pub cmd_args: Option<String>,
    pub transfer_methods: Option<Vec<TransferMethod>>,
    pub client_entry: bool,
    /// When false the client marshaling function is written by hand and
    /// only referenced by the generated code.
    pub generated_marshal: bool,
    pub internal: bool,
    pub unit_test: bool,
    pub client_test: bool,
    pub expectation: bool,
    pub invalid_test: bool,
    pub not_shared: bool,
    /// Data units per command for the Put family.
    pub count: Option<u32>,
    pub use_count_func: bool,
    /// Argument index to literal test value.
    pub valid_args: BTreeMap<usize, String>,
    pub trace_level: Option<u8>,
    pub extension: Option<Extension>,
    /// Id namespace used for client-side allocation, e.g. `Textures`.
    pub resource: Option<String>,
    /// Name of the call the service test expects, when it differs from the
    /// function name.
    pub test_func: Option<String>,
}

impl FunctionOverride {
    /// Creates an override with every directive at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: None,
            decoder: None,
            cmd_args: None,
            transfer_methods: None,
            client_entry: true,
            generated_marshal: true,
            internal: false,
            unit_test: true,
            client_test: true,
            expectation: true,
            invalid_test: true,
            not_shared: false,
            count: None,
            use_count_func: false,
            valid_args: BTreeMap::new(),
            trace_level: None,
            extension: None,
            resource: None,
            test_func: None,
        }
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn decoder(mut self, decoder: impl Into<String>) -> Self {
        self.decoder = Some(decoder.into());
        self
    }

    pub fn cmd_args(mut self, args: impl Into<String>) -> Self {
        self.cmd_args = Some(args.into());
        self
    }

    pub fn transfer<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = TransferMethod>,
    {
        self.transfer_methods = Some(methods.into_iter().collect());
        self
    }

    pub fn no_client_entry(mut self) -> Self {
        self.client_entry = false;
        self
    }

    pub fn hand_written_marshal(mut self) -> Self {
        self.generated_marshal = false;
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn no_unit_test(mut self) -> Self {
        self.unit_test = false;
        self
    }

    pub fn no_client_test(mut self) -> Self {
        self.client_test = false;
        self
    }

    pub fn no_expectation(mut self) -> Self {
        self.expectation = false;
        self
    }

    pub fn no_invalid_test(mut self) -> Self {
        self.invalid_test = false;
        self
    }

    pub fn not_shared(mut self) -> Self {
        self.not_shared = true;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn use_count_func(mut self) -> Self {
        self.use_count_func = true;
        self
    }

    /// Pins the test value of the argument at `index`.
    pub fn valid_arg(mut self, index: usize, value: impl Into<String>) -> Self {
        self.valid_args.insert(index, value.into());
        self
    }

    pub fn trace_level(mut self, level: u8) -> Self {
        self.trace_level = Some(level);
        self
    }

    /// Gates the function on an extension, optionally behind a feature flag.
    pub fn extension(mut self, name: impl Into<String>, flag: Option<&str>) -> Self {
        self.extension = Some(Extension {
            name: name.into(),
            flag: flag.map(str::to_string),
        });
        self
    }

    pub fn resource(mut self, namespace: impl Into<String>) -> Self {
        self.resource = Some(namespace.into());
        self
    }

    pub fn test_func(mut self, name: impl Into<String>) -> Self {
        self.test_func = Some(name.into());
        self
    }
}

/// Ordered override table, unique by function name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    overrides: Vec<FunctionOverride>,
}

impl OverrideTable {
    /// Builds the table.
    ///
    /// ## Errors
    ///
    /// Returns `DefineError::DuplicateOverride` if two entries share a name.
    pub fn new(overrides: Vec<FunctionOverride>) -> Result<Self, DefineError> {
        let mut seen = BTreeSet::new();
        for entry in &overrides {
            if !seen.insert(entry.name.as_str()) {
                return Err(DefineError::DuplicateOverride(entry.name.clone()));
            }
        }
        Ok(Self { overrides })
    }

    pub fn get(&self, name: &str) -> Option<&FunctionOverride> {
        self.overrides.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionOverride> {
        self.overrides.iter()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_unconfigured_function() {
        let entry = FunctionOverride::new("Finish");
        assert!(entry.client_entry);
        assert!(entry.generated_marshal);
        assert!(!entry.internal);
        assert!(entry.unit_test && entry.client_test);
        assert!(entry.expectation && entry.invalid_test);
        assert!(!entry.not_shared);
        assert!(entry.strategy.is_none());
        assert!(entry.valid_args.is_empty());
    }

    #[test]
    fn valid_args_are_kept_sorted_by_index() {
        let entry = FunctionOverride::new("TexParameteri")
            .valid_arg(2, "GL_NEAREST")
            .valid_arg(0, "1");
        let indices: Vec<_> = entry.valid_args.keys().copied().collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn extension_keeps_optional_flag() {
        let entry = FunctionOverride::new("RasterCHROMIUM")
            .extension("CHROMIUM_raster_transport", Some("chromium_raster_transport"));
        let ext = entry.extension.unwrap();
        assert_eq!(ext.flag.as_deref(), Some("chromium_raster_transport"));

        let entry = FunctionOverride::new("TraceEndCHROMIUM").extension("CHROMIUM_trace_marker", None);
        assert!(entry.extension.unwrap().flag.is_none());
    }

    #[test]
    fn table_rejects_duplicate_names() {
        let result = OverrideTable::new(vec![
            FunctionOverride::new("Flush"),
            FunctionOverride::new("Finish"),
            FunctionOverride::new("Flush"),
        ]);
        assert_eq!(result, Err(DefineError::DuplicateOverride("Flush".to_string())));
    }

    #[test]
    fn table_lookup_by_name() {
        let table = OverrideTable::new(vec![
            FunctionOverride::new("GetError").strategy(StrategyKind::Is),
        ])
        .unwrap();
        assert_eq!(
            table.get("GetError").and_then(|o| o.strategy),
            Some(StrategyKind::Is)
        );
        assert!(table.get("Flush").is_none());
        assert_eq!(table.len(), 1);
    }
}
