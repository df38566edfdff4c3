//! Function records: the merged, immutable view of one function.
//!
//! A [`FunctionRecord`] is built once per signature by the
//! [`builder`](crate::builder) and then read by every emitter. Options that
//! only make sense for some strategies live inside [`Strategy`]; flags that
//! apply to every record live in [`BaseFlags`] and [`TestFlags`].

use std::collections::BTreeMap;

use cmdbuf_define::{CType, Extension, Param, StrategyKind, TransferMethod};
use serde::Serialize;

use crate::naming;

/// Sizing options of the Put family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PutSizing {
    /// Data units per command (maximum units when `use_count_func` is set).
    pub count: Option<u32>,
    /// The actual unit count is carried in the command at runtime.
    pub use_count_func: bool,
}

/// The generation strategy of a record, with its strategy-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Strategy {
    NoCommand,
    Direct,
    Custom,
    Put(PutSizing),
    PutN(PutSizing),
    GetN,
    GenN { not_shared: bool },
    DelN,
    Is,
    Create { not_shared: bool },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::NoCommand => StrategyKind::NoCommand,
            Self::Direct => StrategyKind::Direct,
            Self::Custom => StrategyKind::Custom,
            Self::Put(_) => StrategyKind::Put,
            Self::PutN(_) => StrategyKind::PutN,
            Self::GetN => StrategyKind::GetN,
            Self::GenN { .. } => StrategyKind::GenN,
            Self::DelN => StrategyKind::DelN,
            Self::Is => StrategyKind::Is,
            Self::Create { .. } => StrategyKind::Create,
        }
    }

    pub fn put_sizing(&self) -> Option<PutSizing> {
        match self {
            Self::Put(sizing) | Self::PutN(sizing) => Some(*sizing),
            _ => None,
        }
    }

    pub fn not_shared(&self) -> bool {
        matches!(
            self,
            Self::GenN { not_shared: true } | Self::Create { not_shared: true }
        )
    }
}

/// Flags every record carries regardless of strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseFlags {
    pub client_entry: bool,
    pub generated_marshal: bool,
    pub internal: bool,
    pub trace_level: Option<u8>,
    pub extension: Option<Extension>,
}

/// Which test cases the test emitters produce for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestFlags {
    pub unit_test: bool,
    pub client_test: bool,
    pub expectation: bool,
    pub invalid_test: bool,
}

/// Signature, override and inferred defaults merged into one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    /// Line of the declaration in the signature file.
    pub line: usize,
    pub return_type: CType,
    /// Parameters as declared; the client-facing surface.
    pub declared_args: Vec<Param>,
    /// Arguments carried on the wire.
    pub args: Vec<Param>,
    pub strategy: Strategy,
    /// Transfer methods in preference order; empty for NoCommand.
    pub transfer: Vec<TransferMethod>,
    pub base: BaseFlags,
    pub tests: TestFlags,
    pub decoder: Option<String>,
    pub valid_args: BTreeMap<usize, String>,
    pub resource: Option<String>,
    pub test_func: Option<String>,
}

impl FunctionRecord {
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Returns true if the record produces wire commands.
    pub fn is_id_bearing(&self) -> bool {
        self.kind().is_id_bearing()
    }

    /// Returns true if the record appears on the public client interface.
    pub fn has_public_entry(&self) -> bool {
        self.base.client_entry && !self.base.internal
    }

    /// Returns true if a marshaling function is generated for the record.
    pub fn has_generated_marshal(&self) -> bool {
        self.is_id_bearing() && self.base.client_entry && self.base.generated_marshal
    }

    pub fn method_name(&self) -> String {
        naming::method_name(&self.name)
    }

    /// Service handler the decoder dispatches to.
    pub fn decoder_name(&self) -> String {
        self.decoder
            .clone()
            .unwrap_or_else(|| naming::default_decoder(&self.name))
    }

    /// The transfer method a client entry uses.
    pub fn preferred_transfer(&self) -> Option<TransferMethod> {
        self.transfer.first().copied()
    }

    /// Indices of pointer arguments, in argument order.
    pub fn pointer_args(&self) -> Vec<usize> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, arg)| arg.ty.is_pointer())
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_record;

    #[test]
    fn strategy_kind_matches_variant() {
        let put = Strategy::Put(PutSizing {
            count: Some(16),
            use_count_func: false,
        });
        assert_eq!(put.kind(), StrategyKind::Put);
        assert_eq!(put.put_sizing().and_then(|s| s.count), Some(16));
        assert!(Strategy::DelN.put_sizing().is_none());
    }

    #[test]
    fn not_shared_only_on_gen_and_create() {
        assert!(Strategy::GenN { not_shared: true }.not_shared());
        assert!(Strategy::Create { not_shared: true }.not_shared());
        assert!(!Strategy::Create { not_shared: false }.not_shared());
        assert!(!Strategy::Direct.not_shared());
    }

    #[test]
    fn decoder_defaults_to_do_prefix() {
        let mut record = make_record("EndRasterCHROMIUM", Strategy::Direct);
        assert_eq!(record.decoder_name(), "do_end_raster_chromium");

        record.decoder = Some("get_gl_error".to_string());
        assert_eq!(record.decoder_name(), "get_gl_error");
    }

    #[test]
    fn internal_records_have_no_public_entry() {
        let mut record = make_record("ClearPaintCacheINTERNAL", Strategy::Direct);
        assert!(record.has_public_entry());
        assert!(record.has_generated_marshal());

        record.base.internal = true;
        assert!(!record.has_public_entry());
        assert!(record.has_generated_marshal());
    }

    #[test]
    fn no_command_records_have_no_marshal() {
        let record = make_record("ShallowFlushCHROMIUM", Strategy::NoCommand);
        assert!(!record.is_id_bearing());
        assert!(record.has_public_entry());
        assert!(!record.has_generated_marshal());
    }

    #[test]
    fn strategy_serializes_with_kind_tag() {
        let json = serde_json::to_value(Strategy::GenN { not_shared: true }).unwrap();
        assert_eq!(json["kind"], "GenN");
        assert_eq!(json["not_shared"], true);

        let json = serde_json::to_value(Strategy::Put(PutSizing {
            count: Some(16),
            use_count_func: false,
        }))
        .unwrap();
        assert_eq!(json["kind"], "Put");
        assert_eq!(json["count"], 16);
    }
}
