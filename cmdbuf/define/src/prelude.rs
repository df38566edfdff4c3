//! Convenient re-exports for writing protocol definitions.
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_define::prelude::*;
//!
//! let overrides = OverrideTable::new(vec![
//!     FunctionOverride::new("Finish").strategy(StrategyKind::Direct),
//!     FunctionOverride::new("ShallowFlushCHROMIUM").strategy(StrategyKind::NoCommand),
//! ])
//! .unwrap();
//! assert_eq!(overrides.len(), 2);
//! ```

pub use crate::error::DefineError;
pub use crate::named_type::{NamedType, NamedTypeId, NamedTypeRegistry};
pub use crate::overrides::{FunctionOverride, OverrideTable};
pub use crate::protocol::ProtocolDefinition;
pub use crate::signature::{CType, FunctionSignature, Param};
pub use crate::strategy::{Extension, StrategyKind, TransferMethod};
