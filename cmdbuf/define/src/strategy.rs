//! Generation strategies and data transfer methods.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The generation pattern that governs how a function's arguments are
/// packed, validated, and decoded.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use cmdbuf_define::StrategyKind;
///
/// assert_eq!(StrategyKind::from_str("PUTn").unwrap(), StrategyKind::PutN);
/// assert_eq!(StrategyKind::DelN.to_string(), "DELn");
/// assert!(!StrategyKind::NoCommand.is_id_bearing());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum StrategyKind {
    /// Client-only call; no wire command and no id.
    NoCommand,
    /// Plain value arguments decoded and forwarded as-is.
    Direct,
    /// Hand-written service handler; pointers are passed through unresolved.
    Custom,
    /// A fixed number of data units accompanies the command.
    #[strum(to_string = "PUT")]
    Put,
    /// `count` elements of `units` each accompany the command.
    #[strum(to_string = "PUTn")]
    PutN,
    /// Reads back a sized result through shared memory.
    #[strum(to_string = "GETn")]
    GetN,
    /// Allocates `n` client ids and sends them to the service.
    #[strum(to_string = "GENn")]
    GenN,
    /// Releases `n` ids.
    #[strum(to_string = "DELn")]
    DelN,
    /// Returns a single value through shared memory.
    Is,
    /// Creates one object whose id is allocated by the client.
    Create,
}

impl StrategyKind {
    /// Returns true for strategies that accept `count` and `use_count_func`.
    pub fn is_put_family(self) -> bool {
        matches!(self, Self::Put | Self::PutN)
    }

    /// Returns true if records of this strategy produce wire commands.
    pub fn is_id_bearing(self) -> bool {
        self != Self::NoCommand
    }

    /// Returns true if results travel back through shared memory.
    pub fn returns_through_shm(self) -> bool {
        matches!(self, Self::GetN | Self::Is)
    }
}

/// Mechanism used to move pointer data that accompanies a command.
///
/// Declaration order is preference order: when a client entry has to pick
/// one method it takes the first one the record lists.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferMethod {
    /// Data is copied into the command buffer right after the command.
    Immediate,
    /// Data lives in a shared-memory segment addressed by id + offset.
    Shm,
    /// Data is staged in a bucket addressed by bucket id.
    Bucket,
}

impl TransferMethod {
    /// Suffix appended to the record name to form the wire struct name.
    pub fn struct_suffix(self) -> &'static str {
        match self {
            Self::Immediate => "Immediate",
            Self::Shm => "",
            Self::Bucket => "Bucket",
        }
    }
}

/// Extension gating for a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Extension name, e.g. `CHROMIUM_trace_marker`.
    pub name: String,
    /// Feature flag the service checks before decoding.
    pub flag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn strategy_names_round_trip_through_strum() {
        for kind in StrategyKind::iter() {
            let name = kind.to_string();
            assert_eq!(StrategyKind::from_str(&name).unwrap(), kind);
        }
    }

    #[test]
    fn put_family_is_put_and_putn_only() {
        let family: Vec<_> = StrategyKind::iter()
            .filter(|k| k.is_put_family())
            .collect();
        assert_eq!(family, vec![StrategyKind::Put, StrategyKind::PutN]);
    }

    #[test]
    fn unknown_strategy_name_fails() {
        assert!(StrategyKind::from_str("GLchar").is_err());
        assert!(StrategyKind::from_str("put").is_err());
    }

    #[test]
    fn transfer_method_names_are_lowercase() {
        assert_eq!(TransferMethod::Shm.to_string(), "shm");
        assert_eq!(
            TransferMethod::from_str("bucket").unwrap(),
            TransferMethod::Bucket
        );
        assert_eq!(
            serde_json::to_string(&TransferMethod::Immediate).unwrap(),
            "\"immediate\""
        );
    }

    #[test]
    fn transfer_methods_sort_in_preference_order() {
        let mut methods = vec![
            TransferMethod::Bucket,
            TransferMethod::Shm,
            TransferMethod::Immediate,
        ];
        methods.sort();
        assert_eq!(methods, TransferMethod::iter().collect::<Vec<_>>());
    }
}
