//! Cross-reference validation between overrides and built records.
//!
//! Runs after the record builder and before any emitter. Catching these
//! problems early keeps emitters free of lookups that could fail.
//!
//! ## Validation Checks
//!
//! - **Dangling overrides**: every override must name a declared function
//! - **Method name collisions**: two functions must not map to the same
//!   snake_case method name
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_define::{FunctionOverride, NamedTypeRegistry, OverrideTable};
//! use cmdbuf_gen::builder::build_records;
//! use cmdbuf_gen::parser::parse_signatures;
//! use cmdbuf_gen::validation::validate_records;
//!
//! let registry = NamedTypeRegistry::default();
//! let signatures = parse_signatures("void Flush();", &registry).unwrap();
//! let overrides = OverrideTable::new(vec![FunctionOverride::new("Flsh")]).unwrap();
//! let records = build_records(&signatures, &registry, &overrides).unwrap();
//!
//! let errors = validate_records(&records, &overrides).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use std::collections::BTreeMap;

use cmdbuf_define::OverrideTable;
use tracing::debug;

use crate::errors::MergeError;
use crate::record::FunctionRecord;

/// Validates records against the override table.
///
/// ## Errors
///
/// Returns `MergeError::UnknownFunction` for each override that names no
/// record and `MergeError::DuplicateMethodName` for each method name
/// shared by two functions.
pub fn validate_records(
    records: &[FunctionRecord],
    overrides: &OverrideTable,
) -> Result<(), Vec<MergeError>> {
    let mut errors = Vec::new();

    let mut methods: BTreeMap<String, &str> = BTreeMap::new();
    for record in records {
        let method = record.method_name();
        if let Some(first) = methods.get(&method) {
            errors.push(MergeError::DuplicateMethodName {
                method,
                first: first.to_string(),
                second: record.name.clone(),
            });
            continue;
        }
        methods.insert(method, &record.name);
    }

    for entry in overrides.iter() {
        if !records.iter().any(|record| record.name == entry.name) {
            errors.push(MergeError::UnknownFunction(entry.name.clone()));
        }
    }

    debug!(
        "cross-referenced {} records against {} overrides",
        records.len(),
        overrides.len()
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
