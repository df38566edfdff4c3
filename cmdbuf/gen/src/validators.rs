//! Validator synthesis for named types.
//!
//! Every named type that an ID-bearing record passes over the wire gets one
//! [`ValidatorSpec`]. The service decoder consults it before dispatch, the
//! validation emitter renders it, and the decoder test emitter draws its
//! invalid values from it.

use std::collections::BTreeMap;

use cmdbuf_define::{NamedTypeId, NamedTypeRegistry};
use tracing::debug;

use crate::naming;
use crate::record::FunctionRecord;

/// Description of the validator for one named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSpec {
    pub type_id: NamedTypeId,
    /// Named type identifier, e.g. `QueryTarget`.
    pub name: String,
    /// Underlying value type.
    pub ty: String,
    /// Field in the validator container, e.g. `query_target`.
    pub field: String,
    /// Validator type, e.g. `QueryTargetValidator`.
    pub type_name: String,
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
    pub is_complete: bool,
}

impl ValidatorSpec {
    /// Returns true if the validator accepts `value`.
    pub fn accepts(&self, value: &str) -> bool {
        self.valid.iter().any(|v| v == value)
    }
}

/// All synthesized validators, keyed and ordered by registry position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorSet {
    specs: BTreeMap<NamedTypeId, ValidatorSpec>,
}

impl ValidatorSet {
    /// Synthesizes validators for the named types referenced by wire
    /// arguments.
    ///
    /// Types with `generate_validator = false` and types used only by
    /// NoCommand records are skipped. Each type is described once no
    /// matter how many arguments refer to it.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cmdbuf_define::{NamedType, NamedTypeRegistry, OverrideTable};
    /// use cmdbuf_gen::builder::build_records;
    /// use cmdbuf_gen::parser::parse_signatures;
    /// use cmdbuf_gen::validators::ValidatorSet;
    ///
    /// let registry = NamedTypeRegistry::new(vec![
    ///     NamedType::new("QueryTarget", "GLenum")
    ///         .complete()
    ///         .valid(["GL_COMMANDS_ISSUED_CHROMIUM"])
    ///         .invalid(["GL_LATENCY_QUERY_CHROMIUM"]),
    /// ])
    /// .unwrap();
    /// let text = "void BeginQueryEXT(GLenum<QueryTarget> target, GLuint id);\n\
    ///             void EndQueryEXT(GLenum<QueryTarget> target);";
    /// let signatures = parse_signatures(text, &registry).unwrap();
    /// let records = build_records(&signatures, &registry, &OverrideTable::default()).unwrap();
    ///
    /// let validators = ValidatorSet::synthesize(&records, &registry);
    /// assert_eq!(validators.len(), 1);
    ///
    /// let spec = validators.iter().next().unwrap();
    /// assert!(spec.accepts("GL_COMMANDS_ISSUED_CHROMIUM"));
    /// assert!(!spec.accepts("GL_LATENCY_QUERY_CHROMIUM"));
    /// ```
    pub fn synthesize(records: &[FunctionRecord], registry: &NamedTypeRegistry) -> Self {
        let mut specs = BTreeMap::new();

        let referenced = records
            .iter()
            .filter(|record| record.is_id_bearing())
            .flat_map(|record| record.args.iter())
            .filter(|arg| !arg.ty.is_pointer())
            .filter_map(|arg| arg.ty.named);

        for type_id in referenced {
            if specs.contains_key(&type_id) {
                continue;
            }
            let named = registry.get(type_id);
            if !named.generate_validator {
                continue;
            }
            specs.insert(
                type_id,
                ValidatorSpec {
                    type_id,
                    name: named.name.clone(),
                    ty: named.ty.clone(),
                    field: naming::validator_field(&named.name),
                    type_name: naming::validator_type(&named.name),
                    valid: named.valid.clone(),
                    invalid: named.invalid.clone(),
                    is_complete: named.is_complete,
                },
            );
        }

        debug!("synthesized {} validators", specs.len());
        Self { specs }
    }

    pub fn get(&self, type_id: NamedTypeId) -> Option<&ValidatorSpec> {
        self.specs.get(&type_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
