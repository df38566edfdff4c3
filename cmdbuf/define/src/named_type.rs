//! Named argument types and the registry that owns them.
//!
//! A named type is an enumerated argument type (for example `QueryTarget`)
//! whose legal values are known up front. The registry is built once, checks
//! every type's invariants, and hands out [`NamedTypeId`] keys so that the
//! rest of the pipeline never looks types up by string again.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DefineError;

/// Interned key of a named type inside a [`NamedTypeRegistry`].
///
/// Ids are only minted by the registry, so holding one proves the type
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamedTypeId(usize);

impl NamedTypeId {
    /// Position of the type in registry order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An enumerated argument type with its legal and illegal value universe.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::NamedType;
///
/// let target = NamedType::new("QueryTarget", "GLenum")
///     .complete()
///     .valid(["GL_COMMANDS_ISSUED_CHROMIUM", "GL_COMMANDS_COMPLETED_CHROMIUM"])
///     .invalid(["GL_LATENCY_QUERY_CHROMIUM"]);
///
/// assert!(target.is_complete);
/// assert!(target.is_valid_value("GL_COMMANDS_ISSUED_CHROMIUM"));
/// assert!(!target.is_valid_value("GL_LATENCY_QUERY_CHROMIUM"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedType {
    /// Identifier used by signatures (e.g. `QueryTarget`, `gfx::BufferUsage`).
    pub name: String,
    /// Underlying representation type (e.g. `GLenum`).
    pub ty: String,
    /// Values accepted by both client and service, in declaration order.
    pub valid: Vec<String>,
    /// Values that must be rejected; used for negative tests.
    pub invalid: Vec<String>,
    /// The legal set is final and never extended at runtime.
    pub is_complete: bool,
    /// Whether a validator is synthesized for this type.
    pub generate_validator: bool,
}

impl NamedType {
    /// Creates a named type with empty value sets and validator generation on.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            valid: Vec::new(),
            invalid: Vec::new(),
            is_complete: false,
            generate_validator: true,
        }
    }

    /// Appends legal values.
    pub fn valid<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid.extend(values.into_iter().map(Into::into));
        self
    }

    /// Appends illegal values.
    pub fn invalid<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invalid.extend(values.into_iter().map(Into::into));
        self
    }

    /// Marks the legal set as exhaustive.
    pub fn complete(mut self) -> Self {
        self.is_complete = true;
        self
    }

    /// Disables validator synthesis. Values are still tested.
    pub fn without_validator(mut self) -> Self {
        self.generate_validator = false;
        self
    }

    /// Returns true if `value` is in the legal set.
    pub fn is_valid_value(&self, value: &str) -> bool {
        self.valid.iter().any(|v| v == value)
    }

    /// Checks the invariants the registry relies on.
    fn check(&self) -> Result<(), DefineError> {
        let fail = |reason: &str| {
            Err(DefineError::InvalidNamedType {
                name: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            return fail("name cannot be empty");
        }
        if self.ty.trim().is_empty() {
            return fail("underlying type cannot be empty");
        }
        if self.generate_validator && self.valid.is_empty() {
            return fail("a validator requires at least one legal value");
        }

        let mut seen = BTreeSet::new();
        for value in &self.valid {
            if value.trim().is_empty() {
                return fail("legal values cannot be empty");
            }
            if !seen.insert(value.as_str()) {
                return fail(&format!("legal value '{value}' is listed twice"));
            }
        }

        let mut seen_invalid = BTreeSet::new();
        for value in &self.invalid {
            if !seen_invalid.insert(value.as_str()) {
                return fail(&format!("illegal value '{value}' is listed twice"));
            }
            if seen.contains(value.as_str()) {
                return fail(&format!("'{value}' is listed as both legal and illegal"));
            }
        }

        Ok(())
    }
}

/// Ordered, validated collection of named types.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{DefineError, NamedType, NamedTypeRegistry};
///
/// let registry = NamedTypeRegistry::new(vec![
///     NamedType::new("GLState", "GLenum").valid(["GL_ACTIVE_TEXTURE"]),
/// ])
/// .unwrap();
///
/// assert_eq!(registry.resolve("GLState").unwrap().ty, "GLenum");
/// assert_eq!(
///     registry.resolve("Missing"),
///     Err(DefineError::UnknownType("Missing".to_string()))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedTypeRegistry {
    types: Vec<NamedType>,
    index: BTreeMap<String, NamedTypeId>,
}

impl NamedTypeRegistry {
    /// Builds the registry, validating every type.
    ///
    /// ## Errors
    ///
    /// Returns `DefineError::DuplicateType` for repeated names and
    /// `DefineError::InvalidNamedType` for a type that breaks its invariants.
    pub fn new(types: Vec<NamedType>) -> Result<Self, DefineError> {
        let mut index = BTreeMap::new();
        for (position, named) in types.iter().enumerate() {
            named.check()?;
            if index
                .insert(named.name.clone(), NamedTypeId(position))
                .is_some()
            {
                return Err(DefineError::DuplicateType(named.name.clone()));
            }
        }
        Ok(Self { types, index })
    }

    /// Looks up a type by name.
    ///
    /// ## Errors
    ///
    /// Returns `DefineError::UnknownType` if no type has that name.
    pub fn resolve(&self, name: &str) -> Result<&NamedType, DefineError> {
        self.resolve_id(name).map(|id| self.get(id))
    }

    /// Looks up the interned key of a type.
    ///
    /// ## Errors
    ///
    /// Returns `DefineError::UnknownType` if no type has that name.
    pub fn resolve_id(&self, name: &str) -> Result<NamedTypeId, DefineError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| DefineError::UnknownType(name.to_string()))
    }

    /// Returns the type behind an id minted by this registry.
    pub fn get(&self, id: NamedTypeId) -> &NamedType {
        &self.types[id.0]
    }

    /// Iterates over types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (NamedTypeId, &NamedType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(position, named)| (NamedTypeId(position), named))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_target() -> NamedType {
        NamedType::new("QueryTarget", "GLenum")
            .complete()
            .valid(["GL_COMMANDS_ISSUED_CHROMIUM", "GL_COMMANDS_COMPLETED_CHROMIUM"])
            .invalid(["GL_LATENCY_QUERY_CHROMIUM"])
    }

    #[test]
    fn registry_preserves_declaration_order() {
        let registry = NamedTypeRegistry::new(vec![
            query_target(),
            NamedType::new("GLState", "GLenum").valid(["GL_ACTIVE_TEXTURE"]),
        ])
        .unwrap();

        let names: Vec<_> = registry.iter().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, vec!["QueryTarget", "GLState"]);
        assert_eq!(registry.resolve_id("GLState").unwrap().index(), 1);
    }

    #[test]
    fn resolve_unknown_type_fails() {
        let registry = NamedTypeRegistry::new(vec![query_target()]).unwrap();
        assert_eq!(
            registry.resolve("TextureTarget"),
            Err(DefineError::UnknownType("TextureTarget".to_string()))
        );
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let result = NamedTypeRegistry::new(vec![query_target(), query_target()]);
        assert_eq!(
            result,
            Err(DefineError::DuplicateType("QueryTarget".to_string()))
        );
    }

    #[test]
    fn validator_requires_legal_values() {
        let result = NamedTypeRegistry::new(vec![NamedType::new("Empty", "GLenum")]);
        match result {
            Err(DefineError::InvalidNamedType { name, reason }) => {
                assert_eq!(name, "Empty");
                assert!(reason.contains("legal value"));
            }
            other => panic!("Expected InvalidNamedType, got: {:?}", other),
        }
    }

    #[test]
    fn type_without_validator_may_have_no_legal_values() {
        let registry =
            NamedTypeRegistry::new(vec![NamedType::new("Opaque", "GLuint").without_validator()]);
        assert!(registry.is_ok());
    }

    #[test]
    fn overlapping_sets_are_rejected() {
        let named = NamedType::new("Filter", "GLenum")
            .valid(["GL_NEAREST"])
            .invalid(["GL_NEAREST"]);
        let err = NamedTypeRegistry::new(vec![named]).unwrap_err();
        assert!(err.to_string().contains("both legal and illegal"));
    }

    #[test]
    fn repeated_legal_value_is_rejected() {
        let named = NamedType::new("Filter", "GLenum").valid(["GL_NEAREST", "GL_NEAREST"]);
        assert!(NamedTypeRegistry::new(vec![named]).is_err());
    }

    #[test]
    fn named_type_serializes_with_all_fields() {
        let json = serde_json::to_value(query_target()).unwrap();
        assert_eq!(json["name"], "QueryTarget");
        assert_eq!(json["is_complete"], true);
        assert_eq!(json["invalid"][0], "GL_LATENCY_QUERY_CHROMIUM");
    }
}
