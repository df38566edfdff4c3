//! Function signatures as read from the signature file.
//!
//! - [`CType`] - A parameter or return type (`const GLuint*`)
//! - [`Param`] - One `(type, name)` parameter
//! - [`FunctionSignature`] - One declaration, in file order

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::named_type::NamedTypeId;

/// A C-style type as written in a declaration.
///
/// `named` is set when the type refers to an entry of the named-type
/// registry, either through a `Base<Named>` qualifier or because the base
/// itself is a registered name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CType {
    pub is_const: bool,
    /// Base type name or path, e.g. `GLenum` or `gfx::BufferUsage`.
    pub base: String,
    /// Number of `*` after the base.
    pub pointer_depth: u8,
    pub named: Option<NamedTypeId>,
}

impl CType {
    /// Creates a plain, non-pointer type.
    pub fn value(base: impl Into<String>) -> Self {
        Self {
            is_const: false,
            base: base.into(),
            pointer_depth: 0,
            named: None,
        }
    }

    /// The `void` type.
    pub fn void() -> Self {
        Self::value("void")
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// Returns true for a bare `void` (not `void*`).
    pub fn is_void(&self) -> bool {
        self.base == "void" && self.pointer_depth == 0
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.base)?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// A single parameter of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub ty: CType,
    pub name: String,
}

impl Param {
    pub fn new(ty: CType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// One function declaration from the signature file.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{CType, FunctionSignature, Param};
///
/// let sig = FunctionSignature {
///     name: "Flush".to_string(),
///     return_type: CType::void(),
///     params: vec![],
///     line: 1,
/// };
/// assert_eq!(sig.to_string(), "void Flush()");
///
/// let mut ids = CType::value("GLuint");
/// ids.is_const = true;
/// ids.pointer_depth = 1;
/// let sig = FunctionSignature {
///     name: "DeleteTextures".to_string(),
///     return_type: CType::void(),
///     params: vec![
///         Param::new(CType::value("GLsizei"), "n"),
///         Param::new(ids, "textures"),
///     ],
///     line: 2,
/// };
/// assert_eq!(sig.to_string(), "void DeleteTextures(GLsizei n, const GLuint* textures)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: CType,
    pub params: Vec<Param>,
    /// 1-based line in the signature file.
    pub line: usize,
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}
