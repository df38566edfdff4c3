//! Signature file parsing.
//!
//! The signature file is line oriented:
//!
//! ```text
//! // comment
//! void DeleteTextures(GLsizei n, const GLuint* textures);
//! void GetIntegerv(GLenum<GLState> pname, GLint* params);
//! GLuint CreateTexture(bool use_buffer, gfx::BufferUsage buffer_usage);
//! ```
//!
//! A parameter type is `[const] Base[<Named>]{*}`. The `<Named>` qualifier
//! must resolve in the registry and the named type's underlying type must be
//! `Base`; a `Base` that is itself a registered name refers to that type.
//! The trailing `;` is optional and `()` or `(void)` declares no parameters.

use std::collections::BTreeMap;

use cmdbuf_define::{CType, FunctionSignature, NamedTypeRegistry, Param};
use tracing::debug;

use crate::errors::{ParamError, ParseError};
use crate::naming::is_identifier;

/// Parses every declaration in `text`, in file order.
///
/// Parsing continues past bad lines so that all problems are reported at
/// once.
///
/// ## Errors
///
/// Returns every `ParseError` found: malformed declarations or parameters,
/// unknown or mismatched named types, and duplicate function names.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::NamedTypeRegistry;
/// use cmdbuf_gen::parser::parse_signatures;
///
/// let registry = NamedTypeRegistry::default();
/// let text = "void Flush();\nvoid DeleteTextures(GLsizei n, const GLuint* textures);";
/// let signatures = parse_signatures(text, &registry).unwrap();
///
/// assert_eq!(signatures.len(), 2);
/// assert_eq!(signatures[1].params[1].ty.to_string(), "const GLuint*");
/// assert_eq!(signatures[1].line, 2);
/// ```
pub fn parse_signatures(
    text: &str,
    registry: &NamedTypeRegistry,
) -> Result<Vec<FunctionSignature>, Vec<ParseError>> {
    let mut signatures = Vec::new();
    let mut errors = Vec::new();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = match raw.find("//") {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        match parse_declaration(content, line, registry) {
            Ok(signature) => {
                if let Some(&first_line) = seen.get(&signature.name) {
                    errors.push(ParseError::DuplicateFunction {
                        line,
                        name: signature.name,
                        first_line,
                    });
                    continue;
                }
                seen.insert(signature.name.clone(), line);
                signatures.push(signature);
            }
            Err(err) => errors.push(err),
        }
    }

    debug!(
        "parsed {} signatures ({} errors)",
        signatures.len(),
        errors.len()
    );

    if errors.is_empty() {
        Ok(signatures)
    } else {
        Err(errors)
    }
}

fn parse_declaration(
    content: &str,
    line: usize,
    registry: &NamedTypeRegistry,
) -> Result<FunctionSignature, ParseError> {
    let malformed = |reason: &str| ParseError::MalformedDeclaration {
        line,
        reason: reason.to_string(),
    };

    let content = content.strip_suffix(';').unwrap_or(content).trim_end();
    let open = content.find('(').ok_or_else(|| malformed("missing '('"))?;
    let params_text = content[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| malformed("declaration must end with ')'"))?;
    if params_text.contains('(') || params_text.contains(')') {
        return Err(malformed("unbalanced parentheses"));
    }

    let (return_text, name) = split_trailing_identifier(content[..open].trim_end());
    if name.is_empty() {
        return Err(malformed("missing function name"));
    }
    if return_text.is_empty() {
        return Err(malformed("missing return type"));
    }

    let return_type =
        parse_type(return_text, registry).map_err(|e| ParseError::from_param(line, name, e))?;
    let params =
        parse_param_list(params_text, registry).map_err(|e| ParseError::from_param(line, name, e))?;

    Ok(FunctionSignature {
        name: name.to_string(),
        return_type,
        params,
        line,
    })
}

/// Parses a comma-separated parameter list.
///
/// Shared by the signature parser and by override argument lists.
///
/// ## Errors
///
/// Returns the first `ParamError` in the list.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{NamedType, NamedTypeRegistry};
/// use cmdbuf_gen::parser::parse_param_list;
///
/// let registry = NamedTypeRegistry::new(vec![
///     NamedType::new("QueryTarget", "GLenum").valid(["GL_COMMANDS_ISSUED_CHROMIUM"]),
/// ])
/// .unwrap();
///
/// let params = parse_param_list("GLenum<QueryTarget> target, void* sync_data", &registry).unwrap();
/// assert!(params[0].ty.named.is_some());
/// assert_eq!(params[1].ty.pointer_depth, 1);
///
/// assert!(parse_param_list("", &registry).unwrap().is_empty());
/// assert!(parse_param_list("void", &registry).unwrap().is_empty());
/// assert!(parse_param_list("GLenum<Missing> target", &registry).is_err());
/// ```
pub fn parse_param_list(text: &str, registry: &NamedTypeRegistry) -> Result<Vec<Param>, ParamError> {
    let text = text.trim();
    if text.is_empty() || text == "void" {
        return Ok(Vec::new());
    }

    text.split(',')
        .map(|piece| parse_param(piece.trim(), registry))
        .collect()
}

fn parse_param(text: &str, registry: &NamedTypeRegistry) -> Result<Param, ParamError> {
    let malformed = |reason: &str| ParamError::Malformed {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    if text.is_empty() {
        return Err(malformed("empty parameter"));
    }
    let (type_text, name) = split_trailing_identifier(text);
    if name.is_empty() {
        return Err(malformed("missing parameter name"));
    }
    if type_text.is_empty() {
        return Err(malformed("missing parameter type"));
    }

    let ty = parse_type(type_text, registry).map_err(|err| match err {
        ParamError::Malformed { reason, .. } => ParamError::Malformed {
            text: text.to_string(),
            reason,
        },
        other => other,
    })?;

    Ok(Param::new(ty, name))
}

/// Parses `[const] Base[<Named>]{*}`.
fn parse_type(text: &str, registry: &NamedTypeRegistry) -> Result<CType, ParamError> {
    let malformed = |reason: &str| ParamError::Malformed {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = text.trim();
    let mut pointer_depth: u8 = 0;
    while let Some(stripped) = rest.strip_suffix('*') {
        pointer_depth = pointer_depth
            .checked_add(1)
            .ok_or_else(|| malformed("too many pointer levels"))?;
        rest = stripped.trim_end();
    }

    let (is_const, rest) = match rest.strip_prefix("const") {
        Some(stripped) if stripped.starts_with(char::is_whitespace) => (true, stripped.trim_start()),
        _ => (false, rest),
    };

    let (base, named_name) = match rest.find('<') {
        Some(open) => {
            let inner = rest[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| malformed("unterminated '<'"))?;
            (rest[..open].trim_end(), Some(inner.trim()))
        }
        None => (rest, None),
    };

    if !is_type_path(base) {
        return Err(malformed("invalid type name"));
    }

    let named = match named_name {
        Some(name) => {
            let id = registry
                .resolve_id(name)
                .map_err(|_| ParamError::UnknownNamedType(name.to_string()))?;
            let named = registry.get(id);
            if named.ty != base {
                return Err(ParamError::NamedTypeMismatch {
                    name: name.to_string(),
                    expected: named.ty.clone(),
                    found: base.to_string(),
                });
            }
            Some(id)
        }
        None => registry.resolve_id(base).ok(),
    };

    Ok(CType {
        is_const,
        base: base.to_string(),
        pointer_depth,
        named,
    })
}

/// Splits `text` into everything before its trailing identifier and the
/// identifier itself.
fn split_trailing_identifier(text: &str) -> (&str, &str) {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let name = &text[start..];
    if !name.is_empty() && !is_identifier(name) {
        return (text, "");
    }
    (text[..start].trim_end(), name)
}

fn is_type_path(text: &str) -> bool {
    !text.is_empty() && text.split("::").all(is_identifier)
}
