//! Strategy inference from argument shapes.
//!
//! When an override does not name a strategy, the record builder infers one
//! from the effective arguments and the return type. The rules are checked
//! in order and the first match wins:
//!
//! | shape | strategy |
//! |---|---|
//! | non-void return, no pointers | `Is` |
//! | no pointers | `Direct` |
//! | `(GLsizei n, const T* ids)` | `DELn` |
//! | `(GLsizei n, T* ids)` | `GENn` |
//! | `(..., GLenum pname, T* params)` | `GETn` |
//! | `(..., GLsizei count, const T* values)` | `PUTn` |
//! | `(..., const T* data)` | `PUT` |
//!
//! Anything else yields `None`; the builder turns that into a hard error
//! rather than guessing.
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_define::{CType, NamedTypeRegistry, StrategyKind};
//! use cmdbuf_gen::inference::infer_strategy;
//! use cmdbuf_gen::parser::parse_param_list;
//!
//! let registry = NamedTypeRegistry::default();
//! let args = parse_param_list("GLsizei n, const GLuint* textures", &registry).unwrap();
//! assert_eq!(infer_strategy(&CType::void(), &args), Some(StrategyKind::DelN));
//!
//! let args = parse_param_list("GLuint a, GLuint* out, const GLuint* in_", &registry).unwrap();
//! assert_eq!(infer_strategy(&CType::void(), &args), None);
//! ```

use cmdbuf_define::{CType, Param, StrategyKind};

/// Type of the element-count argument in counted shapes.
const COUNT_TYPE: &str = "GLsizei";

/// Type of the selector argument that precedes a GETn output.
const SELECTOR_TYPE: &str = "GLenum";

/// Infers a strategy from the return type and effective arguments.
///
/// ## Returns
///
/// - `Some(kind)` for a recognized shape
/// - `None` if the shape matches no rule
pub fn infer_strategy(return_type: &CType, args: &[Param]) -> Option<StrategyKind> {
    let pointers = args.iter().filter(|arg| arg.ty.is_pointer()).count();

    if pointers == 0 {
        return Some(if return_type.is_void() {
            StrategyKind::Direct
        } else {
            StrategyKind::Is
        });
    }

    // Every remaining shape returns nothing and has exactly one trailing
    // single-level pointer.
    if !return_type.is_void() || pointers != 1 {
        return None;
    }
    let (last, before) = args.split_last()?;
    if last.ty.pointer_depth != 1 {
        return None;
    }
    let previous = before.last();

    if let [count] = before
        && is_count(count)
    {
        return Some(if last.ty.is_const {
            StrategyKind::DelN
        } else {
            StrategyKind::GenN
        });
    }

    if !last.ty.is_const {
        return previous
            .filter(|arg| arg.ty.base == SELECTOR_TYPE && !arg.ty.is_pointer())
            .map(|_| StrategyKind::GetN);
    }

    if previous.is_some_and(is_count) {
        Some(StrategyKind::PutN)
    } else {
        Some(StrategyKind::Put)
    }
}

fn is_count(arg: &Param) -> bool {
    arg.ty.base == COUNT_TYPE && !arg.ty.is_pointer()
}

/// Renders the argument shape for error messages.
pub fn describe_shape(return_type: &CType, args: &[Param]) -> String {
    let args: Vec<String> = args.iter().map(|arg| arg.ty.to_string()).collect();
    format!("{} ({})", return_type, args.join(", "))
}
