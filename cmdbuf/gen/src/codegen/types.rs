//! Rust type tokens for declared C types.
//!
//! GL typedefs (`GLuint`, `GLenum`, ...) and named-type paths
//! (`gfx::BufferUsage`) are emitted as written; the support module provides
//! them. Plain C primitives map to their Rust equivalents.

use cmdbuf_define::CType;
use proc_macro2::TokenStream;
use quote::quote;

use crate::naming::ident;
use crate::wire::FieldType;

/// Rust type of a base type name.
///
/// ## Examples
///
/// ```
/// use cmdbuf_gen::codegen::types::rust_type;
///
/// assert_eq!(rust_type("uint32_t").to_string(), "u32");
/// assert_eq!(rust_type("GLuint").to_string(), "GLuint");
/// assert_eq!(rust_type("gfx::BufferUsage").to_string(), "gfx :: BufferUsage");
/// ```
pub fn rust_type(base: &str) -> TokenStream {
    match base {
        "void" | "char" | "uint8_t" => quote!(u8),
        "int8_t" => quote!(i8),
        "uint16_t" => quote!(u16),
        "int16_t" => quote!(i16),
        "uint32_t" => quote!(u32),
        "int32_t" => quote!(i32),
        "uint64_t" => quote!(u64),
        "int64_t" => quote!(i64),
        "float" => quote!(f32),
        "double" => quote!(f64),
        "bool" => quote!(bool),
        _ => {
            let segments = base.split("::").map(ident);
            quote!(#(#segments)::*)
        }
    }
}

/// Rust type of a client-facing parameter.
///
/// Pointers become slices (`const` ones shared, others mutable) and
/// `const char*` becomes `&str`.
pub fn param_type(ty: &CType) -> TokenStream {
    if ty.pointer_depth == 1 && ty.is_const && ty.base == "char" {
        return quote!(&str);
    }
    let mut tokens = rust_type(&ty.base);
    for _ in 0..ty.pointer_depth {
        tokens = if ty.is_const {
            quote!(&[#tokens])
        } else {
            quote!(&mut [#tokens])
        };
    }
    tokens
}

/// Return type tokens, `None` for `void`.
pub fn return_type(ty: &CType) -> Option<TokenStream> {
    if ty.is_void() {
        None
    } else {
        Some(param_type(ty))
    }
}

/// Storage type of a wire field.
pub fn field_type(ty: FieldType) -> TokenStream {
    match ty {
        FieldType::U32 => quote!(u32),
        FieldType::I32 => quote!(i32),
        FieldType::F32 => quote!(f32),
    }
}
