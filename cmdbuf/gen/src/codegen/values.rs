//! Argument values for generated tests.
//!
//! A value comes from the record's `valid_args` first, then from the named
//! type's first legal value, and finally from a synthetic scalar derived
//! from the argument position. Values that cannot be chosen are reported as
//! `None` so the caller can omit the case.

use cmdbuf_define::{NamedTypeRegistry, Param};
use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::codegen::types::rust_type;
use crate::errors::EmitError;
use crate::record::FunctionRecord;
use crate::wire::{ArgLayout, PointerSizing, WireCommand, WireKind};

/// Element count given to counted and runtime-sized data in generated tests.
pub const TEST_COUNT: u32 = 2;

/// Parses a literal from the definitions into an expression.
///
/// ## Errors
///
/// Returns `EmitError::InvalidLiteral` if `value` is not an expression.
pub fn parse_literal(function: &str, value: &str) -> Result<TokenStream, EmitError> {
    syn::parse_str::<syn::Expr>(value)
        .map(|expr| quote!(#expr))
        .map_err(|_| EmitError::InvalidLiteral {
            function: function.to_string(),
            value: value.to_string(),
        })
}

/// Picks a valid value for the scalar argument at `index`.
///
/// ## Returns
///
/// - `Ok(Some(tokens))` with an expression of the argument's type
/// - `Ok(None)` if no value can be chosen
///
/// ## Errors
///
/// Returns `EmitError::InvalidLiteral` for an unparsable `valid_args` entry
/// or legal value.
pub fn valid_value(
    record: &FunctionRecord,
    index: usize,
    param: &Param,
    registry: &NamedTypeRegistry,
) -> Result<Option<TokenStream>, EmitError> {
    let Some(kind) = WireKind::of(&param.ty) else {
        return Ok(None);
    };

    if let Some(value) = record.valid_args.get(&index) {
        return typed_literal(&record.name, value, kind, &param.ty.base).map(Some);
    }

    if let Some(type_id) = param.ty.named {
        let named = registry.get(type_id);
        if let Some(first) = named.valid.first() {
            return typed_literal(&record.name, first, kind, &param.ty.base).map(Some);
        }
    }

    Ok(synthetic_value(index, kind, &param.ty.base))
}

/// Picks the test value of a command's scalar argument at `index`.
///
/// Arguments that size pointer data get [`TEST_COUNT`] so the test can
/// build matching data.
pub fn arg_value(
    command: &WireCommand<'_>,
    index: usize,
    registry: &NamedTypeRegistry,
) -> Result<Option<TokenStream>, EmitError> {
    let param = command.args[index].param;
    if sizes_data(command, index) {
        let ty = rust_type(&param.ty.base);
        let count = Literal::u32_unsuffixed(TEST_COUNT);
        return Ok(Some(quote!(#count as #ty)));
    }
    valid_value(command.record, index, param, registry)
}

/// Number of elements in the test data of a sized pointer argument.
pub fn data_len(sizing: PointerSizing) -> usize {
    match sizing {
        PointerSizing::Fixed(units) => units as usize,
        PointerSizing::Counted { units, .. } => (TEST_COUNT * units) as usize,
        PointerSizing::Runtime { .. } | PointerSizing::Unsized => TEST_COUNT as usize,
    }
}

/// Returns true if the argument at `index` counts another argument's data.
fn sizes_data(command: &WireCommand<'_>, index: usize) -> bool {
    command.args.iter().any(|arg| {
        let sizing = match arg.layout {
            ArgLayout::Immediate { sizing }
            | ArgLayout::Shm { sizing, .. }
            | ArgLayout::Bucket { sizing, .. } => sizing,
            _ => return false,
        };
        matches!(sizing, PointerSizing::Counted { arg, .. } if arg == index)
    })
}

/// Value for position `index` that does not depend on any definition.
pub fn synthetic_value(index: usize, kind: WireKind, base: &str) -> Option<TokenStream> {
    let ty = rust_type(base);
    let value = index as u32 + 11;
    match kind {
        WireKind::U32 | WireKind::I32 | WireKind::U64 => {
            let lit = Literal::u32_unsuffixed(value);
            Some(quote!(#lit as #ty))
        }
        WireKind::F32 => {
            let lit = Literal::f32_unsuffixed(value as f32);
            Some(quote!(#lit as #ty))
        }
        WireKind::Bool => Some(if index % 2 == 0 { quote!(true) } else { quote!(false) }),
        WireKind::Enum => None,
    }
}

/// Parses a literal and casts plain scalars to the argument type; enums and
/// bools stay as written.
///
/// ## Errors
///
/// Returns `EmitError::InvalidLiteral` if `value` is not an expression.
pub fn typed_literal(
    function: &str,
    value: &str,
    kind: WireKind,
    base: &str,
) -> Result<TokenStream, EmitError> {
    let expr = parse_literal(function, value)?;
    Ok(match kind {
        WireKind::Enum | WireKind::Bool => expr,
        _ => {
            let ty = rust_type(base);
            quote!(#expr as #ty)
        }
    })
}
