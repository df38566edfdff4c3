//! Service validation generation.
//!
//! Two artifacts. The header declares the `Validators` container with one
//! field per synthesized validator, and a type per validator: complete types
//! get a unit struct whose `is_valid` compares against each legal value, the
//! others alias the runtime extensible `ValueValidator`. The implementation
//! builds the container and the fixed `is_valid` bodies.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::codegen::EmitContext;
use crate::codegen::types::rust_type;
use crate::codegen::values::parse_literal;
use crate::errors::EmitError;
use crate::naming::ident;
use crate::validators::ValidatorSpec;

/// Generates the validation header artifact.
pub fn generate_validation_header(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let complete = ctx.validators.iter().filter(|v| v.is_complete).count();
    let docs = ctx
        .docs("Service validators")
        .item(format!("{} validators", ctx.validators.len()))
        .item(format!("{} with a fixed value set", complete))
        .build();
    let support = ctx.support_use();

    let fields = ctx.validators.iter().map(|spec| {
        let field = ident(&spec.field);
        let ty = format_ident!("{}", spec.type_name);
        quote! { pub #field: #ty, }
    });

    let types = ctx.validators.iter().map(|spec| {
        let name = format_ident!("{}", spec.type_name);
        let doc = format!(" Legal values of `{}`.", spec.name);
        if spec.is_complete {
            quote! {
                #[doc = #doc]
                #[derive(Debug, Clone, Copy, Default)]
                pub struct #name;
            }
        } else {
            let ty = rust_type(&spec.ty);
            quote! {
                #[doc = #doc]
                pub type #name = ValueValidator<#ty>;
            }
        }
    });

    Ok(quote! {
        #docs

        #support

        /// Validators the decoder checks arguments against.
        #[derive(Debug, Clone)]
        pub struct Validators {
            #(#fields)*
        }

        #(#types)*
    })
}

/// Generates the validation implementation artifact.
///
/// ## Errors
///
/// Returns `EmitError::InvalidLiteral` if a legal value is not an
/// expression.
pub fn generate_validation_implementation(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let docs = ctx
        .docs("Service validator implementation")
        .item(format!("{} validators", ctx.validators.len()))
        .build();
    let support = ctx.support_use();

    let mut inits = Vec::new();
    let mut impls = Vec::new();
    for spec in ctx.validators.iter() {
        let field = ident(&spec.field);
        let name = format_ident!("{}", spec.type_name);
        if spec.is_complete {
            inits.push(quote! { #field: #name, });
            impls.push(complete_impl(spec)?);
        } else {
            let values = spec
                .valid
                .iter()
                .map(|value| parse_literal(&spec.name, value))
                .collect::<Result<Vec<_>, _>>()?;
            inits.push(quote! { #field: ValueValidator::new(&[#(#values),*]), });
        }
    }

    Ok(quote! {
        #docs

        #support

        impl Validators {
            pub fn new() -> Self {
                Self {
                    #(#inits)*
                }
            }
        }

        impl Default for Validators {
            fn default() -> Self {
                Self::new()
            }
        }

        #(#impls)*
    })
}

fn complete_impl(spec: &ValidatorSpec) -> Result<TokenStream, EmitError> {
    let name = format_ident!("{}", spec.type_name);
    let ty = rust_type(&spec.ty);
    let values = spec
        .valid
        .iter()
        .map(|value| parse_literal(&spec.name, value))
        .collect::<Result<Vec<_>, _>>()?;

    // Comparisons, not patterns: an out-of-scope constant in a pattern
    // would bind as a catch-all.
    let body = if values.is_empty() {
        quote!(false)
    } else {
        quote!(#(value == #values)||*)
    };

    Ok(quote! {
        impl #name {
            pub fn is_valid(&self, value: #ty) -> bool {
                #body
            }
        }
    })
}
