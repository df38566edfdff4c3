//! Client interface generation.
//!
//! The interface trait has one method per record with a public client entry,
//! NoCommand records included. Methods take the declared parameters, not the
//! wire arguments.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::codegen::EmitContext;
use crate::codegen::types::{param_type, return_type};
use crate::errors::EmitError;
use crate::naming::ident;
use crate::record::FunctionRecord;

/// Generates the client interface artifact.
pub fn generate_interface(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let trait_name = ctx.protocol_type("Interface");
    let entries: Vec<_> = ctx.records.iter().filter(|r| r.has_public_entry()).collect();

    let docs = ctx
        .docs("Client interface")
        .item(format!("{} entry points", entries.len()))
        .build();
    let support = ctx.support_use();
    let trait_doc = format!(" Client entry points of the {} protocol.", ctx.protocol.name);

    let methods = entries.iter().map(|record| {
        let doc = format!(" `{}`", declaration(record));
        let signature = method_signature(record, &ident(&record.method_name()));
        quote! {
            #[doc = #doc]
            #signature;
        }
    });

    Ok(quote! {
        #docs

        #support

        #[doc = #trait_doc]
        pub trait #trait_name {
            #(#methods)*
        }
    })
}

/// `fn name(&mut self, ...) -> T` over the record's declared parameters.
pub fn method_signature(record: &FunctionRecord, name: &Ident) -> TokenStream {
    let params = record.declared_args.iter().map(|param| {
        let name = ident(&param.name);
        let ty = param_type(&param.ty);
        quote! { #name: #ty }
    });
    let output = return_type(&record.return_type).map(|ty| quote!(-> #ty));

    quote! {
        fn #name(&mut self, #(#params),*) #output
    }
}

/// Argument names of the declared parameters, for forwarding calls.
pub fn forward_args(record: &FunctionRecord) -> Vec<Ident> {
    record.declared_args.iter().map(|param| ident(&param.name)).collect()
}

/// The C declaration as written in the signature file.
pub fn declaration(record: &FunctionRecord) -> String {
    let params: Vec<_> = record
        .declared_args
        .iter()
        .map(|param| format!("{} {}", param.ty, param.name))
        .collect();
    format!("{} {}({})", record.return_type, record.name, params.join(", "))
}
