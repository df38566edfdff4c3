//! Client implementation header generation.
//!
//! Implements the interface trait on the client implementation. Each entry
//! forwards to `marshal_<name>` (generated or hand-written); NoCommand
//! entries forward to a hand-written `<name>_direct`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::codegen::EmitContext;
use crate::codegen::interface::{forward_args, method_signature};
use crate::errors::EmitError;
use crate::naming::ident;

/// Generates the client implementation header artifact.
pub fn generate_implementation_header(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let trait_name = ctx.protocol_type("Interface");
    let implementation = ctx.protocol_type("Implementation");
    let entries: Vec<_> = ctx.records.iter().filter(|r| r.has_public_entry()).collect();
    let direct = entries.iter().filter(|r| !r.is_id_bearing()).count();

    let docs = ctx
        .docs("Client interface implementation")
        .item(format!("{} marshaled entries", entries.len() - direct))
        .item(format!("{} direct entries", direct))
        .build();
    let support = ctx.support_use();

    let methods = entries.iter().map(|record| {
        let method = record.method_name();
        let signature = method_signature(record, &ident(&method));
        let target = if record.is_id_bearing() {
            format_ident!("marshal_{}", method)
        } else {
            format_ident!("{}_direct", method)
        };
        let args = forward_args(record);
        quote! {
            #signature {
                self.#target(#(#args),*)
            }
        }
    });

    Ok(quote! {
        #docs

        #support

        impl #trait_name for #implementation {
            #(#methods)*
        }
    })
}
