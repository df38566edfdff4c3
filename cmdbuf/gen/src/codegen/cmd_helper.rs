//! Command helper generation.
//!
//! One writer per wire command. A writer reserves space in the command
//! buffer, calls `init`, and for immediate commands copies the data that
//! follows the struct.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use crate::codegen::EmitContext;
use crate::codegen::format::{ParamSource, data_count_expr, data_type, init_params, struct_ident};
use crate::errors::EmitError;
use crate::naming::ident;
use crate::wire::{PointerSizing, WireCommand};

/// One parameter of a helper writer.
#[derive(Debug, Clone)]
pub struct HelperParam {
    pub name: Ident,
    pub ty: TokenStream,
}

/// Parameters of a writer: the `init` parameters without the runtime
/// `count`, followed by the immediate data slice if any.
pub fn helper_params(command: &WireCommand<'_>) -> Vec<HelperParam> {
    let mut params: Vec<_> = init_params(command)
        .into_iter()
        .filter(|p| p.source != ParamSource::Count)
        .map(|p| HelperParam {
            name: p.name,
            ty: p.ty,
        })
        .collect();

    if let Some((arg, _)) = command.immediate_arg() {
        let elem = data_type(command).unwrap_or_else(|| quote!(u8));
        params.push(HelperParam {
            name: ident(&arg.param.name),
            ty: quote!(&[#elem]),
        });
    }
    params
}

/// Generates the command helper artifact.
pub fn generate_cmd_helper(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let helper = ctx.protocol_type("CmdHelper");
    let docs = ctx
        .docs("Command buffer writers")
        .item(format!("{} writers", ctx.commands.len()))
        .build();
    let support = ctx.support_use();

    let writers = ctx.commands.iter().map(writer);

    Ok(quote! {
        #docs

        #support

        impl #helper {
            #(#writers)*
        }
    })
}

fn writer(command: &WireCommand<'_>) -> TokenStream {
    let name = ident(&command.snake_name());
    let cmd_type = struct_ident(command);
    let params = helper_params(command);
    let decls = params.iter().map(|p| {
        let name = &p.name;
        let ty = &p.ty;
        quote! { #name: #ty }
    });
    let init_args = init_params(command).into_iter().map(|p| p.name);

    let body = match command.immediate_arg() {
        None => quote! {
            if let Some(cmd) = self.get_cmd_space::<#cmd_type>() {
                cmd.init(#(#init_args),*);
            }
        },
        Some((arg, sizing)) => {
            let data = ident(&arg.param.name);
            let count_binding = match sizing {
                PointerSizing::Runtime { .. } | PointerSizing::Unsized => {
                    quote! { let count = #data.len() as u32; }
                }
                _ => quote! {},
            };
            let count = data_count_expr(command, |index| match index {
                Some(index) => {
                    let arg = ident(&command.args[index].param.name);
                    quote!(#arg)
                }
                None => quote!(count),
            });
            quote! {
                #count_binding
                let size = #cmd_type::compute_data_size(#count);
                if let Some((cmd, data)) = self.get_immediate_cmd_space::<#cmd_type>(size) {
                    cmd.init(#(#init_args),*);
                    copy_immediate_data(data, #data);
                }
            }
        }
    };

    quote! {
        #[allow(clippy::too_many_arguments)]
        pub fn #name(&mut self, #(#decls),*) {
            #body
        }
    }
}
