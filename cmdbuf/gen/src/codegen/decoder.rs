//! Service decoder generation.
//!
//! `execute_generated` dispatches a command id to a per-command handler.
//! A handler views the words as the command struct, decodes every argument,
//! validates named types, reads pointer data from its transfer location and
//! calls the service function named by the record's decoder.
//!
//! Argument errors that the client could have made are reported as GL
//! errors and the command is consumed (`Ok(())`). Malformed commands, such
//! as data running past the buffer, fail with a `DecodeError`.

use cmdbuf_define::StrategyKind;
use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::codegen::EmitContext;
use crate::codegen::format::{decode_word, struct_ident};
use crate::codegen::types::rust_type;
use crate::errors::EmitError;
use crate::naming::ident;
use crate::wire::{ArgLayout, PointerSizing, WireArg, WireCommand, WireKind};

/// Name of the handler for `command`.
pub fn handler_ident(command: &WireCommand<'_>) -> Ident {
    format_ident!("handle_{}", command.snake_name())
}

/// Generates the service decoder artifact.
pub fn generate_decoder(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let decoder = ctx.protocol_type("Decoder");
    let gated = ctx
        .commands
        .iter()
        .filter(|c| feature_flag(c).is_some())
        .count();

    let docs = ctx
        .docs("Service command dispatch")
        .item(format!("{} handlers", ctx.commands.len()))
        .item(format!("{} gated on a feature flag", gated))
        .build();
    let support = ctx.support_use();

    let arms = ctx.commands.iter().map(|command| {
        let variant = struct_ident(command);
        let handler = handler_ident(command);
        quote! { CommandId::#variant => self.#handler(data), }
    });
    let handlers = ctx.commands.iter().map(|command| handler(ctx, command));

    Ok(quote! {
        #docs

        #support

        impl #decoder {
            /// Decodes and runs one generated command.
            pub fn execute_generated(&mut self, id: CommandId, data: &[u32]) -> Result<(), DecodeError> {
                match id {
                    #(#arms)*
                }
            }

            #(#handlers)*
        }
    })
}

fn feature_flag<'a>(command: &WireCommand<'a>) -> Option<&'a str> {
    command
        .record
        .base
        .extension
        .as_ref()
        .and_then(|ext| ext.flag.as_deref())
}

fn handler(ctx: &EmitContext<'_>, command: &WireCommand<'_>) -> TokenStream {
    let record = command.record;
    let name = handler_ident(command);
    let cmd_type = struct_ident(command);
    let gl_name = format!("gl{}", record.name);

    let gate = feature_flag(command).map(|flag| {
        let flag = ident(flag);
        quote! {
            if !self.features().#flag {
                return Err(DecodeError::UnknownCommand);
            }
        }
    });

    let mut decode = Vec::new();
    let mut call_args = Vec::new();
    let mut result = None;

    for arg in &command.args {
        let local = ident(&arg.param.name);
        match arg.layout {
            ArgLayout::Word { kind, .. } => {
                decode.push(decode_scalar(ctx, arg, kind, &gl_name));
                call_args.push(quote!(#local));
            }
            ArgLayout::Split { .. } => {
                decode.push(quote! { let #local = c.#local(); });
                call_args.push(quote!(#local));
            }
            ArgLayout::Immediate { sizing } => {
                if sizing == PointerSizing::Unsized {
                    call_args.push(quote!(immediate_words::<#cmd_type>(data)?));
                    continue;
                }
                let elem = rust_type(&arg.param.ty.base);
                decode.extend(count_check(command, sizing, &gl_name));
                let count = element_count(command, sizing, &cmd_type);
                decode.push(quote! {
                    let #local = immediate_data::<#cmd_type, #elem>(data, #count)?;
                });
                call_args.push(quote!(#local));
            }
            ArgLayout::Shm { id, offset, sizing } => {
                let id = ident(&command.field(id).name);
                let offset = ident(&command.field(offset).name);
                if sizing == PointerSizing::Unsized {
                    call_args.push(quote!(c.#id));
                    call_args.push(quote!(c.#offset));
                    continue;
                }
                let elem = rust_type(&arg.param.ty.base);
                decode.extend(count_check(command, sizing, &gl_name));
                let count = element_count(command, sizing, &cmd_type);
                decode.push(quote! {
                    let #local = self.read_shm::<#elem>(c.#id, c.#offset, #count)?;
                });
                call_args.push(quote!(&#local));
            }
            ArgLayout::Bucket { id, sizing } => {
                let id = ident(&command.field(id).name);
                if sizing == PointerSizing::Unsized {
                    call_args.push(quote!(c.#id));
                    continue;
                }
                let elem = rust_type(&arg.param.ty.base);
                decode.extend(count_check(command, sizing, &gl_name));
                let count = element_count(command, sizing, &cmd_type);
                decode.push(quote! {
                    let #local = self.read_bucket::<#elem>(c.#id)?;
                    let Some(#local) = #local.get(..#count) else {
                        return Err(DecodeError::OutOfBounds);
                    };
                });
                call_args.push(quote!(#local));
            }
            ArgLayout::Result { .. } => {
                let elem = rust_type(&arg.param.ty.base);
                result = Some((local.clone(), elem));
                call_args.push(quote!(&mut #local));
            }
        }
    }

    if command.client_id.is_some() {
        call_args.push(quote!(c.client_id));
    }

    let decoder = ident(&record.decoder_name());
    let call = quote! { self.#decoder(#(#call_args),*) };
    let dispatch = match record.kind() {
        StrategyKind::Custom => call,
        StrategyKind::GenN => quote! {
            if !#call {
                return Err(DecodeError::InvalidArguments);
            }
            Ok(())
        },
        StrategyKind::GetN => {
            let (local, elem) = result.unwrap_or_else(|| (ident("params"), quote!(u32)));
            let len = match selector(command) {
                Some(selector) => quote!(self.num_values(#selector)),
                None => quote!(1),
            };
            quote! {
                let mut #local = vec![#elem::default(); #len];
                #call;
                self.write_sized_result(c.result_shm_id, c.result_shm_offset, &#local)
            }
        }
        StrategyKind::Is => quote! {
            let result = #call;
            self.write_result(c.result_shm_id, c.result_shm_offset, result)
        },
        _ => quote! {
            #call;
            Ok(())
        },
    };

    quote! {
        fn #name(&mut self, data: &[u32]) -> Result<(), DecodeError> {
            #gate
            let c: &#cmd_type = command_from_words(data)?;
            #(#decode)*
            #dispatch
        }
    }
}

/// Decodes a one-word argument and checks it against its validator.
fn decode_scalar(ctx: &EmitContext<'_>, arg: &WireArg<'_>, kind: WireKind, gl_name: &str) -> TokenStream {
    let local = ident(&arg.param.name);
    let arg_name = &arg.param.name;
    let base = &arg.param.ty.base;

    let decoded = if kind == WireKind::Enum {
        let ty = rust_type(base);
        quote! {
            let Some(#local) = #ty::from_wire(c.#local) else {
                self.set_invalid_enum(#gl_name, #arg_name, c.#local);
                return Ok(());
            };
        }
    } else {
        let value = decode_word(quote!(c.#local), kind, base);
        quote! { let #local = #value; }
    };

    let validation = arg
        .param
        .ty
        .named
        .and_then(|type_id| ctx.validators.get(type_id))
        .map(|spec| {
            let field = ident(&spec.field);
            let report = if base == "GLenum" || kind == WireKind::Enum {
                quote! { self.set_invalid_enum(#gl_name, #arg_name, c.#local); }
            } else {
                let message = format!("{} is invalid", arg_name);
                quote! { self.set_gl_error(GL_INVALID_VALUE, #gl_name, #message); }
            };
            quote! {
                if !self.validators.#field.is_valid(#local) {
                    #report
                    return Ok(());
                }
            }
        });

    quote! {
        #decoded
        #validation
    }
}

/// Rejects negative counts and runtime counts above the maximum.
fn count_check(command: &WireCommand<'_>, sizing: PointerSizing, gl_name: &str) -> Option<TokenStream> {
    match sizing {
        PointerSizing::Counted { arg, .. } => {
            let n = ident(&command.args[arg].param.name);
            let message = format!("{} < 0", command.args[arg].param.name);
            Some(quote! {
                if #n < 0 {
                    self.set_gl_error(GL_INVALID_VALUE, #gl_name, #message);
                    return Ok(());
                }
            })
        }
        PointerSizing::Runtime { .. } => {
            let cmd_type = struct_ident(command);
            Some(quote! {
                if c.count > #cmd_type::MAX_DATA_UNITS as u32 {
                    return Err(DecodeError::OutOfBounds);
                }
            })
        }
        PointerSizing::Fixed(_) | PointerSizing::Unsized => None,
    }
}

/// Number of elements to read for sized pointer data.
fn element_count(command: &WireCommand<'_>, sizing: PointerSizing, cmd_type: &Ident) -> TokenStream {
    match sizing {
        PointerSizing::Fixed(_) => quote!(#cmd_type::DATA_UNITS),
        PointerSizing::Counted { arg, units } => {
            let n = ident(&command.args[arg].param.name);
            if units == 1 {
                quote!(#n as usize)
            } else {
                let units = Literal::usize_unsuffixed(units as usize);
                quote!(#n as usize * #units)
            }
        }
        PointerSizing::Runtime { .. } | PointerSizing::Unsized => quote!(c.count as usize),
    }
}

/// The argument that decides how many values a getter returns.
fn selector(command: &WireCommand<'_>) -> Option<Ident> {
    command.args.iter().find_map(|arg| match arg.layout {
        ArgLayout::Word { .. } => Some(ident(&arg.param.name)),
        _ => None,
    })
}
