//! Client marshaling generation.
//!
//! Every ID-bearing record with a client entry and a generated marshal gets
//! a `marshal_<name>` function on the client implementation. It checks
//! counts and slice lengths, allocates or frees ids, moves pointer data to
//! the preferred transfer location and writes the command through the
//! helper. GETn and Is wait for the service and read the result back.
//!
//! Every location the helper needs is bound to a local named after the
//! helper parameter, so the helper call is a plain list of names.

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use cmdbuf_define::StrategyKind;

use crate::codegen::EmitContext;
use crate::codegen::cmd_helper::helper_params;
use crate::codegen::interface::method_signature;
use crate::codegen::types::rust_type;
use crate::errors::EmitError;
use crate::naming::ident;
use crate::record::FunctionRecord;
use crate::wire::{ArgLayout, PointerSizing, WireCommand};

/// Generates the client implementation body artifact.
pub fn generate_implementation_body(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let implementation = ctx.protocol_type("Implementation");

    let mut functions = Vec::new();
    for record in ctx.records.iter().filter(|r| r.has_generated_marshal()) {
        // Planning produced a command for every transfer method; the first
        // is the preferred one.
        if let Some(command) = ctx.commands_for(record).next() {
            functions.push(marshal_fn(ctx, record, command));
        }
    }

    let docs = ctx
        .docs("Client marshaling")
        .item(format!("{} generated marshaling functions", functions.len()))
        .build();
    let support = ctx.support_use();

    Ok(quote! {
        #docs

        #support

        impl #implementation {
            #(#functions)*
        }
    })
}

fn marshal_fn(ctx: &EmitContext<'_>, record: &FunctionRecord, command: &WireCommand<'_>) -> TokenStream {
    let name = format_ident!("marshal_{}", record.method_name());
    let signature = method_signature(record, &name);
    let vis = if record.base.internal {
        quote!(pub(crate))
    } else {
        quote!(pub)
    };

    let gl_name = format!("gl{}", record.name);
    let trace_label = format!("{}::{}", ctx.protocol_type("Implementation"), record.name);
    let trace_level = Literal::u8_unsuffixed(record.base.trace_level.unwrap_or(3));
    let bail = if record.return_type.is_void() {
        quote!(return;)
    } else {
        quote!(return Default::default();)
    };

    let checks = count_checks(command, &gl_name, &bail);
    let ids = id_handling(record, command);
    let transfers = transfers(command, &gl_name, &bail);

    let helper = ident(&command.snake_name());
    let helper_args = helper_params(command).into_iter().map(|p| p.name);
    let write = quote! {
        self.helper().#helper(#(#helper_args),*);
    };

    let body = match record.kind() {
        StrategyKind::GetN => {
            let result = command.args.last().map(|arg| ident(&arg.param.name));
            let elem = command
                .args
                .last()
                .map(|arg| rust_type(&arg.param.ty.base))
                .unwrap_or_else(|| quote!(u32));
            quote! {
                self.reset_sized_result::<#elem>();
                let result_shm_id = self.result_shm_id();
                let result_shm_offset = self.result_shm_offset();
                #write
                self.wait_for_cmd();
                self.copy_sized_result(#result);
            }
        }
        StrategyKind::Is => {
            let ty = rust_type(&record.return_type.base);
            quote! {
                let result_shm_id = self.result_shm_id();
                let result_shm_offset = self.result_shm_offset();
                #write
                self.wait_for_cmd();
                self.read_result::<#ty>()
            }
        }
        StrategyKind::Create => quote! {
            #write
            client_id
        },
        _ => write,
    };

    quote! {
        #[allow(clippy::too_many_arguments)]
        #vis #signature {
            let _trace = TraceEvent::new(#trace_level, #trace_label);
            #(#checks)*
            #ids
            #(#transfers)*
            #body
        }
    }
}

/// Count and length checks for pointer data, in argument order.
fn count_checks(command: &WireCommand<'_>, gl_name: &str, bail: &TokenStream) -> Vec<TokenStream> {
    let mut checks = Vec::new();
    for arg in &command.args {
        let sizing = match arg.layout {
            ArgLayout::Immediate { sizing }
            | ArgLayout::Shm { sizing, .. }
            | ArgLayout::Bucket { sizing, .. } => sizing,
            _ => continue,
        };
        let data = ident(&arg.param.name);
        let getter = if arg.param.ty.is_const {
            quote!(get)
        } else {
            quote!(get_mut)
        };
        let too_short = format!("{} is too short", arg.param.name);

        match sizing {
            PointerSizing::Counted { arg: count, units } => {
                let n = ident(&command.args[count].param.name);
                let negative = format!("{} < 0", command.args[count].param.name);
                let len = if units == 1 {
                    quote!(#n as usize)
                } else {
                    let units = Literal::usize_unsuffixed(units as usize);
                    quote!(#n as usize * #units)
                };
                checks.push(quote! {
                    if #n < 0 {
                        self.set_gl_error(GL_INVALID_VALUE, #gl_name, #negative);
                        #bail
                    }
                    let Some(#data) = #data.#getter(..#len) else {
                        self.set_gl_error(GL_INVALID_VALUE, #gl_name, #too_short);
                        #bail
                    };
                });
            }
            PointerSizing::Fixed(units) => {
                let units = Literal::usize_unsuffixed(units as usize);
                checks.push(quote! {
                    let Some(#data) = #data.#getter(..#units) else {
                        self.set_gl_error(GL_INVALID_VALUE, #gl_name, #too_short);
                        #bail
                    };
                });
            }
            PointerSizing::Runtime { max } => {
                let max = Literal::usize_unsuffixed(max as usize);
                let too_long = format!("{} is too long", arg.param.name);
                checks.push(quote! {
                    if #data.len() > #max {
                        self.set_gl_error(GL_INVALID_VALUE, #gl_name, #too_long);
                        #bail
                    }
                });
            }
            PointerSizing::Unsized => {}
        }
    }
    checks
}

/// Client-side id bookkeeping for GENn, DELn and Create.
fn id_handling(record: &FunctionRecord, command: &WireCommand<'_>) -> TokenStream {
    let Some(resource) = &record.resource else {
        return quote! {};
    };
    let namespace = format_ident!("{}", resource);
    let ids = command
        .args
        .iter()
        .find(|arg| arg.param.ty.is_pointer())
        .map(|arg| ident(&arg.param.name));
    let not_shared = record.strategy.not_shared();

    match record.kind() {
        StrategyKind::GenN if not_shared => quote! {
            self.id_allocator(IdNamespace::#namespace).allocate_ids(#ids);
        },
        StrategyKind::GenN => quote! {
            self.id_handler(IdNamespace::#namespace).make_ids(0, #ids);
        },
        StrategyKind::DelN => quote! {
            self.id_handler(IdNamespace::#namespace).free_ids(#ids);
        },
        StrategyKind::Create if not_shared => quote! {
            let client_id = self.id_allocator(IdNamespace::#namespace).allocate_id();
        },
        StrategyKind::Create => quote! {
            let client_id = self.id_handler(IdNamespace::#namespace).make_id();
        },
        _ => quote! {},
    }
}

/// Moves pointer data to shared memory or a bucket, binding the locations
/// the helper expects.
fn transfers(command: &WireCommand<'_>, gl_name: &str, bail: &TokenStream) -> Vec<TokenStream> {
    let mut out = Vec::new();
    for arg in &command.args {
        let data = ident(&arg.param.name);
        match arg.layout {
            ArgLayout::Shm { id, offset, .. } => {
                let id = ident(&command.field(id).name);
                let offset = ident(&command.field(offset).name);
                out.push(quote! {
                    let Some((#id, #offset)) = self.alloc_transfer(#data) else {
                        self.set_gl_error(GL_OUT_OF_MEMORY, #gl_name, "out of transfer memory");
                        #bail
                    };
                });
            }
            ArgLayout::Bucket { id, .. } => {
                let id = ident(&command.field(id).name);
                out.push(quote! {
                    let #id = self.stage_bucket(#data);
                });
            }
            _ => {}
        }
    }
    out
}
