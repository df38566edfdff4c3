//! Wire-format struct generation.
//!
//! Each wire command becomes a `#[repr(C)]` struct whose first field is the
//! command header, followed by one 32-bit field per planned wire field.
//! Compile-time assertions pin the size and every offset so a layout change
//! fails to build on both sides of the protocol.
//!
//! The [`init_params`] model is shared with the helper, test and decoder
//! emitters: it lists the values `init` takes, in order, and where each
//! one comes from.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::codegen::EmitContext;
use crate::codegen::types::{field_type, rust_type};
use crate::errors::EmitError;
use crate::naming::ident;
use crate::wire::{ArgLayout, FieldType, PointerSizing, WireCommand, WireKind};

/// Where an `init` parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Scalar argument, by index into the command's args.
    Arg(usize),
    ShmId(usize),
    ShmOffset(usize),
    BucketId(usize),
    ResultId,
    ResultOffset,
    /// Element count of runtime-sized immediate data.
    Count,
    ClientId,
}

/// One parameter of a command's `init`.
#[derive(Debug, Clone)]
pub struct InitParam {
    pub name: Ident,
    pub ty: TokenStream,
    pub source: ParamSource,
}

/// Parameters of `init`, in field order.
pub fn init_params(command: &WireCommand<'_>) -> Vec<InitParam> {
    let u32_param = |name: &str, source| InitParam {
        name: ident(name),
        ty: quote!(u32),
        source,
    };

    let mut params = Vec::new();
    for (index, arg) in command.args.iter().enumerate() {
        match arg.layout {
            ArgLayout::Word { .. } | ArgLayout::Split { .. } => params.push(InitParam {
                name: ident(&arg.param.name),
                ty: rust_type(&arg.param.ty.base),
                source: ParamSource::Arg(index),
            }),
            ArgLayout::Shm { id, offset, .. } => {
                params.push(u32_param(&command.field(id).name, ParamSource::ShmId(index)));
                params.push(u32_param(
                    &command.field(offset).name,
                    ParamSource::ShmOffset(index),
                ));
            }
            ArgLayout::Bucket { id, .. } => {
                params.push(u32_param(&command.field(id).name, ParamSource::BucketId(index)));
            }
            ArgLayout::Result { id, offset } => {
                params.push(u32_param(&command.field(id).name, ParamSource::ResultId));
                params.push(u32_param(&command.field(offset).name, ParamSource::ResultOffset));
            }
            ArgLayout::Immediate { .. } => {}
        }
    }

    if command.count.is_some() {
        params.push(u32_param("count", ParamSource::Count));
    }
    if let Some(result) = command.result {
        params.push(u32_param(&command.field(result.id).name, ParamSource::ResultId));
        params.push(u32_param(&command.field(result.offset).name, ParamSource::ResultOffset));
    }
    if let Some(client_id) = command.client_id {
        params.push(u32_param(&command.field(client_id).name, ParamSource::ClientId));
    }
    if let Some((_, PointerSizing::Unsized)) = command.immediate_arg() {
        params.push(u32_param("count", ParamSource::Count));
    }
    params
}

pub fn struct_ident(command: &WireCommand<'_>) -> Ident {
    format_ident!("{}", command.name)
}

pub fn field_ident(command: &WireCommand<'_>, index: usize) -> Ident {
    ident(&command.field(index).name)
}

/// Element count expression passed to `compute_data_size`, if the command
/// carries immediate data with a variable size.
///
/// `value` renders the init parameter for an argument index or `None` for
/// the `count` parameter.
pub fn data_count_expr(
    command: &WireCommand<'_>,
    value: impl Fn(Option<usize>) -> TokenStream,
) -> Option<TokenStream> {
    let (_, sizing) = command.immediate_arg()?;
    match sizing {
        PointerSizing::Fixed(_) => None,
        PointerSizing::Counted { arg, units } => {
            let n = value(Some(arg));
            Some(if units == 1 {
                quote!(#n as u32)
            } else {
                let units = Literal::u32_unsuffixed(units);
                quote!(#n as u32 * #units)
            })
        }
        PointerSizing::Runtime { .. } | PointerSizing::Unsized => Some(value(None)),
    }
}

/// Element type of the command's immediate data.
pub fn data_type(command: &WireCommand<'_>) -> Option<TokenStream> {
    command
        .immediate_arg()
        .map(|(arg, _)| rust_type(&arg.param.ty.base))
}

/// Generates the wire-format artifact.
pub fn generate_format(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let immediate = ctx.commands.iter().filter(|c| c.is_immediate()).count();
    let docs = ctx
        .docs("Wire-format command structs")
        .item(format!("{} commands", ctx.commands.len()))
        .item(format!("{} with immediate data", immediate))
        .build();
    let support = ctx.support_use();

    let structs: TokenStream = ctx.commands.iter().map(generate_command_struct).collect();

    Ok(quote! {
        #docs

        #support

        #structs
    })
}

fn generate_command_struct(command: &WireCommand<'_>) -> TokenStream {
    let name = struct_ident(command);
    let id_variant = &name;
    let record = command.record;

    let doc = format!(
        " `{}` via {} transfer.",
        record.name, command.method
    );

    let fields = command.fields.iter().map(|field| {
        let field_name = ident(&field.name);
        let ty = field_type(field.ty);
        quote! { pub #field_name: #ty, }
    });

    let arg_flags = if command.is_immediate() {
        quote!(ArgFlags::AtLeastN)
    } else {
        quote!(ArgFlags::Fixed)
    };
    let trace_level = Literal::u8_unsuffixed(record.base.trace_level.unwrap_or(3));

    let units_const = match record.strategy.put_sizing() {
        Some(sizing) => match sizing.count {
            Some(count) if sizing.use_count_func => {
                let count = Literal::usize_unsuffixed(count as usize);
                quote! { pub const MAX_DATA_UNITS: usize = #count; }
            }
            Some(count) => {
                let count = Literal::usize_unsuffixed(count as usize);
                quote! { pub const DATA_UNITS: usize = #count; }
            }
            None => quote! {},
        },
        None => quote! {},
    };

    let sizing_fns = generate_sizing_fns(command);

    let params = init_params(command);
    let param_decls = params.iter().map(|p| {
        let name = &p.name;
        let ty = &p.ty;
        quote! { #name: #ty }
    });

    let header_arg = data_count_expr(command, |index| match index {
        Some(index) => {
            let name = ident(&command.args[index].param.name);
            quote!(#name)
        }
        None => quote!(count),
    });
    let set_header_call = match &header_arg {
        Some(arg) => quote! { self.set_header(#arg); },
        None => quote! { self.set_header(); },
    };

    let assignments = generate_assignments(command);
    let accessors = generate_accessors(command);
    let assertions = generate_layout_assertions(command);

    quote! {
        #[doc = #doc]
        #[repr(C)]
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct #name {
            pub header: CommandHeader,
            #(#fields)*
        }

        impl Command for #name {
            const ID: CommandId = CommandId::#id_variant;
            const ARG_FLAGS: ArgFlags = #arg_flags;
            const CMD_FLAGS: u8 = cmd_flags(#trace_level);
        }

        impl #name {
            #units_const

            #sizing_fns

            #[allow(clippy::too_many_arguments)]
            pub fn init(&mut self, #(#param_decls),*) {
                #set_header_call
                #(#assignments)*
            }

            #accessors
        }

        #assertions
    }
}

fn generate_sizing_fns(command: &WireCommand<'_>) -> TokenStream {
    let Some((_, sizing)) = command.immediate_arg() else {
        return quote! {
            pub fn set_header(&mut self) {
                self.header.set_cmd::<Self>();
            }
        };
    };
    let data = data_type(command).unwrap_or_else(|| quote!(u8));

    match sizing {
        PointerSizing::Fixed(_) => quote! {
            pub fn compute_data_size() -> u32 {
                (size_of::<#data>() * Self::DATA_UNITS) as u32
            }

            pub fn compute_size() -> u32 {
                size_of::<Self>() as u32 + Self::compute_data_size()
            }

            pub fn set_header(&mut self) {
                self.header.set_cmd_by_total_size::<Self>(Self::compute_size());
            }
        },
        _ => quote! {
            pub fn compute_data_size(count: u32) -> u32 {
                size_of::<#data>() as u32 * count
            }

            pub fn compute_size(count: u32) -> u32 {
                size_of::<Self>() as u32 + Self::compute_data_size(count)
            }

            pub fn set_header(&mut self, count: u32) {
                self.header.set_cmd_by_total_size::<Self>(Self::compute_size(count));
            }
        },
    }
}

fn generate_assignments(command: &WireCommand<'_>) -> Vec<TokenStream> {
    let mut out = Vec::new();
    for arg in &command.args {
        let value = ident(&arg.param.name);
        match arg.layout {
            ArgLayout::Word { field, kind } => {
                let f = field_ident(command, field);
                let stored = encode_word(quote!(#value), kind, command.field(field).ty);
                out.push(quote! { self.#f = #stored; });
            }
            ArgLayout::Split { low, high } => {
                let lo = field_ident(command, low);
                let hi = field_ident(command, high);
                out.push(quote! {
                    self.#lo = #value as u64 as u32;
                    self.#hi = ((#value as u64) >> 32) as u32;
                });
            }
            ArgLayout::Shm { id, offset, .. } | ArgLayout::Result { id, offset } => {
                let id = field_ident(command, id);
                let offset = field_ident(command, offset);
                out.push(quote! {
                    self.#id = #id;
                    self.#offset = #offset;
                });
            }
            ArgLayout::Bucket { id, .. } => {
                let id = field_ident(command, id);
                out.push(quote! { self.#id = #id; });
            }
            ArgLayout::Immediate { .. } => {}
        }
    }

    let extras = command
        .count
        .into_iter()
        .chain(command.result.iter().flat_map(|r| [r.id, r.offset]))
        .chain(command.client_id);
    for field in extras {
        let f = field_ident(command, field);
        out.push(quote! { self.#f = #f; });
    }
    out
}

fn generate_accessors(command: &WireCommand<'_>) -> TokenStream {
    command
        .args
        .iter()
        .filter_map(|arg| match arg.layout {
            ArgLayout::Split { low, high } => {
                let name = ident(&arg.param.name);
                let ty = rust_type(&arg.param.ty.base);
                let lo = field_ident(command, low);
                let hi = field_ident(command, high);
                Some(quote! {
                    pub fn #name(&self) -> #ty {
                        (((self.#hi as u64) << 32) | self.#lo as u64) as #ty
                    }
                })
            }
            _ => None,
        })
        .collect()
}

fn generate_layout_assertions(command: &WireCommand<'_>) -> TokenStream {
    let name = struct_ident(command);
    let size = Literal::usize_unsuffixed(command.fixed_size());
    let offsets = command.fields.iter().enumerate().map(|(index, field)| {
        let f = ident(&field.name);
        let offset = Literal::usize_unsuffixed(4 * (index + 1));
        quote! {
            const _: () = assert!(std::mem::offset_of!(#name, #f) == #offset);
        }
    });

    quote! {
        const _: () = assert!(size_of::<#name>() == #size);
        const _: () = assert!(std::mem::offset_of!(#name, header) == 0);
        #(#offsets)*
    }
}

/// Converts a stored field back to its argument type.
///
/// `Enum` fields need a fallible `from_wire` and are handled by the caller.
pub fn decode_word(source: TokenStream, kind: WireKind, base: &str) -> TokenStream {
    let ty = rust_type(base);
    match kind {
        WireKind::Bool => quote!(#source != 0),
        _ => quote!(#source as #ty),
    }
}

/// Stored form of an argument value, as `init` writes it.
pub fn encode_word(value: TokenStream, kind: WireKind, field: FieldType) -> TokenStream {
    let ty = field_type(field);
    match kind {
        WireKind::Enum => quote!(#value.to_wire()),
        _ => quote!(#value as #ty),
    }
}
