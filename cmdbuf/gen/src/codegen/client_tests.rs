//! Client marshaling test generation.
//!
//! For every record with a generated marshal and client tests enabled, the
//! test calls the client entry and compares the words written to the
//! command buffer with an expected command built through `init`.

use cmdbuf_define::StrategyKind;
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use tracing::warn;

use crate::codegen::EmitContext;
use crate::codegen::format::{ParamSource, init_params, struct_ident};
use crate::codegen::types::rust_type;
use crate::codegen::values::{TEST_COUNT, arg_value, data_len};
use crate::errors::EmitError;
use crate::naming::ident;
use crate::record::FunctionRecord;
use crate::wire::{ArgLayout, WireCommand};

/// Generates the client test artifact.
pub fn generate_client_tests(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    let fixture = format_ident!("{}ImplementationTest", ctx.protocol.name);

    let mut tests = TokenStream::new();
    let mut generated = 0;
    for record in ctx
        .records
        .iter()
        .filter(|r| r.has_generated_marshal() && r.tests.client_test)
    {
        let Some(command) = ctx.commands_for(record).next() else {
            continue;
        };
        match client_test(ctx, record, command, &fixture)? {
            Some(test) => {
                tests.extend(test);
                generated += 1;
            }
            None => warn!("{}: no value for every argument, client test omitted", record.name),
        }
    }

    let docs = ctx
        .docs("Client marshaling tests")
        .item(format!("{} tests", generated))
        .build();
    let support = ctx.support_use();

    Ok(quote! {
        #docs

        #support

        #tests
    })
}

fn client_test(
    ctx: &EmitContext<'_>,
    record: &FunctionRecord,
    command: &WireCommand<'_>,
    fixture: &proc_macro2::Ident,
) -> Result<Option<TokenStream>, EmitError> {
    let mut bindings = Vec::new();
    let mut call_args = Vec::new();
    let mut data = None;

    for (index, arg) in command.args.iter().enumerate() {
        let name = ident(&arg.param.name);
        let elem = rust_type(&arg.param.ty.base);
        match arg.layout {
            ArgLayout::Word { .. } | ArgLayout::Split { .. } => {
                let Some(value) = arg_value(command, index, ctx.registry())? else {
                    return Ok(None);
                };
                bindings.push(quote! { let #name: #elem = #value; });
                call_args.push(quote!(#name));
            }
            ArgLayout::Immediate { sizing } => {
                let len = Literal::usize_unsuffixed(data_len(sizing));
                if arg.param.ty.is_const {
                    bindings.push(quote! {
                        let #name: [#elem; #len] = std::array::from_fn(|i| (i + 1) as #elem);
                    });
                    call_args.push(quote!(&#name));
                } else {
                    bindings.push(quote! { let mut #name: [#elem; #len] = [0; #len]; });
                    call_args.push(quote!(&mut #name));
                }
                data = Some(name);
            }
            ArgLayout::Result { .. } => {
                bindings.push(quote! { let mut #name: [#elem; 1] = [0; 1]; });
                call_args.push(quote!(&mut #name));
            }
            ArgLayout::Shm { .. } | ArgLayout::Bucket { .. } => {
                warn!(
                    "{}: {} transfer of '{}' is not covered by client tests",
                    record.name, command.method, arg.param.name
                );
                return Ok(None);
            }
        }
    }

    let method = if record.has_public_entry() {
        ident(&record.method_name())
    } else {
        format_ident!("marshal_{}", record.method_name())
    };
    let call = match record.kind() {
        StrategyKind::Create => quote! { let client_id = t.gl().#method(#(#call_args),*); },
        _ if !record.return_type.is_void() => quote! { let _ = t.gl().#method(#(#call_args),*); },
        _ => quote! { t.gl().#method(#(#call_args),*); },
    };

    let cmd_type = struct_ident(command);
    let init_args = init_params(command).into_iter().map(|p| match p.source {
        ParamSource::ResultId => quote!(t.result_shm_id()),
        ParamSource::ResultOffset => quote!(t.result_shm_offset()),
        ParamSource::Count => {
            let count = Literal::u32_unsuffixed(TEST_COUNT);
            quote!(#count)
        }
        _ => {
            let name = p.name;
            quote!(#name)
        }
    });
    let words = match &data {
        Some(data) => quote!(immediate_command_words(&expected, &#data)),
        None => quote!(command_words(&expected)),
    };

    let test_name = ident(&record.method_name());
    Ok(Some(quote! {
        #[test]
        fn #test_name() {
            let mut t = #fixture::new();
            #(#bindings)*
            #call
            let mut expected = #cmd_type::default();
            expected.init(#(#init_args),*);
            assert_eq!(t.take_commands(), #words);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{compact_code, format_generated_code, make_protocol, plan_fixture};
    use crate::wire::plan_commands;
    use cmdbuf_define::{FunctionOverride, OverrideTable, TransferMethod};

    fn tests_code(protocol: &cmdbuf_define::ProtocolDefinition) -> String {
        let (records, validators) = plan_fixture(protocol);
        let commands = plan_commands(&records, protocol.command_base).unwrap();
        let ctx = EmitContext::new(protocol, &records, &validators, &commands).unwrap();
        format_generated_code(&generate_client_tests(&ctx).unwrap()).expect("Failed to format code")
    }

    #[test]
    fn immediate_data_is_compared() {
        let code = tests_code(&make_protocol());

        assert!(code.contains("fn delete_textures()"));
        assert!(code.contains("let mut t = TestImplementationTest::new();"));
        assert!(code.contains("std::array::from_fn(|i| (i + 1) as GLuint)"));
        assert!(code.contains("t.gl().delete_textures(n, &textures);"));
        // Arguments inside assert_eq! are printed token by token.
        assert!(compact_code(&code).contains("immediate_command_words(&expected,&textures)"));
    }

    #[test]
    fn fixed_put_data_has_full_length() {
        let code = tests_code(&make_protocol());
        assert!(code.contains("let mailbox: [GLbyte; 16]"));
    }

    #[test]
    fn getter_results_use_fixture_locations() {
        let code = tests_code(&make_protocol());

        assert!(code.contains("let mut params: [GLint; 1] = [0; 1];"));
        assert!(code.contains("expected.init(pname, t.result_shm_id(), t.result_shm_offset());"));
    }

    #[test]
    fn create_uses_returned_client_id() {
        let code = tests_code(&make_protocol());

        assert!(code.contains("let client_id = t.gl().create_texture(use_buffer, buffer_usage);"));
        assert!(code.contains("expected.init(use_buffer, buffer_usage, client_id);"));
    }

    #[test]
    fn scalar_commands_compare_words() {
        let code = tests_code(&make_protocol());
        assert!(code.contains("t.gl().finish();"));
        assert!(compact_code(&code).contains("command_words(&expected))"));
    }

    #[test]
    fn shm_pointers_are_omitted() {
        let mut protocol = make_protocol();
        protocol.overrides = OverrideTable::new(vec![
            FunctionOverride::new("DeleteTextures").transfer([TransferMethod::Shm]),
            FunctionOverride::new("GetError").decoder("get_gl_error"),
            FunctionOverride::new("CreateTexture")
                .strategy(cmdbuf_define::StrategyKind::Create)
                .resource("Textures"),
            FunctionOverride::new("ProduceTextureDirect")
                .strategy(cmdbuf_define::StrategyKind::Put)
                .count(16),
        ])
        .unwrap();

        let code = tests_code(&protocol);
        assert!(!code.contains("fn delete_textures()"));
        assert!(code.contains("fn finish()"));
    }

    #[test]
    fn disabled_client_tests_are_skipped() {
        let mut protocol = make_protocol();
        protocol.overrides = OverrideTable::new(vec![
            FunctionOverride::new("Finish").no_client_test(),
            FunctionOverride::new("GetError").decoder("get_gl_error"),
            FunctionOverride::new("CreateTexture")
                .strategy(cmdbuf_define::StrategyKind::Create)
                .resource("Textures"),
            FunctionOverride::new("ProduceTextureDirect")
                .strategy(cmdbuf_define::StrategyKind::Put)
                .count(16),
        ])
        .unwrap();

        let code = tests_code(&protocol);
        assert!(!code.contains("fn finish()"));
    }
}
