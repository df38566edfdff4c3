//! Command identifier generation.
//!
//! Produces the `CommandId` enum shared by the client and the service. Ids
//! are contiguous from the protocol's command base, in declaration order.

use std::collections::BTreeMap;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::codegen::EmitContext;
use crate::errors::EmitError;
use crate::wire::WireCommand;

/// Generates the command identifier artifact.
///
/// ## Errors
///
/// Returns `EmitError::Collision` if two commands share a name or an id.
pub fn generate_command_ids(ctx: &EmitContext<'_>) -> Result<TokenStream, EmitError> {
    check_unique(ctx.commands)?;

    let base = Literal::u32_unsuffixed(ctx.protocol.command_base);
    let count = Literal::usize_unsuffixed(ctx.commands.len());
    let docs = ctx
        .docs("Command identifiers")
        .item(format!("{} commands", ctx.commands.len()))
        .item(format!("first id {}", ctx.protocol.command_base))
        .build();

    let variants: Vec<_> = ctx
        .commands
        .iter()
        .map(|command| format_ident!("{}", command.name))
        .collect();
    let ids = ctx
        .commands
        .iter()
        .map(|command| Literal::u32_unsuffixed(command.id));
    let names = ctx.commands.iter().map(|command| command.name.as_str());

    let declarations = variants.iter().zip(ids.clone()).map(|(variant, id)| {
        quote! { #variant = #id, }
    });
    let from_arms = variants.iter().zip(ids).map(|(variant, id)| {
        quote! { #id => Some(Self::#variant), }
    });
    let name_arms = variants.iter().zip(names).map(|(variant, name)| {
        quote! { Self::#variant => #name, }
    });

    // A fieldless enum with no variants cannot carry a repr.
    let repr = if ctx.commands.is_empty() {
        quote! {}
    } else {
        quote! { #[repr(u32)] }
    };

    Ok(quote! {
        #docs

        /// Id of the first generated command.
        pub const FIRST_COMMAND_ID: u32 = #base;

        /// Number of generated commands.
        pub const NUM_COMMANDS: usize = #count;

        /// Identifies a command in the command buffer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #repr
        pub enum CommandId {
            #(#declarations)*
        }

        impl CommandId {
            /// Every command, in id order.
            pub const ALL: [CommandId; #count] = [#(Self::#variants),*];

            /// Looks up a command by its wire id.
            pub fn from_u32(id: u32) -> Option<Self> {
                match id {
                    #(#from_arms)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    })
}

fn check_unique(commands: &[WireCommand<'_>]) -> Result<(), EmitError> {
    let mut by_id: BTreeMap<u32, &str> = BTreeMap::new();
    let mut by_name: BTreeMap<&str, u32> = BTreeMap::new();

    for command in commands {
        if let Some(previous) = by_id.insert(command.id, &command.name) {
            return Err(EmitError::Collision(format!(
                "id {} is assigned to both {} and {}",
                command.id, previous, command.name
            )));
        }
        if by_name.insert(&command.name, command.id).is_some() {
            return Err(EmitError::Collision(format!(
                "command {} is declared twice",
                command.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::EmitContext;
    use crate::test_utils::{format_generated_code, make_protocol, plan_fixture};
    use crate::validators::ValidatorSet;
    use crate::wire::plan_commands;

    #[test]
    fn ids_start_at_command_base() {
        let protocol = make_protocol();
        let (records, validators) = plan_fixture(&protocol);
        let commands = plan_commands(&records, protocol.command_base).unwrap();
        let ctx = EmitContext::new(&protocol, &records, &validators, &commands).unwrap();

        let code = format_generated_code(&generate_command_ids(&ctx).unwrap())
            .expect("Failed to format code");

        assert!(code.contains("pub const FIRST_COMMAND_ID: u32 = 256;"));
        assert!(code.contains(&format!("pub const NUM_COMMANDS: usize = {};", commands.len())));
        assert!(code.contains("#[repr(u32)]"));
        assert!(code.contains("Finish = 256,"));
        assert!(code.contains("256 => Some(Self::Finish)"));
        assert!(code.contains("Self::Finish => \"Finish\""));
    }

    #[test]
    fn empty_protocol_has_no_repr() {
        let protocol = make_protocol();
        let validators = ValidatorSet::default();
        let ctx = EmitContext::new(&protocol, &[], &validators, &[]).unwrap();

        let code = format_generated_code(&generate_command_ids(&ctx).unwrap())
            .expect("Failed to format code");

        assert!(code.contains("pub const NUM_COMMANDS: usize = 0;"));
        assert!(!code.contains("repr"));
    }

    #[test]
    fn duplicate_ids_collide() {
        let protocol = make_protocol();
        let (records, _) = plan_fixture(&protocol);
        let mut commands = plan_commands(&records, protocol.command_base).unwrap();
        commands[1].id = commands[0].id;

        let err = check_unique(&commands).unwrap_err();
        assert!(matches!(err, EmitError::Collision(message) if message.contains("256")));
    }

    #[test]
    fn duplicate_names_collide() {
        let protocol = make_protocol();
        let (records, _) = plan_fixture(&protocol);
        let mut commands = plan_commands(&records, protocol.command_base).unwrap();
        commands[1].name = commands[0].name.clone();

        assert!(matches!(
            check_unique(&commands),
            Err(EmitError::Collision(_))
        ));
    }
}
