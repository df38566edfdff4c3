//! Record building: signature + override + registry -> [`FunctionRecord`].

use cmdbuf_define::{
    FunctionOverride, FunctionSignature, NamedTypeRegistry, OverrideTable, StrategyKind,
    TransferMethod,
};
use tracing::{debug, trace};

use crate::errors::MergeError;
use crate::inference::{describe_shape, infer_strategy};
use crate::parser::parse_param_list;
use crate::record::{BaseFlags, FunctionRecord, PutSizing, Strategy, TestFlags};

/// Builds one record per signature, in signature order.
///
/// ## Errors
///
/// Returns every `MergeError` found across all signatures.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{FunctionOverride, NamedTypeRegistry, OverrideTable, StrategyKind};
/// use cmdbuf_gen::builder::build_records;
/// use cmdbuf_gen::parser::parse_signatures;
///
/// let registry = NamedTypeRegistry::default();
/// let signatures = parse_signatures(
///     "void Flush();\nvoid ShallowFlushCHROMIUM();",
///     &registry,
/// )
/// .unwrap();
/// let overrides = OverrideTable::new(vec![
///     FunctionOverride::new("ShallowFlushCHROMIUM").strategy(StrategyKind::NoCommand),
/// ])
/// .unwrap();
///
/// let records = build_records(&signatures, &registry, &overrides).unwrap();
/// assert_eq!(records[0].kind(), StrategyKind::Direct);
/// assert_eq!(records[1].kind(), StrategyKind::NoCommand);
/// assert!(records[1].transfer.is_empty());
/// ```
pub fn build_records(
    signatures: &[FunctionSignature],
    registry: &NamedTypeRegistry,
    overrides: &OverrideTable,
) -> Result<Vec<FunctionRecord>, Vec<MergeError>> {
    let mut records = Vec::with_capacity(signatures.len());
    let mut errors = Vec::new();

    for signature in signatures {
        let default_override;
        let directives = match overrides.get(&signature.name) {
            Some(found) => found,
            None => {
                default_override = FunctionOverride::new(&signature.name);
                &default_override
            }
        };

        match build_record(signature, directives, registry) {
            Ok(record) => {
                trace!(
                    "{}: {} via {:?}",
                    record.name,
                    record.kind(),
                    record.transfer
                );
                records.push(record);
            }
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    debug!("built {} records ({} errors)", records.len(), errors.len());

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(errors)
    }
}

/// Merges one signature with its directives.
fn build_record(
    signature: &FunctionSignature,
    directives: &FunctionOverride,
    registry: &NamedTypeRegistry,
) -> Result<FunctionRecord, Vec<MergeError>> {
    let function = signature.name.clone();

    let args = match &directives.cmd_args {
        Some(text) => parse_param_list(text, registry).map_err(|source| {
            vec![MergeError::InvalidArguments {
                function: function.clone(),
                source,
            }]
        })?,
        None => signature.params.clone(),
    };

    let kind = match directives.strategy {
        Some(kind) => kind,
        None => infer_strategy(&signature.return_type, &args).ok_or_else(|| {
            vec![MergeError::UnmatchedShape {
                function: function.clone(),
                shape: describe_shape(&signature.return_type, &args),
            }]
        })?,
    };

    let mut errors = Vec::new();
    let pointer_count = args.iter().filter(|arg| arg.ty.is_pointer()).count();

    if matches!(kind, StrategyKind::Direct | StrategyKind::Create) && pointer_count > 0 {
        errors.push(MergeError::PointerArguments {
            function: function.clone(),
            strategy: kind,
        });
    }

    if !kind.is_put_family() {
        if directives.count.is_some() {
            errors.push(field_not_allowed(&function, "count", kind));
        }
        if directives.use_count_func {
            errors.push(field_not_allowed(&function, "use_count_func", kind));
        }
    }
    if directives.count == Some(0) {
        errors.push(MergeError::ZeroCount {
            function: function.clone(),
        });
    }
    if directives.not_shared && !matches!(kind, StrategyKind::GenN | StrategyKind::Create) {
        errors.push(field_not_allowed(&function, "not_shared", kind));
    }

    let transfer = match resolve_transfer(&function, kind, directives, pointer_count) {
        Ok(transfer) => transfer,
        Err(err) => {
            errors.push(err);
            Vec::new()
        }
    };

    for &index in directives.valid_args.keys() {
        if index >= args.len() {
            errors.push(MergeError::ValidArgIndex {
                function: function.clone(),
                index,
                count: args.len(),
            });
        }
    }

    if kind.is_id_bearing()
        && directives.client_entry
        && directives.generated_marshal
        && args != signature.params
    {
        errors.push(MergeError::SignatureMismatch {
            function: function.clone(),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let sizing = PutSizing {
        count: directives.count,
        use_count_func: directives.use_count_func,
    };
    let strategy = match kind {
        StrategyKind::NoCommand => Strategy::NoCommand,
        StrategyKind::Direct => Strategy::Direct,
        StrategyKind::Custom => Strategy::Custom,
        StrategyKind::Put => Strategy::Put(sizing),
        StrategyKind::PutN => Strategy::PutN(sizing),
        StrategyKind::GetN => Strategy::GetN,
        StrategyKind::GenN => Strategy::GenN {
            not_shared: directives.not_shared,
        },
        StrategyKind::DelN => Strategy::DelN,
        StrategyKind::Is => Strategy::Is,
        StrategyKind::Create => Strategy::Create {
            not_shared: directives.not_shared,
        },
    };

    Ok(FunctionRecord {
        name: function,
        line: signature.line,
        return_type: signature.return_type.clone(),
        declared_args: signature.params.clone(),
        args,
        strategy,
        transfer,
        base: BaseFlags {
            client_entry: directives.client_entry,
            generated_marshal: directives.generated_marshal,
            internal: directives.internal,
            trace_level: directives.trace_level,
            extension: directives.extension.clone(),
        },
        tests: TestFlags {
            unit_test: directives.unit_test,
            client_test: directives.client_test,
            expectation: directives.expectation,
            invalid_test: directives.invalid_test,
        },
        decoder: directives.decoder.clone(),
        valid_args: directives.valid_args.clone(),
        resource: directives.resource.clone(),
        test_func: directives.test_func.clone(),
    })
}

fn field_not_allowed(function: &str, field: &'static str, strategy: StrategyKind) -> MergeError {
    MergeError::FieldNotAllowed {
        function: function.to_string(),
        field,
        strategy,
    }
}

/// Picks the transfer methods of a record.
///
/// Explicit lists are deduplicated and put in preference order. Without one
/// the default is `immediate` for exactly one pointer argument and `shm`
/// otherwise; GETn and Is always use `shm`.
fn resolve_transfer(
    function: &str,
    kind: StrategyKind,
    directives: &FunctionOverride,
    pointer_count: usize,
) -> Result<Vec<TransferMethod>, MergeError> {
    if kind == StrategyKind::NoCommand {
        return match &directives.transfer_methods {
            Some(_) => Err(field_not_allowed(function, "transfer_methods", kind)),
            None => Ok(Vec::new()),
        };
    }

    let Some(explicit) = &directives.transfer_methods else {
        let default = if kind.returns_through_shm() || pointer_count != 1 {
            TransferMethod::Shm
        } else {
            TransferMethod::Immediate
        };
        return Ok(vec![default]);
    };

    let mut methods = explicit.clone();
    methods.sort();
    methods.dedup();

    if methods.is_empty() {
        return Err(MergeError::NoTransferMethod {
            function: function.to_string(),
        });
    }
    if kind.returns_through_shm()
        && let Some(&method) = methods.iter().find(|&&m| m != TransferMethod::Shm)
    {
        return Err(MergeError::TransferMethod {
            function: function.to_string(),
            strategy: kind,
            method,
        });
    }
    if methods.contains(&TransferMethod::Immediate) && pointer_count != 1 {
        return Err(MergeError::ImmediatePointers {
            function: function.to_string(),
            count: pointer_count,
        });
    }

    Ok(methods)
}
