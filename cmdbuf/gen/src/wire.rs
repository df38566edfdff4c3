//! Wire layout planning.
//!
//! Every ID-bearing record produces one [`WireCommand`] per transfer method.
//! A wire command is a fixed sequence of 32-bit words following the command
//! header, plus optional immediate data. Planning happens once and every
//! emitter reads the same plan, so the client writer, the format structs and
//! the service decoder cannot disagree about a field.
//!
//! ## Field Mapping
//!
//! | argument | fields |
//! |---|---|
//! | 32-bit scalar | `name` (`u32`, `i32` or `f32`) |
//! | 64-bit scalar | `name_0` (low), `name_1` (high) |
//! | shm pointer | `name_shm_id`, `name_shm_offset` |
//! | bucket pointer | `name_bucket_id` |
//! | immediate pointer | none; data follows the struct |
//!
//! GETn turns its trailing pointer into `result_shm_id`/`result_shm_offset`,
//! Is appends the same pair, Create appends `client_id`, and a PUT sized at
//! runtime appends `count`.

use std::collections::BTreeSet;

use cmdbuf_define::{CType, Param, StrategyKind, TransferMethod};
use tracing::debug;

use crate::errors::EmitError;
use crate::naming;
use crate::record::FunctionRecord;

/// Type of the element-count argument that sizes counted data.
const COUNT_TYPE: &str = "GLsizei";

/// Storage type of a 32-bit wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    U32,
    I32,
    F32,
}

/// How a scalar argument is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    U32,
    I32,
    F32,
    /// `bool`, stored as `0`/`1` in a `u32`.
    Bool,
    /// Any 64-bit integer, split over two `u32` fields.
    U64,
    /// A named type with its own representation, stored as `u32` and
    /// decoded with `from_wire`.
    Enum,
}

impl WireKind {
    /// Wire kind of a non-pointer type, if it has one.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cmdbuf_define::CType;
    /// use cmdbuf_gen::wire::WireKind;
    ///
    /// assert_eq!(WireKind::of(&CType::value("GLsizei")), Some(WireKind::I32));
    /// assert_eq!(WireKind::of(&CType::value("GLuint64")), Some(WireKind::U64));
    /// assert_eq!(WireKind::of(&CType::value("GLsync")), None);
    /// ```
    pub fn of(ty: &CType) -> Option<Self> {
        if ty.is_pointer() {
            return None;
        }
        scalar_kind(&ty.base).or_else(|| ty.named.map(|_| Self::Enum))
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Self::I32 => FieldType::I32,
            Self::F32 => FieldType::F32,
            Self::U32 | Self::Bool | Self::U64 | Self::Enum => FieldType::U32,
        }
    }
}

fn scalar_kind(base: &str) -> Option<WireKind> {
    let kind = match base {
        "GLenum" | "GLuint" | "GLbitfield" | "GLboolean" | "GLubyte" | "GLushort" | "uint32_t" => {
            WireKind::U32
        }
        "GLint" | "GLsizei" | "GLbyte" | "GLshort" | "GLfixed" | "int32_t" => WireKind::I32,
        "GLfloat" | "GLclampf" | "float" => WireKind::F32,
        "bool" => WireKind::Bool,
        "GLuint64" | "GLint64" | "GLsizeiptr" | "GLintptr" | "uint64_t" | "int64_t" => {
            WireKind::U64
        }
        _ => return None,
    };
    Some(kind)
}

/// A single 32-bit field after the command header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    pub name: String,
    pub ty: FieldType,
}

/// How many elements accompany a pointer argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSizing {
    /// Exactly this many elements.
    Fixed(u32),
    /// The `count` field holds the number of elements, at most `max`.
    Runtime { max: u32 },
    /// `units` elements per unit of the argument at index `arg`.
    Counted { arg: usize, units: u32 },
    /// Only the hand-written handler knows; the location is passed through.
    Unsized,
}

/// Where an argument lives inside a wire command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgLayout {
    /// One field, by index into [`WireCommand::fields`].
    Word { field: usize, kind: WireKind },
    /// A 64-bit value over two fields.
    Split { low: usize, high: usize },
    Shm {
        id: usize,
        offset: usize,
        sizing: PointerSizing,
    },
    Bucket { id: usize, sizing: PointerSizing },
    /// Data follows the struct in the command buffer.
    Immediate { sizing: PointerSizing },
    /// GETn output, written back through shared memory.
    Result { id: usize, offset: usize },
}

/// One argument of a wire command with its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireArg<'a> {
    pub param: &'a Param,
    pub layout: ArgLayout,
}

/// Field pair addressing a result in shared memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFields {
    pub id: usize,
    pub offset: usize,
}

/// One fixed-layout command with its own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCommand<'a> {
    pub record: &'a FunctionRecord,
    pub method: TransferMethod,
    /// Struct name, e.g. `DeleteTexturesImmediate`.
    pub name: String,
    pub id: u32,
    pub fields: Vec<WireField>,
    pub args: Vec<WireArg<'a>>,
    /// `count` field of a PUT sized at runtime.
    pub count: Option<usize>,
    /// Result location of an Is command.
    pub result: Option<ResultFields>,
    /// `client_id` field of a Create command.
    pub client_id: Option<usize>,
}

impl WireCommand<'_> {
    /// Snake-case name used for helper writers and decoder handlers.
    pub fn snake_name(&self) -> String {
        naming::snake_name(&self.name)
    }

    /// Size of the fixed part in bytes, header included.
    pub fn fixed_size(&self) -> usize {
        4 * (1 + self.fields.len())
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate_arg().is_some()
    }

    /// The argument whose data follows the struct, if any.
    pub fn immediate_arg(&self) -> Option<(&WireArg<'_>, PointerSizing)> {
        self.args.iter().find_map(|arg| match arg.layout {
            ArgLayout::Immediate { sizing } => Some((arg, sizing)),
            _ => None,
        })
    }

    pub fn field(&self, index: usize) -> &WireField {
        &self.fields[index]
    }
}

/// Plans every wire command, assigning ids from `command_base`.
///
/// ## Errors
///
/// Returns every `EmitError` found: PUT/PUTn without a count, GENn or
/// Create without a resource, Is without a decoder, decoder names that are not identifiers,
/// and arguments with no wire representation.
///
/// ## Examples
///
/// ```
/// use cmdbuf_define::{NamedTypeRegistry, OverrideTable};
/// use cmdbuf_gen::builder::build_records;
/// use cmdbuf_gen::parser::parse_signatures;
/// use cmdbuf_gen::wire::plan_commands;
///
/// let registry = NamedTypeRegistry::default();
/// let text = "void DeleteTextures(GLsizei n, const GLuint* textures);\n\
///             void WaitSync(GLuint sync, GLbitfield flags, GLuint64 timeout);";
/// let signatures = parse_signatures(text, &registry).unwrap();
/// let records = build_records(&signatures, &registry, &OverrideTable::default()).unwrap();
///
/// let commands = plan_commands(&records, 256).unwrap();
/// assert_eq!(commands[0].name, "DeleteTexturesImmediate");
/// assert_eq!(commands[1].id, 257);
///
/// let fields: Vec<_> = commands[1].fields.iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(fields, vec!["sync", "flags", "timeout_0", "timeout_1"]);
/// ```
pub fn plan_commands(
    records: &[FunctionRecord],
    command_base: u32,
) -> Result<Vec<WireCommand<'_>>, Vec<EmitError>> {
    let mut commands = Vec::new();
    let mut errors = Vec::new();
    let mut next_id = command_base;

    for record in records.iter().filter(|record| record.is_id_bearing()) {
        if let Err(err) = check_record(record) {
            errors.push(err);
            continue;
        }
        for &method in &record.transfer {
            match plan_command(record, method, next_id) {
                Ok(command) => commands.push(command),
                Err(err) => errors.push(err),
            }
            next_id += 1;
        }
    }

    debug!(
        "planned {} wire commands ({} errors)",
        commands.len(),
        errors.len()
    );

    if errors.is_empty() {
        Ok(commands)
    } else {
        Err(errors)
    }
}

/// Record-level requirements that do not depend on the transfer method.
fn check_record(record: &FunctionRecord) -> Result<(), EmitError> {
    let kind = record.kind();

    if let Some(sizing) = record.strategy.put_sizing()
        && sizing.count.is_none()
    {
        return Err(missing_field(record, "count"));
    }
    if matches!(kind, StrategyKind::Create | StrategyKind::GenN) && record.resource.is_none() {
        return Err(missing_field(record, "resource"));
    }

    match &record.decoder {
        Some(decoder) if !naming::is_identifier(decoder) => Err(EmitError::InvalidDecoder {
            function: record.name.clone(),
            decoder: decoder.clone(),
        }),
        None if kind == StrategyKind::Is => Err(missing_field(record, "decoder")),
        _ => Ok(()),
    }
}

fn missing_field(record: &FunctionRecord, field: &'static str) -> EmitError {
    EmitError::MissingField {
        function: record.name.clone(),
        strategy: record.kind(),
        field,
    }
}

fn no_wire_representation(record: &FunctionRecord, param: &Param) -> EmitError {
    EmitError::NoWireRepresentation {
        function: record.name.clone(),
        arg: param.name.clone(),
        ty: param.ty.to_string(),
    }
}

fn plan_command(
    record: &FunctionRecord,
    method: TransferMethod,
    id: u32,
) -> Result<WireCommand<'_>, EmitError> {
    let kind = record.kind();
    let name = format!("{}{}", record.name, method.struct_suffix());
    let mut fields = Fields::new(&name);

    let result_arg = match kind {
        StrategyKind::GetN => record.args.len().checked_sub(1),
        _ => None,
    };

    let mut args = Vec::with_capacity(record.args.len());
    for (index, param) in record.args.iter().enumerate() {
        let layout = if param.ty.is_pointer() {
            if Some(index) == result_arg {
                ArgLayout::Result {
                    id: fields.push("result_shm_id", FieldType::U32)?,
                    offset: fields.push("result_shm_offset", FieldType::U32)?,
                }
            } else {
                if param.ty.pointer_depth != 1 {
                    return Err(no_wire_representation(record, param));
                }
                let sizing = pointer_sizing(record, index)?;
                match method {
                    TransferMethod::Immediate => ArgLayout::Immediate { sizing },
                    TransferMethod::Shm => ArgLayout::Shm {
                        id: fields.push(&format!("{}_shm_id", param.name), FieldType::U32)?,
                        offset: fields
                            .push(&format!("{}_shm_offset", param.name), FieldType::U32)?,
                        sizing,
                    },
                    TransferMethod::Bucket => ArgLayout::Bucket {
                        id: fields.push(&format!("{}_bucket_id", param.name), FieldType::U32)?,
                        sizing,
                    },
                }
            }
        } else {
            match WireKind::of(&param.ty) {
                Some(WireKind::U64) => ArgLayout::Split {
                    low: fields.push(&format!("{}_0", param.name), FieldType::U32)?,
                    high: fields.push(&format!("{}_1", param.name), FieldType::U32)?,
                },
                Some(wire) => ArgLayout::Word {
                    field: fields.push(&param.name, wire.field_type())?,
                    kind: wire,
                },
                None => return Err(no_wire_representation(record, param)),
            }
        };
        args.push(WireArg { param, layout });
    }

    let count = match record.strategy.put_sizing() {
        Some(sizing) if sizing.use_count_func => Some(fields.push("count", FieldType::U32)?),
        _ => None,
    };
    let result = match kind {
        StrategyKind::Is => Some(ResultFields {
            id: fields.push("result_shm_id", FieldType::U32)?,
            offset: fields.push("result_shm_offset", FieldType::U32)?,
        }),
        _ => None,
    };
    let client_id = match kind {
        StrategyKind::Create => Some(fields.push("client_id", FieldType::U32)?),
        _ => None,
    };

    Ok(WireCommand {
        record,
        method,
        id,
        fields: fields.finish(),
        name,
        args,
        count,
        result,
        client_id,
    })
}

/// Element count of the pointer argument at `index`.
fn pointer_sizing(record: &FunctionRecord, index: usize) -> Result<PointerSizing, EmitError> {
    let param = &record.args[index];
    match record.strategy.kind() {
        StrategyKind::Custom => Ok(PointerSizing::Unsized),
        StrategyKind::Put => {
            let sizing = record
                .strategy
                .put_sizing()
                .ok_or_else(|| missing_field(record, "count"))?;
            let count = sizing.count.ok_or_else(|| missing_field(record, "count"))?;
            Ok(if sizing.use_count_func {
                PointerSizing::Runtime { max: count }
            } else {
                PointerSizing::Fixed(count)
            })
        }
        StrategyKind::PutN => {
            let units = record
                .strategy
                .put_sizing()
                .and_then(|sizing| sizing.count)
                .ok_or_else(|| missing_field(record, "count"))?;
            let arg = counted_by(record, index).ok_or_else(|| missing_field(record, "count argument"))?;
            Ok(PointerSizing::Counted { arg, units })
        }
        StrategyKind::GenN | StrategyKind::DelN => {
            let arg = counted_by(record, index).ok_or_else(|| missing_field(record, "count argument"))?;
            Ok(PointerSizing::Counted { arg, units: 1 })
        }
        _ => Err(no_wire_representation(record, param)),
    }
}

/// Index of the `GLsizei` argument directly before the pointer at `index`.
fn counted_by(record: &FunctionRecord, index: usize) -> Option<usize> {
    let previous = index.checked_sub(1)?;
    let arg = &record.args[previous];
    (arg.ty.base == COUNT_TYPE && !arg.ty.is_pointer()).then_some(previous)
}

/// Field list that rejects duplicate names.
struct Fields<'n> {
    command: &'n str,
    fields: Vec<WireField>,
    names: BTreeSet<String>,
}

impl<'n> Fields<'n> {
    fn new(command: &'n str) -> Self {
        Self {
            command,
            fields: Vec::new(),
            names: BTreeSet::new(),
        }
    }

    fn push(&mut self, name: &str, ty: FieldType) -> Result<usize, EmitError> {
        if name == "header" || !self.names.insert(name.to_string()) {
            return Err(EmitError::Collision(format!(
                "{}: field '{}' is declared twice",
                self.command, name
            )));
        }
        self.fields.push(WireField {
            name: name.to_string(),
            ty,
        });
        Ok(self.fields.len() - 1)
    }

    fn finish(self) -> Vec<WireField> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_records;
    use crate::parser::parse_signatures;
    use crate::record::{PutSizing, Strategy};
    use crate::test_utils::{make_record, make_registry};
    use cmdbuf_define::{FunctionOverride, OverrideTable};

    fn records(text: &str, overrides: Vec<FunctionOverride>) -> Vec<FunctionRecord> {
        let registry = make_registry();
        let signatures = parse_signatures(text, &registry).unwrap();
        build_records(&signatures, &registry, &OverrideTable::new(overrides).unwrap()).unwrap()
    }

    fn field_names(command: &WireCommand<'_>) -> Vec<String> {
        command.fields.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn ids_are_sequential_and_skip_no_command() {
        let records = records(
            "void Finish();\nvoid ShallowFlushCHROMIUM();\nvoid Flush();",
            vec![FunctionOverride::new("ShallowFlushCHROMIUM").strategy(StrategyKind::NoCommand)],
        );
        let commands = plan_commands(&records, 256).unwrap();

        let ids: Vec<_> = commands.iter().map(|c| (c.name.as_str(), c.id)).collect();
        assert_eq!(ids, vec![("Finish", 256), ("Flush", 257)]);
    }

    #[test]
    fn one_command_per_transfer_method() {
        let records = records(
            "void ProduceTextureDirect(GLuint texture, const GLbyte* mailbox);",
            vec![
                FunctionOverride::new("ProduceTextureDirect")
                    .strategy(StrategyKind::Put)
                    .count(16)
                    .transfer([TransferMethod::Immediate, TransferMethod::Shm, TransferMethod::Bucket]),
            ],
        );
        let commands = plan_commands(&records, 256).unwrap();

        let names: Vec<_> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ProduceTextureDirectImmediate",
                "ProduceTextureDirect",
                "ProduceTextureDirectBucket"
            ]
        );
        assert_eq!(field_names(&commands[0]), vec!["texture"]);
        assert_eq!(
            field_names(&commands[1]),
            vec!["texture", "mailbox_shm_id", "mailbox_shm_offset"]
        );
        assert_eq!(field_names(&commands[2]), vec!["texture", "mailbox_bucket_id"]);
        assert_eq!(
            commands[0].immediate_arg().map(|(_, sizing)| sizing),
            Some(PointerSizing::Fixed(16))
        );
    }

    #[test]
    fn sixty_four_bit_arguments_split() {
        let records = records(
            "void RasterCHROMIUM(GLuint raster_shm_id, GLsizeiptr raster_shm_size);",
            vec![],
        );
        let commands = plan_commands(&records, 256).unwrap();
        let command = &commands[0];

        assert_eq!(
            field_names(command),
            vec!["raster_shm_id", "raster_shm_size_0", "raster_shm_size_1"]
        );
        assert_eq!(command.args[1].layout, ArgLayout::Split { low: 1, high: 2 });
        assert_eq!(command.fixed_size(), 16);
    }

    #[test]
    fn getter_result_replaces_trailing_pointer() {
        let records = records("void GetIntegerv(GLenum<GLState> pname, GLint* params);", vec![]);
        let commands = plan_commands(&records, 256).unwrap();

        assert_eq!(
            field_names(&commands[0]),
            vec!["pname", "result_shm_id", "result_shm_offset"]
        );
        assert_eq!(commands[0].args[1].layout, ArgLayout::Result { id: 1, offset: 2 });
    }

    #[test]
    fn is_appends_result_fields() {
        let records = records(
            "GLenum GetError();",
            vec![FunctionOverride::new("GetError").decoder("get_gl_error")],
        );
        let commands = plan_commands(&records, 256).unwrap();

        assert_eq!(field_names(&commands[0]), vec!["result_shm_id", "result_shm_offset"]);
        assert_eq!(commands[0].result, Some(ResultFields { id: 0, offset: 1 }));
    }

    #[test]
    fn create_appends_client_id() {
        let records = records(
            "GLuint CreateTexture(bool use_buffer, gfx::BufferUsage buffer_usage);",
            vec![
                FunctionOverride::new("CreateTexture")
                    .strategy(StrategyKind::Create)
                    .resource("Textures"),
            ],
        );
        let commands = plan_commands(&records, 256).unwrap();
        let command = &commands[0];

        assert_eq!(field_names(command), vec!["use_buffer", "buffer_usage", "client_id"]);
        assert_eq!(command.args[0].layout, ArgLayout::Word { field: 0, kind: WireKind::Bool });
        assert_eq!(command.args[1].layout, ArgLayout::Word { field: 1, kind: WireKind::Enum });
        assert_eq!(command.client_id, Some(2));
    }

    #[test]
    fn runtime_sized_put_carries_count() {
        let records = records(
            "void SetMailbox(GLuint texture, const GLbyte* mailbox);",
            vec![
                FunctionOverride::new("SetMailbox")
                    .strategy(StrategyKind::Put)
                    .count(16)
                    .use_count_func(),
            ],
        );
        let commands = plan_commands(&records, 256).unwrap();

        assert_eq!(field_names(&commands[0]), vec!["texture", "count"]);
        assert_eq!(commands[0].count, Some(1));
        assert_eq!(
            commands[0].immediate_arg().map(|(_, sizing)| sizing),
            Some(PointerSizing::Runtime { max: 16 })
        );
    }

    #[test]
    fn id_lists_are_counted_by_n() {
        let records = records("void DeleteTextures(GLsizei n, const GLuint* textures);", vec![]);
        let commands = plan_commands(&records, 256).unwrap();

        assert_eq!(
            commands[0].immediate_arg().map(|(_, sizing)| sizing),
            Some(PointerSizing::Counted { arg: 0, units: 1 })
        );
    }

    #[test]
    fn custom_pointers_are_unsized() {
        let records = records(
            "void BeginQueryEXT(GLenum<QueryTarget> target, GLuint id, void* sync_data);",
            vec![
                FunctionOverride::new("BeginQueryEXT")
                    .strategy(StrategyKind::Custom)
                    .transfer([TransferMethod::Shm]),
            ],
        );
        let commands = plan_commands(&records, 256).unwrap();

        assert_eq!(
            commands[0].args[2].layout,
            ArgLayout::Shm {
                id: 2,
                offset: 3,
                sizing: PointerSizing::Unsized
            }
        );
    }

    #[test]
    fn put_without_count_is_an_error() {
        let record = make_record(
            "ProduceTextureDirect",
            Strategy::Put(PutSizing {
                count: None,
                use_count_func: false,
            }),
        );
        let errors = plan_commands(std::slice::from_ref(&record), 256).unwrap_err();

        assert_eq!(
            errors,
            vec![EmitError::MissingField {
                function: "ProduceTextureDirect".to_string(),
                strategy: StrategyKind::Put,
                field: "count",
            }]
        );
    }

    #[test]
    fn is_requires_a_decoder() {
        let records = records("GLenum GetError();", vec![]);
        let errors = plan_commands(&records, 256).unwrap_err();
        assert!(matches!(
            errors[0],
            EmitError::MissingField { field: "decoder", .. }
        ));
    }

    #[test]
    fn create_requires_a_resource() {
        let records = records(
            "GLuint CreateTexture(bool use_buffer);",
            vec![FunctionOverride::new("CreateTexture").strategy(StrategyKind::Create)],
        );
        let errors = plan_commands(&records, 256).unwrap_err();
        assert!(matches!(
            errors[0],
            EmitError::MissingField { field: "resource", .. }
        ));
    }

    #[test]
    fn decoder_must_be_an_identifier() {
        let records = records(
            "void Finish();",
            vec![FunctionOverride::new("Finish").decoder("GetErrorState()->Finish")],
        );
        let errors = plan_commands(&records, 256).unwrap_err();
        assert!(matches!(errors[0], EmitError::InvalidDecoder { .. }));
    }

    #[test]
    fn unknown_scalar_type_has_no_wire_form() {
        let records = records("void WaitSync(GLsync sync);", vec![]);
        let errors = plan_commands(&records, 256).unwrap_err();
        assert_eq!(
            errors,
            vec![EmitError::NoWireRepresentation {
                function: "WaitSync".to_string(),
                arg: "sync".to_string(),
                ty: "GLsync".to_string(),
            }]
        );
    }

    #[test]
    fn duplicate_field_names_collide() {
        let records = records(
            "void SetMailbox(GLuint count, const GLbyte* mailbox);",
            vec![
                FunctionOverride::new("SetMailbox")
                    .strategy(StrategyKind::Put)
                    .count(16)
                    .use_count_func(),
            ],
        );
        let errors = plan_commands(&records, 256).unwrap_err();
        assert!(matches!(errors[0], EmitError::Collision(_)));
    }
}
