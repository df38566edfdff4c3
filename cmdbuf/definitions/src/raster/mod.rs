//! Raster command buffer protocol definition.
//!
//! The raster protocol carries texture management, query, sync and paint
//! cache commands from a raster client to the GPU service. Command ids
//! start right after the common command set at 256.

use cmdbuf_define::{
    DefineError, FunctionOverride, NamedType, NamedTypeRegistry, OverrideTable,
    ProtocolDefinition, StrategyKind, TransferMethod,
};

/// Signature list compiled into the generator.
pub const RASTER_FUNCTIONS: &str = include_str!("raster_cmd_buffer_functions.txt");

/// Creates the raster protocol definition.
///
/// ## Errors
///
/// Returns a `DefineError` if the named types or overrides break their
/// invariants.
///
/// ## Examples
///
/// ```rust
/// use cmdbuf_definitions::raster::define_raster_protocol;
///
/// let protocol = define_raster_protocol().unwrap();
/// assert_eq!(protocol.name, "Raster");
/// assert_eq!(protocol.command_base, 256);
/// assert!(protocol.named_types.resolve("QueryTarget").is_ok());
/// ```
pub fn define_raster_protocol() -> Result<ProtocolDefinition, DefineError> {
    Ok(ProtocolDefinition {
        name: "Raster".to_string(),
        prefix: "raster".to_string(),
        description: "Raster command buffer protocol".to_string(),
        command_base: 256,
        support_path: "crate::command_buffer".to_string(),
        named_types: raster_named_types()?,
        overrides: raster_overrides()?,
        functions: RASTER_FUNCTIONS.to_string(),
    })
}

/// Named argument types referenced by the raster signatures.
pub fn raster_named_types() -> Result<NamedTypeRegistry, DefineError> {
    NamedTypeRegistry::new(vec![
        NamedType::new("GLState", "GLenum")
            .valid(["GL_ACTIVE_TEXTURE"])
            .invalid(["GL_FOG_HINT"]),
        NamedType::new("QueryObjectParameter", "GLenum").complete().valid([
            "GL_QUERY_RESULT_EXT",
            "GL_QUERY_RESULT_AVAILABLE_EXT",
            "GL_QUERY_RESULT_AVAILABLE_NO_FLUSH_CHROMIUM_EXT",
        ]),
        NamedType::new("QueryTarget", "GLenum")
            .complete()
            .valid(["GL_COMMANDS_ISSUED_CHROMIUM", "GL_COMMANDS_COMPLETED_CHROMIUM"])
            .invalid(["GL_LATENCY_QUERY_CHROMIUM"]),
        NamedType::new("TextureParameter", "GLenum")
            .valid([
                "GL_TEXTURE_MAG_FILTER",
                "GL_TEXTURE_MIN_FILTER",
                "GL_TEXTURE_WRAP_S",
                "GL_TEXTURE_WRAP_T",
            ])
            .invalid(["GL_GENERATE_MIPMAP"]),
        NamedType::new("TextureWrapMode", "GLenum")
            .valid(["GL_CLAMP_TO_EDGE"])
            .invalid(["GL_REPEAT"]),
        NamedType::new("TextureMinFilterMode", "GLenum")
            .valid(["GL_NEAREST"])
            .invalid(["GL_NEAREST_MIPMAP_NEAREST"]),
        NamedType::new("TextureMagFilterMode", "GLenum")
            .valid(["GL_NEAREST"])
            .invalid(["GL_LINEAR"]),
        NamedType::new("ResetStatus", "GLenum").complete().valid([
            "GL_GUILTY_CONTEXT_RESET_ARB",
            "GL_INNOCENT_CONTEXT_RESET_ARB",
            "GL_UNKNOWN_CONTEXT_RESET_ARB",
        ]),
        NamedType::new("gfx::BufferUsage", "gfx::BufferUsage")
            .valid([
                "gfx::BufferUsage::GPU_READ",
                "gfx::BufferUsage::SCANOUT",
                "gfx::BufferUsage::GPU_READ_CPU_READ_WRITE",
                "gfx::BufferUsage::GPU_READ_CPU_READ_WRITE_PERSISTENT",
            ])
            .invalid([
                "gfx::BufferUsage::SCANOUT_CAMERA_READ_WRITE",
                "gfx::BufferUsage::CAMERA_AND_CPU_READ_WRITE",
            ]),
        NamedType::new("viz::ResourceFormat", "viz::ResourceFormat")
            .valid([
                "viz::ResourceFormat::RGBA_8888",
                "viz::ResourceFormat::RGBA_4444",
                "viz::ResourceFormat::BGRA_8888",
                "viz::ResourceFormat::ALPHA_8",
                "viz::ResourceFormat::LUMINANCE_8",
                "viz::ResourceFormat::RGB_565",
                "viz::ResourceFormat::BGR_565",
                "viz::ResourceFormat::RED_8",
                "viz::ResourceFormat::RG_88",
                "viz::ResourceFormat::LUMINANCE_F16",
                "viz::ResourceFormat::RGBA_F16",
                "viz::ResourceFormat::R16_EXT",
                "viz::ResourceFormat::RGBX_8888",
                "viz::ResourceFormat::BGRX_8888",
                "viz::ResourceFormat::RGBX_1010102",
                "viz::ResourceFormat::BGRX_1010102",
                "viz::ResourceFormat::YVU_420",
                "viz::ResourceFormat::YUV_420_BIPLANAR",
                "viz::ResourceFormat::UYVY_422",
            ])
            .invalid(["viz::ResourceFormat::ETC1"]),
    ])
}

/// Mailbox names are 16 bytes on the wire.
const MAILBOX_SIZE: u32 = 16;

/// Per-function directives for the raster protocol.
pub fn raster_overrides() -> Result<OverrideTable, DefineError> {
    use StrategyKind::*;

    OverrideTable::new(vec![
        FunctionOverride::new("CreateAndConsumeTexture")
            .strategy(NoCommand)
            .trace_level(2),
        FunctionOverride::new("CreateAndConsumeTextureINTERNAL")
            .strategy(Put)
            .decoder("do_create_and_consume_texture_internal")
            .internal()
            .count(MAILBOX_SIZE)
            .no_unit_test()
            .trace_level(2),
        FunctionOverride::new("CreateImageCHROMIUM")
            .strategy(NoCommand)
            .cmd_args("ClientBuffer buffer, GLsizei width, GLsizei height, GLenum internalformat")
            .trace_level(1),
        FunctionOverride::new("CopySubTexture")
            .decoder("do_copy_sub_texture")
            .no_unit_test()
            .trace_level(2),
        FunctionOverride::new("DestroyImageCHROMIUM")
            .strategy(NoCommand)
            .trace_level(1),
        FunctionOverride::new("DeleteTextures")
            .strategy(DelN)
            .resource("Textures"),
        FunctionOverride::new("Finish")
            .hand_written_marshal()
            .no_client_test()
            .decoder("do_finish")
            .trace_level(1),
        FunctionOverride::new("Flush")
            .hand_written_marshal()
            .decoder("do_flush")
            .trace_level(1),
        FunctionOverride::new("GetError")
            .strategy(Is)
            .decoder("get_gl_error")
            .hand_written_marshal()
            .no_client_test(),
        FunctionOverride::new("GetGraphicsResetStatusKHR")
            .strategy(NoCommand)
            .trace_level(1),
        FunctionOverride::new("GetIntegerv")
            .strategy(GetN)
            .decoder("do_get_integerv")
            .no_client_test(),
        FunctionOverride::new("ProduceTextureDirect")
            .strategy(Put)
            .decoder("do_produce_texture_direct")
            .hand_written_marshal()
            .count(MAILBOX_SIZE)
            .no_unit_test()
            .no_client_test()
            .trace_level(1),
        FunctionOverride::new("TexParameteri")
            .decoder("do_tex_parameteri")
            .no_unit_test()
            .valid_arg(2, "GL_NEAREST"),
        FunctionOverride::new("TexStorage2D")
            .decoder("do_tex_storage_2d")
            .no_unit_test(),
        FunctionOverride::new("WaitSync")
            .strategy(Custom)
            .cmd_args("GLuint sync, GLbitfield flags, GLuint64 timeout")
            .hand_written_marshal()
            .no_client_test()
            .trace_level(1),
        FunctionOverride::new("GenQueriesEXT")
            .strategy(GenN)
            .test_func("gen_queries_arb")
            .resource("Queries")
            .no_unit_test()
            .not_shared(),
        FunctionOverride::new("DeleteQueriesEXT")
            .strategy(DelN)
            .test_func("delete_queries_arb")
            .resource("Queries")
            .no_unit_test(),
        FunctionOverride::new("BeginQueryEXT")
            .strategy(Custom)
            .hand_written_marshal()
            .cmd_args("GLenum<QueryTarget> target, GLuint id, void* sync_data")
            .transfer([TransferMethod::Shm])
            .test_func("begin_query"),
        FunctionOverride::new("EndQueryEXT")
            .strategy(Custom)
            .hand_written_marshal()
            .cmd_args("GLenum<QueryTarget> target, GLuint submit_count")
            .test_func("end_query")
            .no_client_test(),
        FunctionOverride::new("GetQueryObjectuivEXT")
            .strategy(NoCommand)
            .test_func("get_query_objectuiv"),
        FunctionOverride::new("BindTexImage2DCHROMIUM")
            .decoder("do_bind_tex_image_2d_chromium")
            .no_unit_test(),
        FunctionOverride::new("ReleaseTexImage2DCHROMIUM")
            .decoder("do_release_tex_image_2d_chromium")
            .no_unit_test(),
        FunctionOverride::new("ShallowFlushCHROMIUM").strategy(NoCommand),
        FunctionOverride::new("OrderingBarrierCHROMIUM").strategy(NoCommand),
        FunctionOverride::new("TraceBeginCHROMIUM")
            .strategy(Custom)
            .hand_written_marshal()
            .no_client_test()
            .cmd_args("GLuint category_bucket_id, GLuint name_bucket_id")
            .extension("CHROMIUM_trace_marker", None),
        FunctionOverride::new("TraceEndCHROMIUM")
            .hand_written_marshal()
            .no_client_test()
            .decoder("do_trace_end_chromium")
            .no_unit_test()
            .extension("CHROMIUM_trace_marker", None),
        FunctionOverride::new("SetActiveURLCHROMIUM")
            .strategy(Custom)
            .hand_written_marshal()
            .no_client_test()
            .cmd_args("GLuint url_bucket_id"),
        FunctionOverride::new("InsertFenceSyncCHROMIUM")
            .strategy(Custom)
            .internal()
            .hand_written_marshal()
            .cmd_args("GLuint64 release_count")
            .trace_level(1),
        FunctionOverride::new("LoseContextCHROMIUM")
            .decoder("do_lose_context_chromium")
            .no_unit_test()
            .trace_level(1),
        FunctionOverride::new("GenSyncTokenCHROMIUM").strategy(NoCommand),
        FunctionOverride::new("GenUnverifiedSyncTokenCHROMIUM").strategy(NoCommand),
        FunctionOverride::new("VerifySyncTokensCHROMIUM").strategy(NoCommand),
        FunctionOverride::new("WaitSyncTokenCHROMIUM")
            .strategy(Custom)
            .hand_written_marshal()
            .cmd_args("GLint namespace_id, GLuint64 command_buffer_id, GLuint64 release_count")
            .no_client_test(),
        FunctionOverride::new("InitializeDiscardableTextureCHROMIUM")
            .strategy(Custom)
            .cmd_args("GLuint texture_id, uint32_t shm_id, uint32_t shm_offset")
            .hand_written_marshal()
            .no_client_test(),
        FunctionOverride::new("UnlockDiscardableTextureCHROMIUM")
            .strategy(Custom)
            .cmd_args("GLuint texture_id")
            .hand_written_marshal()
            .no_client_test(),
        FunctionOverride::new("LockDiscardableTextureCHROMIUM")
            .strategy(Custom)
            .cmd_args("GLuint texture_id")
            .hand_written_marshal()
            .no_client_test(),
        FunctionOverride::new("BeginRasterCHROMIUM")
            .decoder("do_begin_raster_chromium")
            .strategy(Put)
            .count(MAILBOX_SIZE)
            .internal()
            .hand_written_marshal()
            .no_unit_test(),
        FunctionOverride::new("RasterCHROMIUM")
            .decoder("do_raster_chromium")
            .internal()
            .cmd_args(
                "GLuint raster_shm_id, GLuint raster_shm_offset, GLsizeiptr raster_shm_size, \
                 GLuint font_shm_id, GLuint font_shm_offset, GLsizeiptr font_shm_size",
            )
            .extension("CHROMIUM_raster_transport", Some("chromium_raster_transport")),
        FunctionOverride::new("EndRasterCHROMIUM")
            .decoder("do_end_raster_chromium")
            .hand_written_marshal()
            .no_unit_test()
            .no_client_test(),
        FunctionOverride::new("CreateTransferCacheEntryINTERNAL")
            .decoder("do_create_transfer_cache_entry_internal")
            .cmd_args(
                "GLuint entry_type, GLuint entry_id, GLuint handle_shm_id, \
                 GLuint handle_shm_offset, GLuint data_shm_id, \
                 GLuint data_shm_offset, GLuint data_size",
            )
            .internal()
            .no_client_test()
            .no_unit_test(),
        FunctionOverride::new("DeleteTransferCacheEntryINTERNAL")
            .decoder("do_delete_transfer_cache_entry_internal")
            .cmd_args("GLuint entry_type, GLuint entry_id")
            .internal()
            .no_client_test()
            .no_unit_test(),
        FunctionOverride::new("DeletePaintCacheTextBlobsINTERNAL")
            .strategy(DelN)
            .internal()
            .no_unit_test(),
        FunctionOverride::new("DeletePaintCachePathsINTERNAL")
            .strategy(DelN)
            .internal()
            .no_unit_test(),
        FunctionOverride::new("ClearPaintCacheINTERNAL")
            .decoder("do_clear_paint_cache_internal")
            .internal()
            .no_unit_test(),
        FunctionOverride::new("UnlockTransferCacheEntryINTERNAL")
            .decoder("do_unlock_transfer_cache_entry_internal")
            .cmd_args("GLuint entry_type, GLuint entry_id")
            .internal()
            .no_client_test()
            .no_unit_test(),
        FunctionOverride::new("CreateTexture")
            .strategy(Create)
            .resource("Textures")
            .decoder("do_create_texture")
            .not_shared()
            .no_unit_test(),
        FunctionOverride::new("SetColorSpaceMetadata")
            .strategy(Custom)
            .hand_written_marshal()
            .no_client_test()
            .cmd_args("GLuint texture_id, GLuint shm_id, GLuint shm_offset, GLsizei color_space_size"),
        FunctionOverride::new("UnpremultiplyAndDitherCopyCHROMIUM")
            .decoder("do_unpremultiply_and_dither_copy_chromium")
            .cmd_args(
                "GLuint source_id, GLuint dest_id, GLint x, GLint y, \
                 GLsizei width, GLsizei height",
            )
            .no_client_test()
            .no_unit_test(),
    ])
}
