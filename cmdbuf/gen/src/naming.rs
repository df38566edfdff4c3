//! Identifier conversion for generated code.
//!
//! Function names in the signature file are UpperCamelCase with vendor
//! suffixes (`TraceBeginCHROMIUM`, `GenQueriesEXT`). Generated methods,
//! handlers and validator fields need snake_case, so the suffix and any
//! digit run are split off before `heck` does the rest.

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::Ident;
use quote::format_ident;

/// Vendor suffixes that end a function name.
const VENDOR_SUFFIXES: &[&str] = &["CHROMIUM", "INTERNAL", "EXT", "KHR", "ARB"];

/// Converts a function name to snake_case.
///
/// ## Examples
///
/// ```
/// use cmdbuf_gen::naming::snake_name;
///
/// assert_eq!(snake_name("DeleteTextures"), "delete_textures");
/// assert_eq!(snake_name("SetActiveURLCHROMIUM"), "set_active_url_chromium");
/// assert_eq!(snake_name("BindTexImage2DCHROMIUM"), "bind_tex_image_2d_chromium");
/// assert_eq!(snake_name("GetError"), "get_error");
/// ```
pub fn snake_name(name: &str) -> String {
    let (stem, suffix) = split_vendor_suffix(name);
    let mut split = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;
    for c in stem.chars() {
        if c.is_ascii_digit() && prev.is_some_and(|p| p.is_alphabetic()) {
            split.push('_');
        }
        split.push(c);
        prev = Some(c);
    }
    if let Some(suffix) = suffix {
        split.push('_');
        split.push_str(suffix);
    }
    split.to_snake_case()
}

fn split_vendor_suffix(name: &str) -> (&str, Option<&str>) {
    for suffix in VENDOR_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix)
            && !stem.is_empty()
        {
            return (stem, Some(suffix));
        }
    }
    (name, None)
}

/// Method name for a function on the client interface.
pub fn method_name(name: &str) -> String {
    snake_name(name)
}

/// Service handler derived from a function name when no decoder is set.
pub fn default_decoder(name: &str) -> String {
    format!("do_{}", snake_name(name))
}

/// Field name of a named type's validator inside the validator container.
///
/// ## Examples
///
/// ```
/// use cmdbuf_gen::naming::{validator_field, validator_type};
///
/// assert_eq!(validator_field("QueryTarget"), "query_target");
/// assert_eq!(validator_field("gfx::BufferUsage"), "gfx_buffer_usage");
/// assert_eq!(validator_type("gfx::BufferUsage"), "GfxBufferUsageValidator");
/// ```
pub fn validator_field(type_name: &str) -> String {
    type_name.replace("::", "_").to_snake_case()
}

/// Type name of a named type's validator.
pub fn validator_type(type_name: &str) -> String {
    format!("{}Validator", validator_field(type_name).to_upper_camel_case())
}

/// Returns true if `text` is a plain identifier.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Creates an identifier, escaping Rust keywords as raw identifiers.
pub fn ident(name: &str) -> Ident {
    if syn::parse_str::<Ident>(name).is_ok() {
        format_ident!("{}", name)
    } else {
        format_ident!("r#{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_name_splits_vendor_suffixes() {
        assert_eq!(snake_name("GenQueriesEXT"), "gen_queries_ext");
        assert_eq!(snake_name("GetGraphicsResetStatusKHR"), "get_graphics_reset_status_khr");
        assert_eq!(
            snake_name("CreateAndConsumeTextureINTERNAL"),
            "create_and_consume_texture_internal"
        );
        assert_eq!(snake_name("TraceBeginCHROMIUM"), "trace_begin_chromium");
    }

    #[test]
    fn snake_name_keeps_digit_runs_together() {
        assert_eq!(snake_name("TexStorage2D"), "tex_storage_2d");
        assert_eq!(snake_name("ReleaseTexImage2DCHROMIUM"), "release_tex_image_2d_chromium");
    }

    #[test]
    fn bare_suffix_is_not_stripped() {
        assert_eq!(snake_name("EXT"), "ext");
    }

    #[test]
    fn default_decoder_prefixes_do() {
        assert_eq!(default_decoder("Finish"), "do_finish");
        assert_eq!(default_decoder("EndRasterCHROMIUM"), "do_end_raster_chromium");
    }

    #[test]
    fn validator_names_for_plain_types() {
        assert_eq!(validator_field("GLState"), "gl_state");
        assert_eq!(validator_type("GLState"), "GlStateValidator");
        assert_eq!(validator_type("viz::ResourceFormat"), "VizResourceFormatValidator");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("do_finish"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("GetErrorState()->GetGLError"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(ident("type").to_string(), "r#type");
        assert_eq!(ident("target").to_string(), "target");
    }
}
