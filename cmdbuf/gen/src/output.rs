//! Formatting and file writing for generated artifacts.
//!
//! This module handles the last two pipeline stages: turning emitted token
//! streams into source text and committing that text to disk.
//!
//! ## Safety Guarantees
//!
//! - **Validation**: Every artifact is parsed with `syn` before it is written
//! - **Formatting**: Output is rendered with `prettyplease` for consistent style
//! - **All or nothing**: Artifacts are staged in a private directory under
//!   the output directory and only renamed into place once every one of
//!   them has been written. A failed run removes its staged files and
//!   restores any output it had already replaced.

use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::codegen::Artifact;
use crate::errors::{Diagnostics, GeneratorError};

/// Notice at the top of every generated file.
pub const GENERATED_NOTICE: &str =
    "// This code was automatically generated by cmdbuf-gen. Do not edit manually.\n\n";

/// An artifact rendered to source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub content: String,
}

/// Renders the full artifact set to source text.
pub trait Formatter {
    /// Formats every artifact, reporting each one that fails.
    fn format(&self, artifacts: &[Artifact]) -> Result<Vec<RenderedArtifact>, Diagnostics>;
}

/// Formats with `prettyplease` after validating with `syn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyPleaseFormatter;

impl Formatter for PrettyPleaseFormatter {
    fn format(&self, artifacts: &[Artifact]) -> Result<Vec<RenderedArtifact>, Diagnostics> {
        let mut rendered = Vec::with_capacity(artifacts.len());
        let mut diagnostics = Diagnostics::default();

        for artifact in artifacts {
            let name = artifact.path.display().to_string();
            match validate_code(&artifact.tokens, &name) {
                Ok(file) => rendered.push(RenderedArtifact {
                    path: artifact.path.clone(),
                    content: format_code(&file),
                }),
                Err(err) => diagnostics.push(err),
            }
        }

        debug!("formatted {} artifacts", rendered.len());
        diagnostics.into_result(rendered)
    }
}

/// Validates that generated code is syntactically correct Rust.
///
/// ## Errors
///
/// Returns `GeneratorError::Format` naming `artifact` if the code fails to
/// parse.
pub fn validate_code(tokens: &TokenStream, artifact: &str) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone()).map_err(|e| GeneratorError::Format {
        artifact: artifact.to_string(),
        message: e.to_string(),
    })
}

/// Renders a parsed file with the generated-code notice prepended.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!("{}{}", GENERATED_NOTICE, formatted)
}

/// Writes every artifact under `output_dir`, or none of them.
///
/// Artifacts are first written to a private staging directory inside
/// `output_dir`. Only after all of them are staged are they renamed into
/// place. A rename failure restores every target already replaced.
///
/// ## Errors
///
/// Returns `GeneratorError::Write` if a directory cannot be created, a
/// staged file cannot be written, or a rename fails.
pub fn write_staged(output_dir: &Path, rendered: &[RenderedArtifact]) -> Result<(), GeneratorError> {
    fs::create_dir_all(output_dir).map_err(|e| write_error(output_dir, e))?;
    let mut staging = Staging::new(output_dir)?;

    for artifact in rendered {
        let target = output_dir.join(&artifact.path);
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }
        staging.stage(&artifact.content, target)?;
    }

    let count = staging.staged.len();
    staging.commit()?;
    debug!("wrote {} files to {}", count, output_dir.display());
    Ok(())
}

/// Prints every artifact instead of writing it.
pub fn print_artifacts(rendered: &[RenderedArtifact]) {
    for artifact in rendered {
        println!("=== {} ===\n{}\n", artifact.path.display(), artifact.content);
    }
}

fn write_error(path: &Path, source: std::io::Error) -> GeneratorError {
    GeneratorError::Write {
        path: path.display().to_string(),
        source,
    }
}

/// Files staged for a run. The staging directory, and anything still in
/// it, is removed on drop.
struct Staging {
    dir: TempDir,
    /// Staged file and its target, in artifact order.
    staged: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    fn new(output_dir: &Path) -> Result<Self, GeneratorError> {
        let dir = tempfile::Builder::new()
            .prefix(".cmdbuf-gen-")
            .tempdir_in(output_dir)
            .map_err(|e| write_error(output_dir, e))?;
        Ok(Self {
            dir,
            staged: Vec::new(),
        })
    }

    fn stage(&mut self, content: &str, target: PathBuf) -> Result<(), GeneratorError> {
        let staged = self.dir.path().join(format!("{}.rs", self.staged.len()));
        fs::write(&staged, content).map_err(|e| write_error(&staged, e))?;
        self.staged.push((staged, target));
        Ok(())
    }

    /// Renames every staged file over its target. Replaced targets are kept
    /// in the staging directory until the last rename succeeds.
    fn commit(self) -> Result<(), GeneratorError> {
        let mut committed = Vec::with_capacity(self.staged.len());
        for (index, (staged, target)) in self.staged.iter().enumerate() {
            match self.replace(index, staged, target) {
                Ok(backup) => committed.push((target.as_path(), backup)),
                Err(err) => {
                    roll_back(committed);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn replace(
        &self,
        index: usize,
        staged: &Path,
        target: &Path,
    ) -> Result<Option<PathBuf>, GeneratorError> {
        let backup = if target.exists() {
            let backup = self.dir.path().join(format!("{}.bak", index));
            fs::rename(target, &backup).map_err(|e| write_error(target, e))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(staged, target) {
            if let Some(backup) = &backup {
                let _ = fs::rename(backup, target);
            }
            return Err(write_error(target, e));
        }
        Ok(backup)
    }
}

/// Undoes committed renames, newest first.
fn roll_back(committed: Vec<(&Path, Option<PathBuf>)>) {
    for (target, backup) in committed.into_iter().rev() {
        let restored = match backup {
            Some(backup) => fs::rename(&backup, target),
            None => fs::remove_file(target),
        };
        if let Err(e) = restored {
            warn!("could not restore {}: {}", target.display(), e);
        }
    }
}
