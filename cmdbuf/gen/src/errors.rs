//! Error types for the command-buffer generator.
//!
//! Each pipeline stage has its own error enum. Stages never abort on the
//! first problem; they hand every error to a [`Diagnostics`] collector and
//! the driver fails the run if anything was collected.

use std::fmt;

use cmdbuf_define::{DefineError, StrategyKind, TransferMethod};
use thiserror::Error;

/// Problems with a single parameter or argument-list string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("malformed parameter '{text}': {reason}")]
    Malformed { text: String, reason: String },

    #[error("unknown named type '{0}'")]
    UnknownNamedType(String),

    #[error("named type '{name}' is a '{expected}', not a '{found}'")]
    NamedTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
}

/// Errors found while reading the signature file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed declaration: {reason}")]
    MalformedDeclaration { line: usize, reason: String },

    #[error("line {line}: {function}: malformed parameter '{text}': {reason}")]
    MalformedParameter {
        line: usize,
        function: String,
        text: String,
        reason: String,
    },

    #[error("line {line}: {function} references unknown named type '{name}'")]
    UnknownNamedType {
        line: usize,
        function: String,
        name: String,
    },

    #[error("line {line}: {function}: named type '{name}' is a '{expected}', not a '{found}'")]
    NamedTypeMismatch {
        line: usize,
        function: String,
        name: String,
        expected: String,
        found: String,
    },

    #[error("line {line}: function '{name}' is already declared on line {first_line}")]
    DuplicateFunction {
        line: usize,
        name: String,
        first_line: usize,
    },
}

impl ParseError {
    /// Attaches the location of a parameter problem.
    pub fn from_param(line: usize, function: &str, err: ParamError) -> Self {
        let function = function.to_string();
        match err {
            ParamError::Malformed { text, reason } => Self::MalformedParameter {
                line,
                function,
                text,
                reason,
            },
            ParamError::UnknownNamedType(name) => Self::UnknownNamedType {
                line,
                function,
                name,
            },
            ParamError::NamedTypeMismatch {
                name,
                expected,
                found,
            } => Self::NamedTypeMismatch {
                line,
                function,
                name,
                expected,
                found,
            },
        }
    }
}

/// Errors found while merging signatures, overrides and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("override for '{0}' does not match any declared function")]
    UnknownFunction(String),

    #[error("{function}: invalid argument list: {source}")]
    InvalidArguments {
        function: String,
        #[source]
        source: ParamError,
    },

    #[error("{function}: no strategy matches the argument shape '{shape}'")]
    UnmatchedShape { function: String, shape: String },

    #[error("{function}: '{field}' is not allowed on {strategy} functions")]
    FieldNotAllowed {
        function: String,
        field: &'static str,
        strategy: StrategyKind,
    },

    #[error("{function}: count must be greater than zero")]
    ZeroCount { function: String },

    #[error("{function}: {strategy} functions cannot take pointer arguments")]
    PointerArguments {
        function: String,
        strategy: StrategyKind,
    },

    #[error("{function}: {strategy} results travel through shared memory, not '{method}'")]
    TransferMethod {
        function: String,
        strategy: StrategyKind,
        method: TransferMethod,
    },

    #[error("{function}: transfer method list is empty")]
    NoTransferMethod { function: String },

    #[error("{function}: immediate transfer needs exactly one pointer argument, found {count}")]
    ImmediatePointers { function: String, count: usize },

    #[error("{function}: valid_args index {index} is out of range ({count} arguments)")]
    ValidArgIndex {
        function: String,
        index: usize,
        count: usize,
    },

    #[error("{function}: generated marshaling needs the command arguments to match the declaration")]
    SignatureMismatch { function: String },

    #[error("'{first}' and '{second}' both map to method name '{method}'")]
    DuplicateMethodName {
        method: String,
        first: String,
        second: String,
    },
}

/// Errors raised while planning or emitting artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("{function}: {strategy} requires '{field}'")]
    MissingField {
        function: String,
        strategy: StrategyKind,
        field: &'static str,
    },

    #[error("{function}: decoder '{decoder}' is not a valid function name")]
    InvalidDecoder { function: String, decoder: String },

    #[error("{function}: argument '{arg}' of type '{ty}' has no wire representation")]
    NoWireRepresentation {
        function: String,
        arg: String,
        ty: String,
    },

    #[error("{function}: value '{value}' is not a valid expression")]
    InvalidLiteral { function: String, value: String },

    #[error("command collision: {0}")]
    Collision(String),
}

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    /// The protocol definition itself is invalid
    #[error("Invalid protocol definition: {0}")]
    Definition(#[from] DefineError),

    /// Generated code failed to parse
    #[error("Generated code for '{artifact}' is invalid: {message}")]
    Format { artifact: String, message: String },

    /// Failed to write output file
    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize records
    #[error("Failed to serialize records: {0}")]
    Dump(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Accumulates errors across pipeline stages.
///
/// ## Examples
///
/// ```
/// use cmdbuf_gen::errors::{Diagnostics, MergeError};
///
/// let mut diagnostics = Diagnostics::default();
/// assert!(diagnostics.is_empty());
///
/// diagnostics.push(MergeError::UnknownFunction("Missing".to_string()));
/// assert_eq!(diagnostics.len(), 1);
/// assert!(diagnostics.to_string().contains("Missing"));
/// ```
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<GeneratorError>,
}

impl Diagnostics {
    pub fn push(&mut self, err: impl Into<GeneratorError>) {
        self.errors.push(err.into());
    }

    pub fn extend<I, E>(&mut self, errs: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<GeneratorError>,
    {
        self.errors.extend(errs.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[GeneratorError] {
        &self.errors
    }

    /// Returns `value` if nothing was collected, otherwise the diagnostics.
    pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<GeneratorError> for Diagnostics {
    fn from(err: GeneratorError) -> Self {
        Self { errors: vec![err] }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.errors {
            writeln!(f, "{}", err)?;
        }
        write!(f, "{} errors", self.errors.len())
    }
}

impl std::error::Error for Diagnostics {}
