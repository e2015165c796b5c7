//! Evaluation-core error representation.
//!
//! - **`EvalErrorKind`**: the closed taxonomy of fatal evaluation failures
//! - **`PathContext`**: the path (if any) an error was raised at, for diagnostics
//! - **`EvalError`**: one struct that glues the two together
//!
//! Every evaluation failure in this crate is fatal to the surrounding compile
//! (see spec §7 "Propagation"); there is no recoverable-error variant here.
//! Layering-graph cycles are reported separately as `CompilerError::StyleLayering`
//! by the facade crate, not through this type.

use std::{error::Error, fmt};

use crate::Path;

/// The closed taxonomy of evaluator/analyzer/registry failures.
///
/// **Note:** names are CamelCase; `Display` renders a short machine-greppable
/// code rather than a full sentence, with the human explanation (if any)
/// appended by `EvalError`'s own `Display`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// Lookup into the translation found no entry for the path.
    UnknownPath,
    /// A path resolved to a graphical primitive where a scalar field was expected, or vice versa.
    WrongFieldKind,
    /// A path alias (`OptEval(EPath q)`) resolves back to itself.
    AliasCycle,
    /// Recursive evaluation exceeded `max_eval_depth` without terminating.
    CycleDepthExceeded,
    /// An `AFloat Vary` literal was reached during evaluation instead of being resolved via sampling.
    UninitializedVary,
    /// A shape constructor or other declarative-only node appeared as a sub-expression.
    InlinePrimitive,
    /// Binary-op operand types disagree, or a unary op hit a non-numeric value.
    TypeError,
    /// A `List`/`Tuple` element was not a scalar `Float`, or `Access` targeted a non-vector value.
    ElementTypeError,
    /// Division by zero.
    DomainError,
    /// A computation/objective/constraint name is not present in its registry.
    UnknownFunction,
    /// Argument arity or type did not match a registry function's declared signature.
    ArityOrTypeMismatch,
    /// A declarative-only node (`Layering`, `ObjFn`, `ConstrFn`, `AvoidFn`, `Ctor`, `PluginAccess`) was reached in an evaluation context.
    Misuse,
    /// `insert_path` targeted an existing key with override disabled.
    DuplicateInsert,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownPath => "unknown-path",
            Self::WrongFieldKind => "wrong-field-kind",
            Self::AliasCycle => "alias-cycle",
            Self::CycleDepthExceeded => "cycle-depth-exceeded",
            Self::UninitializedVary => "uninitialized-vary",
            Self::InlinePrimitive => "inline-primitive",
            Self::TypeError => "type-error",
            Self::ElementTypeError => "element-type-error",
            Self::DomainError => "domain-error",
            Self::UnknownFunction => "unknown-function",
            Self::ArityOrTypeMismatch => "arity-or-type-mismatch",
            Self::Misuse => "misuse",
            Self::DuplicateInsert => "duplicate-insert",
        })
    }
}

/// Lightweight location metadata: the path an error was raised while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathContext {
    pub path: Option<Path>,
}

/// The single struct passed around for any fatal failure inside the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: Option<String>,
    pub context: PathContext,
}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: PathContext::default(),
        }
    }
}

impl EvalError {
    /// Basic constructor (no message, no path).
    pub fn new(kind: EvalErrorKind) -> Self {
        kind.into()
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach the path being resolved when the error was raised.
    pub fn at_path(mut self, path: Path) -> Self {
        self.context.path = Some(path);
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }
        if let Some(ref path) = self.context.path {
            write!(f, " (at {path:?})")?;
        }
        Ok(())
    }
}

impl Error for EvalError {}

impl PartialEq<str> for EvalErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}
