//! The expression tree (spec §3 "Expression") and its storage forms
//! (`TagExpr`, `FieldExpr`).

use smallvec::SmallVec;

use crate::{Color, HMatrix, N, Path, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Indices for a vector/matrix access: almost always one or two elements, so
/// a small inline buffer avoids a heap allocation per `Access`/`VectorAccess`
/// node (mirrors the teacher crate's use of `smallvec` for small argument
/// lists, e.g. `formualizer-eval`'s lookup builtins).
pub type IndexVec = SmallVec<[usize; 2]>;

/// A float literal annotated with whether it is fixed or free (spec §3).
/// `Vary` never survives past sampling: the analyzer uses its presence to
/// discover varying paths, and the evaluator treats reaching one directly
/// as `EvalErrorKind::UninitializedVary`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotatedFloat {
    Fix(N),
    Vary,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Pos,
}

/// A declared objective or constraint function call, carrying the name an
/// external objective/constraint registry resolves and its argument
/// expressions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub args: Vec<Expr>,
}

/// The expression tree. Closed tagged union, exhaustively matched wherever
/// it is consumed (spec §9 "Tagged union dispatch").
///
/// `Shape` (the constructor for a graphical primitive) is intentionally
/// absent from this enum: spec §3 forbids a shape constructor as a
/// sub-expression, and a top-level shape is instead represented directly as
/// `FieldExpr::Gpi` in the translation, never as an `Expr` variant.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    FloatLit(N),
    StringLit(String),
    BoolLit(bool),
    AFloat(AnnotatedFloat),
    EPath(Path),
    CompApp(String, Vec<Expr>),
    ObjFn(FnDecl),
    ConstrFn(FnDecl),
    AvoidFn(FnDecl),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    UnOp(UnOp, Box<Expr>),
    List(Vec<Expr>),
    ETuple(Box<Expr>, Box<Expr>),
    Vector(Vec<Expr>),
    MatrixCtor(Vec<Vec<Expr>>),
    /// Index a vector/matrix-valued expression: `e[i]` or `e[i][j]`.
    VectorAccess(Box<Expr>, IndexVec),
    ListAccess(Box<Expr>, usize),
    /// Declares that shape `a` should render above shape `b`.
    Layering(Box<Expr>, Box<Expr>),
    /// A reference into plugin-supplied data, resolved outside plain evaluation.
    PluginAccess(String, Vec<Expr>),
    ColorLit(Color),
    HMatrixLit(HMatrix),
}

impl Expr {
    /// `true` for the small set of nodes that may only appear as a
    /// top-level field body, never nested inside another expression
    /// (spec §4.4 "misuse errors").
    pub fn is_declarative_only(&self) -> bool {
        matches!(
            self,
            Expr::Layering(..) | Expr::ObjFn(_) | Expr::ConstrFn(_) | Expr::AvoidFn(_)
        )
    }
}

/// The storage form of a single field's value (spec §3 "TagExpr").
///
/// - `Done`: an evaluated, cacheable result.
/// - `Pending`: evaluated but awaiting external substitution (e.g. label
///   dimensions from a text-measurement pass).
/// - `OptEval`: an unevaluated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TagExpr {
    Done(Value),
    Pending(Value),
    OptEval(Expr),
}

impl TagExpr {
    pub fn as_done(&self) -> Option<&Value> {
        match self {
            TagExpr::Done(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TagExpr::Pending(_))
    }
}

/// A field's stored value: either a plain scalar/vector tag, or a graphical
/// primitive carrying its own property dictionary (spec §3 "FieldExpr").
///
/// The property dict is an insertion-ordered string-keyed map, deliberately
/// not a statically typed struct, since the shape catalog and any plugin
/// extending it are data-driven (spec §9 "Dynamic property dictionary").
#[derive(Debug, Clone, PartialEq)]
pub enum FieldExpr {
    Val(TagExpr),
    Gpi(Gpi),
}

/// A graphical primitive: its type name plus an insertion-ordered property
/// dictionary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gpi {
    pub shape_type: String,
    pub properties: indexmap::IndexMap<String, TagExpr>,
}

impl Gpi {
    pub fn new(shape_type: impl Into<String>) -> Self {
        Self {
            shape_type: shape_type.into(),
            properties: indexmap::IndexMap::new(),
        }
    }
}
