//! The evaluated-value model (spec §3 "Value") plus the scalar type `N` the
//! rest of the core is generic over.

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The scalar type used throughout sampling and evaluation.
///
/// A concrete translation can be lifted to an autodiff-capable type for the
/// energy pass (spec §9 "Deeply polymorphic scalar") by implementing `Scalar`
/// for that type and writing a total `cast : Translation<f64> -> Translation<S>`
/// over this crate's structures; `penrose-core` ships only the `f64`
/// instantiation used by sampling and plain evaluation.
pub type N = f64;

/// The arithmetic surface the evaluator and energy assembler need from a
/// scalar type. Implemented for `f64`; an external optimizer crate may
/// implement it for its own dual-number type to reuse the translation
/// machinery unchanged.
pub trait Scalar:
    Copy
    + Clone
    + PartialOrd
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + std::ops::Neg<Output = Self>
{
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    fn zero() -> Self {
        Self::from_f64(0.0)
    }
    fn powf(self, exp: Self) -> Self;
}

impl Scalar for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn powf(self, exp: Self) -> Self {
        f64::powf(self, exp)
    }
}

/// A two-component point, stored distinctly from `Tuple` because downstream
/// consumers (renderer, computation registry) key on it by name.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: N,
    pub y: N,
}

/// One element of a `PathData` sub-path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PathElem {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
    ClosePath,
}

/// A sequence of open or closed sub-paths of line/quadratic/cubic elements.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub subpaths: Vec<Vec<PathElem>>,
}

/// RGBA or HSVA, four components each.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgba(N, N, N, N),
    Hsva(N, N, N, N),
}

/// A six-component affine transform, applied the way Penrose's `HMatrix`
/// historically was: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HMatrix {
    pub a: N,
    pub b: N,
    pub c: N,
    pub d: N,
    pub e: N,
    pub f: N,
}

/// A closed 2D region (possibly with holes), plus a bounding box and sample
/// points used by collision/containment objectives and constraints.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub positive: Vec<Vec<Point>>,
    pub negative: Vec<Vec<Point>>,
    pub bbox: Option<(Point, Point)>,
    pub sample_points: Vec<Point>,
}

/// An evaluated value, as stored in a `TagExpr::Done`/`TagExpr::Pending` slot
/// or produced mid-evaluation.
///
/// Closed tagged union, exhaustively matched everywhere; no `Box<dyn Any>`
/// escape hatch (spec §9 "Tagged union dispatch").
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(N),
    Int(i64),
    Bool(bool),
    Str(String),
    Point(N, N),
    PointList(Vec<(N, N)>),
    PathData(PathData),
    Palette(Vec<Color>),
    Color(Color),
    File(String),
    Style(String),
    List(Vec<N>),
    Tuple(N, N),
    Vector(Vec<N>),
    Matrix(Vec<Vec<N>>),
    ListOfLists(Vec<Vec<N>>),
    HMatrix(HMatrix),
    Polygon(Polygon),
}

impl Value {
    /// `true` for every variant the analyzer treats as "scalar" when deciding
    /// which shape properties belong in the varying set (spec §4.2).
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Float(_) | Value::Int(_))
    }

    pub fn as_float(&self) -> Option<N> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(i) => Some(*i as N),
            _ => None,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Float(n) => n.to_bits().hash(state),
            Value::Int(i) => i.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Str(s) | Value::File(s) | Value::Style(s) => s.hash(state),
            Value::Point(x, y) => {
                x.to_bits().hash(state);
                y.to_bits().hash(state);
            }
            Value::PointList(pts) => {
                for (x, y) in pts {
                    x.to_bits().hash(state);
                    y.to_bits().hash(state);
                }
            }
            Value::PathData(_) => state.write_u8(0xA),
            Value::Palette(_) => state.write_u8(0xB),
            Value::Color(_) => state.write_u8(0xC),
            Value::List(xs) | Value::Vector(xs) => {
                for x in xs {
                    x.to_bits().hash(state);
                }
            }
            Value::Tuple(a, b) => {
                a.to_bits().hash(state);
                b.to_bits().hash(state);
            }
            Value::Matrix(rows) | Value::ListOfLists(rows) => {
                for row in rows {
                    for x in row {
                        x.to_bits().hash(state);
                    }
                }
            }
            Value::HMatrix(_) => state.write_u8(0xD),
            Value::Polygon(_) => state.write_u8(0xE),
        }
    }
}
impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(n) => write!(f, "{n}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) | Value::File(s) | Value::Style(s) => write!(f, "{s}"),
            Value::Point(x, y) => write!(f, "({x}, {y})"),
            Value::PointList(pts) => write!(f, "{pts:?}"),
            Value::PathData(_) => write!(f, "<path>"),
            Value::Palette(p) => write!(f, "<palette of {} colors>", p.len()),
            Value::Color(_) => write!(f, "<color>"),
            Value::List(xs) => write!(f, "{xs:?}"),
            Value::Tuple(a, b) => write!(f, "({a}, {b})"),
            Value::Vector(xs) => write!(f, "{xs:?}"),
            Value::Matrix(m) | Value::ListOfLists(m) => write!(f, "{m:?}"),
            Value::HMatrix(_) => write!(f, "<hmatrix>"),
            Value::Polygon(_) => write!(f, "<polygon>"),
        }
    }
}
