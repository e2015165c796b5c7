//! External-collaborator traits (spec §1 "out of scope", spec §6 "Upstream
//! (consumed)") plus small in-memory implementations used by this crate's
//! own tests.

use std::sync::Arc;

use penrose_core::{EvalError, Shape, Value};
use rand::rngs::SmallRng;

/// The result of evaluating a field or a property path: either a plain
/// value, or, when the path names a graphical primitive, its fully
/// evaluated shape (spec §4.4 "Contract").
#[derive(Debug, Clone, PartialEq)]
pub enum ArgVal {
    Val(Value),
    Gpi(Shape),
}

impl ArgVal {
    pub fn into_value(self) -> Result<Value, EvalError> {
        match self {
            ArgVal::Val(v) => Ok(v),
            ArgVal::Gpi(_) => Err(EvalError::new(penrose_core::EvalErrorKind::WrongFieldKind)
                .with_message("expected a scalar value, found a graphical primitive")),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ArgVal::Val(v) => Some(v),
            ArgVal::Gpi(_) => None,
        }
    }
}

/// The declared type of a schema property, used by the analyzer to decide
/// scalar-ness without inspecting a sampled value (spec §4.2, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Float,
    Int,
    Bool,
    Str,
    Color,
    Vector,
    Matrix,
    PathData,
    Polygon,
    HMatrix,
}

impl ValueType {
    pub fn is_scalar_schema(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Int)
    }
}

/// One entry in a shape type's property schema: its name, declared type, and
/// the sampler invoked when the sampler encounters an absent or `Vary`
/// entry for it (spec §4.3).
#[derive(Clone)]
pub struct SchemaEntry {
    pub name: String,
    pub value_type: ValueType,
    pub sample: Arc<dyn Fn(&mut SmallRng, f64, f64) -> Value + Send + Sync>,
}

impl std::fmt::Debug for SchemaEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaEntry")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

impl SchemaEntry {
    /// A schema entry with the default sampler for its declared type
    /// (uniform over `[0, canvas_dim]` for `Float`, `0` for `Int`, and a
    /// fixed placeholder otherwise; shape catalogs needing richer sampling
    /// supply their own via `with_sampler`).
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        let sample: Arc<dyn Fn(&mut SmallRng, f64, f64) -> Value + Send + Sync> = match value_type {
            ValueType::Float => Arc::new(|rng, w, _h| Value::Float(crate::sampler::uniform(rng, 0.0, w))),
            ValueType::Int => Arc::new(|_rng, _w, _h| Value::Int(0)),
            ValueType::Bool => Arc::new(|_rng, _w, _h| Value::Bool(false)),
            ValueType::Str => Arc::new(|_rng, _w, _h| Value::Str(String::new())),
            ValueType::Vector => Arc::new(|rng, w, h| {
                Value::Vector(vec![crate::sampler::uniform(rng, 0.0, w), crate::sampler::uniform(rng, 0.0, h)])
            }),
            ValueType::Matrix => Arc::new(|_rng, _w, _h| Value::Matrix(Vec::new())),
            ValueType::Color => Arc::new(|_rng, _w, _h| Value::Color(penrose_core::Color::Rgba(0.0, 0.0, 0.0, 1.0))),
            ValueType::PathData => Arc::new(|_rng, _w, _h| Value::PathData(Default::default())),
            ValueType::Polygon => Arc::new(|_rng, _w, _h| Value::Polygon(Default::default())),
            ValueType::HMatrix => Arc::new(|_rng, _w, _h| {
                Value::HMatrix(penrose_core::HMatrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 })
            }),
        };
        Self { name: name.into(), value_type, sample }
    }

    pub fn with_sampler(
        mut self,
        sample: impl Fn(&mut SmallRng, f64, f64) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.sample = Arc::new(sample);
        self
    }
}

/// The external shape catalog: given a shape type name, its property
/// schema, default objective/constraint names, and which properties are
/// pending (spec §6 "Shape catalog").
pub trait ShapeCatalog: Send + Sync {
    fn schema(&self, shape_type: &str) -> Option<Vec<SchemaEntry>>;
    fn default_objectives(&self, shape_type: &str) -> Vec<String>;
    fn default_constraints(&self, shape_type: &str) -> Vec<String>;
    fn pending(&self, shape_type: &str, property: &str) -> bool;
    /// A computed property: `(type, property) -> Some((arg-property-names, compute-fn))`
    /// (spec §4.4 "computed-property registry").
    fn computed_property(
        &self,
        shape_type: &str,
        property: &str,
    ) -> Option<(Vec<String>, Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>)>;
}

/// `name -> (args, rng) -> (value, rng)` (spec §6 "Function registries").
pub trait ComputationRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[Value], rng: SmallRng) -> Result<(Value, SmallRng), EvalError>;
}

pub trait ObjectiveRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError>;
}

pub trait ConstraintRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError>;
}

/// A small in-memory `ShapeCatalog` used by this crate's own tests.
#[derive(Default)]
pub struct TestCatalog {
    schemas: rustc_hash::FxHashMap<String, Vec<SchemaEntry>>,
    pending: rustc_hash::FxHashMap<(String, String), bool>,
    default_objectives: rustc_hash::FxHashMap<String, Vec<String>>,
    default_constraints: rustc_hash::FxHashMap<String, Vec<String>>,
}

impl TestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, shape_type: &str, entries: Vec<SchemaEntry>) {
        self.schemas.insert(shape_type.to_string(), entries);
    }

    pub fn set_pending(&mut self, shape_type: &str, property: &str, pending: bool) {
        self.pending
            .insert((shape_type.to_string(), property.to_string()), pending);
    }

    pub fn set_default_objectives(&mut self, shape_type: &str, names: Vec<String>) {
        self.default_objectives.insert(shape_type.to_string(), names);
    }

    pub fn set_default_constraints(&mut self, shape_type: &str, names: Vec<String>) {
        self.default_constraints.insert(shape_type.to_string(), names);
    }
}

impl ShapeCatalog for TestCatalog {
    fn schema(&self, shape_type: &str) -> Option<Vec<SchemaEntry>> {
        self.schemas.get(shape_type).cloned()
    }

    fn default_objectives(&self, shape_type: &str) -> Vec<String> {
        self.default_objectives.get(shape_type).cloned().unwrap_or_default()
    }

    fn default_constraints(&self, shape_type: &str) -> Vec<String> {
        self.default_constraints.get(shape_type).cloned().unwrap_or_default()
    }

    fn pending(&self, shape_type: &str, property: &str) -> bool {
        self.pending
            .get(&(shape_type.to_string(), property.to_string()))
            .copied()
            .unwrap_or(false)
    }

    fn computed_property(
        &self,
        _shape_type: &str,
        _property: &str,
    ) -> Option<(Vec<String>, Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>)> {
        None
    }
}

/// A small in-memory registry triple used by this crate's own tests; the
/// real deployment supplies its own registries through the same traits.
#[derive(Default)]
pub struct TestRegistries {
    computations: rustc_hash::FxHashMap<String, Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>>,
    objectives: rustc_hash::FxHashMap<String, Arc<dyn Fn(&[Value]) -> Result<f64, EvalError> + Send + Sync>>,
    constraints: rustc_hash::FxHashMap<String, Arc<dyn Fn(&[Value]) -> Result<f64, EvalError> + Send + Sync>>,
}

impl TestRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_computation(
        &mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) {
        self.computations.insert(name.to_string(), Arc::new(f));
    }

    pub fn register_objective(
        &mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<f64, EvalError> + Send + Sync + 'static,
    ) {
        self.objectives.insert(name.to_string(), Arc::new(f));
    }

    pub fn register_constraint(
        &mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<f64, EvalError> + Send + Sync + 'static,
    ) {
        self.constraints.insert(name.to_string(), Arc::new(f));
    }
}

impl ComputationRegistry for TestRegistries {
    fn call(&self, name: &str, args: &[Value], rng: SmallRng) -> Result<(Value, SmallRng), EvalError> {
        let f = self.computations.get(name).ok_or_else(|| {
            EvalError::new(penrose_core::EvalErrorKind::UnknownFunction)
                .with_message(format!("unknown computation `{name}`"))
        })?;
        Ok((f(args)?, rng))
    }
}

impl ObjectiveRegistry for TestRegistries {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError> {
        let f = self.objectives.get(name).ok_or_else(|| {
            EvalError::new(penrose_core::EvalErrorKind::UnknownFunction)
                .with_message(format!("unknown objective `{name}`"))
        })?;
        f(args)
    }
}

impl ConstraintRegistry for TestRegistries {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError> {
        let f = self.constraints.get(name).ok_or_else(|| {
            EvalError::new(penrose_core::EvalErrorKind::UnknownFunction)
                .with_message(format!("unknown constraint `{name}`"))
        })?;
        f(args)
    }
}
