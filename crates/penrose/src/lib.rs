//! Facade over [`penrose_core`] and [`penrose_eval`]: the public
//! downstream surface spec §6 names (`State`, `compile`, `eval_translation`,
//! `eval_energy`, `resample_best`) behind a single, non-optional dependency
//! edge, the way the teacher crate's top-level `formualizer` re-exports its
//! sub-crates rather than making callers depend on each one directly.

pub mod builtins;
pub mod error;

pub use error::CompilerError;

pub use penrose_core::{
    AnnotatedFloat, BinOp, BindingForm, Color, EvalError, EvalErrorKind, Expr, FieldExpr, FnDecl,
    Gpi, HMatrix, Path, PathContext, PathData, PathElem, Point, Polygon, Scalar, Shape, TagExpr,
    UnOp, Value, N,
};

pub use penrose_eval::{
    compute_layering, compute_layering_detailed, default_fns, declared_fns, eval_energy,
    eval_energy_on, eval_exprs, eval_expr, eval_translation as eval_translation_raw, pending_paths,
    resample_best, resample_one, shape_names, shape_properties, uninitialized_paths,
    varying_paths, ArgVal, BfgsParams, CanvasDims, ComputationRegistry, ConstraintList,
    ConstraintRegistry, EvalConfig, EvalContext, FnDeclKind, LayeringResult, ObjectiveRegistry,
    OptConfig, OptMethod, OptParams, OptStatus, Overlay, SchemaEntry, ShapeCatalog, State,
    StateBuildError, TestCatalog, TestRegistries, Translation, ValueType, CONSTR_WEIGHT,
    DEFAULT_RESAMPLE_COUNT, DEFAULT_SEED, INIT_WEIGHT, MAX_EVAL_DEPTH,
};

/// `compile(translation, catalog, config) -> State | CompilerError` (spec §6).
///
/// The upstream style/substance compile stage (`style_headers`, `sub_out`,
/// `style_vals` in spec §6's signature) is out of scope (spec §1): those
/// stages already ran by the time a caller has a [`Translation`] to hand in,
/// so this facade's `compile` begins one step later than the spec's sketch,
/// at the translation the upstream compiler would have produced. See
/// DESIGN.md for why `CompilerError` carries an `Eval` variant beyond the two
/// spec §6 names.
pub fn compile(
    translation: Translation,
    catalog: &dyn ShapeCatalog,
    config: &EvalConfig,
) -> Result<State, CompilerError> {
    Ok(penrose_eval::gen_opt_problem_and_state(translation, config, catalog)?)
}

/// `eval_translation(state) -> ([Shape], Translation, Rng)` (spec §6).
///
/// Thin wrapper over [`penrose_eval::eval_translation`] that also threads an
/// [`EvalContext`] built from the catalog/computation registry a caller
/// already has at hand, rather than requiring two separate imports.
pub fn eval_translation(
    state: &State,
    catalog: &dyn ShapeCatalog,
    computations: &dyn ComputationRegistry,
) -> Result<(Vec<Shape>, Translation, rand::rngs::SmallRng), EvalError> {
    let ctx = EvalContext { catalog, computations, plugin_data: None };
    eval_translation_raw(state, &ctx)
}
