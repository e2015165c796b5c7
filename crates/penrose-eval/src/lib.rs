//! Translation store, analyzer, sampler, evaluator, layering solver, energy
//! assembler, and state lifecycle for a constraint-based diagramming engine
//! (spec §4).
//!
//! This crate never renders, never performs gradient descent, and never
//! parses surface syntax (spec §1 "Non-goals"); it assembles the pieces an
//! external numerical optimizer and renderer consume.

pub mod analyzer;
pub mod config;
pub mod energy;
pub mod evaluator;
pub mod layering;
pub mod sampler;
pub mod state;
pub mod traits;
pub mod translation;

pub use analyzer::{
    default_fns, declared_fns, pending_paths, shape_names, shape_properties, uninitialized_paths,
    varying_paths, FnDeclKind, OPTIMIZED_VECTOR_PROPERTIES, UNOPTIMIZED_PROPERTIES,
};
pub use config::{
    BfgsParams, CanvasDims, EvalConfig, OptConfig, OptMethod, OptParams, OptStatus,
    CONSTR_WEIGHT, DEFAULT_RESAMPLE_COUNT, DEFAULT_SEED, INIT_WEIGHT, MAX_EVAL_DEPTH,
};
pub use energy::{eval_energy_for_vstate, split_fn_decls, ConstraintList};
pub use evaluator::{eval_exprs, eval_expr, eval_field_pub, EvalContext, Overlay};
pub use layering::{compute_layering, compute_layering_detailed, LayeringResult};
pub use state::{
    eval_energy, eval_energy_on, eval_translation, gen_opt_problem_and_state, resample_best,
    resample_one, State, StateBuildError,
};
pub use traits::{
    ArgVal, ComputationRegistry, ConstraintRegistry, ObjectiveRegistry, SchemaEntry, ShapeCatalog,
    TestCatalog, TestRegistries, ValueType,
};
pub use translation::Translation;
