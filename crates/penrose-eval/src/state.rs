//! State lifecycle: initial build and resampling (spec §4.7).

use std::fmt;

use penrose_core::{BindingForm, EvalError, Gpi, Path, Shape, TagExpr, Value};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustc_hash::FxHashSet;

use crate::analyzer::{self, FnDeclKind};
use crate::config::{CanvasDims, EvalConfig, OptConfig, OptParams};
use crate::energy::{eval_energy_for_vstate, split_fn_decls, ConstraintList};
use crate::evaluator::{eval_field_pub, EvalContext, Overlay};
use crate::layering;
use crate::sampler;
use crate::traits::{ConstraintRegistry, ObjectiveRegistry, ShapeCatalog};
use crate::translation::Translation;

/// The frozen output of core initialization, and the value threaded through
/// every subsequent resample (spec §3 "State").
#[derive(Debug, Clone)]
pub struct State {
    pub shapes: Vec<Shape>,
    pub shape_paths: Vec<Path>,
    pub shape_ordering: Vec<String>,
    pub shape_properties: Vec<(String, String, String)>,
    pub translation: Translation,
    pub varying_paths: Vec<Path>,
    pub uninitialized_paths: Vec<Path>,
    pub pending_paths: Vec<Path>,
    pub varying_state: Vec<f64>,
    pub params: OptParams,
    pub obj_fns: ConstraintList,
    pub constr_fns: ConstraintList,
    pub rng: SmallRng,
    pub opt_config: OptConfig,
    pub canvas: CanvasDims,
}

/// Failures that can arise while building or resampling a `State`; distinct
/// from `EvalError` because a layering cycle is reported with the names
/// involved rather than through the evaluator's own error taxonomy
/// (spec §7 "Layering").
#[derive(Debug, Clone, PartialEq)]
pub enum StateBuildError {
    Eval(EvalError),
    LayeringCycle(Vec<String>),
}

impl From<EvalError> for StateBuildError {
    fn from(e: EvalError) -> Self {
        StateBuildError::Eval(e)
    }
}

impl fmt::Display for StateBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateBuildError::Eval(e) => write!(f, "{e}"),
            StateBuildError::LayeringCycle(names) => {
                write!(f, "layering graph has a cycle involving: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for StateBuildError {}

fn collect_shape_paths(trans: &Translation) -> Vec<Path> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        if matches!(fexpr, penrose_core::FieldExpr::Gpi(_)) {
            acc.push(Path::Field(BindingForm::Style(object.to_string()), field.to_string()));
        }
        acc
    })
}

fn read_varying_state(trans: &Translation, varying_paths: &[Path]) -> Result<Vec<f64>, EvalError> {
    varying_paths
        .iter()
        .map(|p| {
            trans
                .lookup_path(p)?
                .as_done()
                .and_then(Value::as_float)
                .ok_or_else(|| {
                    EvalError::new(penrose_core::EvalErrorKind::TypeError)
                        .with_message(format!("varying path {p} is not a sampled scalar"))
                        .at_path(p.clone())
                })
        })
        .collect()
}

/// Build the initial `State` from a freshly produced translation (spec
/// §4.7 "Initial build"). Shapes are *not* evaluated here, matching the
/// spec's explicit deferral to the renderer so that an unresolved
/// computation name is not a build-time error.
pub fn gen_opt_problem_and_state(
    mut translation: Translation,
    config: &EvalConfig,
    catalog: &dyn ShapeCatalog,
) -> Result<State, StateBuildError> {
    let mut rng = SmallRng::seed_from_u64(config.seed);

    let varying_paths = analyzer::varying_paths(&translation, catalog);
    let uninitialized_paths_before = analyzer::uninitialized_paths(&translation, catalog);

    sampler::sample_varying_fields(&mut translation, &varying_paths, &config.canvas, &mut rng);
    sampler::sample_shapes(&mut translation, catalog, &config.canvas, &mut rng);

    let pending_paths = analyzer::pending_paths(&translation);
    let shape_paths = collect_shape_paths(&translation);
    let shape_properties = analyzer::shape_properties(&translation);

    let mut decls = analyzer::declared_fns(&translation);
    decls.extend(analyzer::default_fns(&translation, catalog));
    let (obj_fns, constr_fns) = split_fn_decls(decls);

    let varying_state = read_varying_state(&translation, &varying_paths)?;

    let layering = layering::compute_layering_detailed(&translation);
    let shape_ordering = match layering.order {
        Some(order) => order,
        None => return Err(StateBuildError::LayeringCycle(layering.cycle.unwrap_or_default())),
    };

    Ok(State {
        shapes: Vec::new(),
        shape_paths,
        shape_ordering,
        shape_properties,
        translation,
        varying_paths,
        uninitialized_paths: uninitialized_paths_before,
        pending_paths,
        varying_state,
        params: OptParams::fresh(),
        obj_fns,
        constr_fns,
        rng,
        opt_config: config.opt_config.clone(),
        canvas: config.canvas,
    })
}

fn overlay_from(varying_paths: &[Path], varying_state: &[f64]) -> Overlay {
    varying_paths
        .iter()
        .cloned()
        .zip(varying_state.iter().map(|v| Value::Float(*v)))
        .collect()
}

/// Evaluate every shape path under the current varying state, returning the
/// evaluated shape list in declaration order (spec §6 `eval_translation`).
pub fn eval_translation(
    state: &State,
    ctx: &EvalContext,
) -> Result<(Vec<Shape>, Translation, SmallRng), EvalError> {
    let mut trans = state.translation.clone();
    let mut rng = state.rng.clone();
    let overlay = overlay_from(&state.varying_paths, &state.varying_state);

    let mut shapes = Vec::with_capacity(state.shape_paths.len());
    for path in &state.shape_paths {
        let Path::Field(bform, field) = path else {
            continue;
        };
        match eval_field_pub(ctx, 0, bform, field, &mut trans, &overlay, &mut rng)? {
            crate::traits::ArgVal::Gpi(shape) => shapes.push(shape),
            crate::traits::ArgVal::Val(_) => {
                return Err(EvalError::new(penrose_core::EvalErrorKind::WrongFieldKind)
                    .with_message(format!("{path} is not a graphical primitive")))
            }
        }
    }
    Ok((shapes, trans, rng))
}

/// `eval_energy(state) -> N` (spec §6), using the state's own weight and
/// varying state.
pub fn eval_energy(
    state: &State,
    ctx: &EvalContext,
    obj_registry: &dyn ObjectiveRegistry,
    constr_registry: &dyn ConstraintRegistry,
) -> Result<f64, EvalError> {
    eval_energy_on(state, &state.varying_state, ctx, obj_registry, constr_registry)
}

/// `eval_energy_on(state, vstate) -> N` (spec §6).
pub fn eval_energy_on(
    state: &State,
    vstate: &[f64],
    ctx: &EvalContext,
    obj_registry: &dyn ObjectiveRegistry,
    constr_registry: &dyn ConstraintRegistry,
) -> Result<f64, EvalError> {
    let mut trans = state.translation.clone();
    let mut rng = state.rng.clone();
    eval_energy_for_vstate(
        ctx,
        &state.obj_fns,
        &state.constr_fns,
        &state.varying_paths,
        vstate,
        state.params.weight,
        &mut trans,
        obj_registry,
        constr_registry,
        &mut rng,
    )
}

/// The set of distinct shape-property paths `varying_paths` touches,
/// collapsed from any `Access` wrapper back to the owning `Property` path,
/// used to reset those entries to `Vary` before a fresh draw.
fn reset_varying_gpi_entries(trans: &mut Translation, varying_paths: &[Path]) {
    let mut seen: FxHashSet<(String, String, String)> = FxHashSet::default();
    for path in varying_paths {
        let target = match path {
            Path::Property(b, f, p) => Some((b.name().to_string(), f.clone(), p.clone())),
            Path::Access(inner, _) => match inner.as_ref() {
                Path::Property(b, f, p) => Some((b.name().to_string(), f.clone(), p.clone())),
                _ => None,
            },
            _ => None,
        };
        let Some((object, field, prop)) = target else { continue };
        if !seen.insert((object.clone(), field.clone(), prop.clone())) {
            continue;
        }
        if let Some(fields) = trans.map.get_mut(&object) {
            if let Some(penrose_core::FieldExpr::Gpi(gpi)) = fields.get_mut(&field) {
                gpi.properties.insert(
                    prop,
                    TagExpr::OptEval(penrose_core::Expr::AFloat(penrose_core::AnnotatedFloat::Vary)),
                );
            }
        }
    }
}

/// Draw one fresh candidate: resample every shape property and varying
/// field, then read back a fresh varying-state vector (spec §4.7
/// "Resample-best", first half).
fn sample_candidate(
    state: &State,
    catalog: &dyn ShapeCatalog,
    rng: &mut SmallRng,
) -> Result<(Translation, Vec<f64>), EvalError> {
    let mut trans = state.translation.clone();
    reset_varying_gpi_entries(&mut trans, &state.varying_paths);
    sampler::sample_shapes(&mut trans, catalog, &state.canvas, rng);
    sampler::sample_varying_fields(&mut trans, &state.varying_paths, &state.canvas, rng);
    let vstate = read_varying_state(&trans, &state.varying_paths)?;
    Ok((trans, vstate))
}

/// Finish a resample draw: evaluate the chosen candidate's shapes under its
/// own varying state, adopt the evaluator's memoized translation (which now
/// carries concrete values at every previously uninitialized path derived
/// from the fresh shapes), and reset the bookkeeping a resample always resets
/// (spec §4.7 "Resample-best" / "Apply").
fn finish_resample(
    state: &State,
    ctx: &EvalContext,
    trans: Translation,
    vstate: Vec<f64>,
    rng: SmallRng,
) -> Result<State, EvalError> {
    let mut interim = State {
        translation: trans,
        varying_state: vstate,
        rng,
        params: OptParams::fresh(),
        shapes: Vec::new(),
        ..state.clone()
    };
    let (shapes, mut evaluated_trans, rng_after) = eval_translation(&interim, ctx)?;
    evaluated_trans.warnings.clear();
    interim.shapes = shapes;
    interim.translation = evaluated_trans;
    interim.rng = rng_after;
    Ok(interim)
}

/// `resample_one(state) -> state'` (spec §6): draw a single fresh candidate
/// and install it without comparing energies.
pub fn resample_one(state: &State, ctx: &EvalContext) -> Result<State, EvalError> {
    let mut rng = state.rng.clone();
    let (trans, vstate) = sample_candidate(state, ctx.catalog, &mut rng)?;
    finish_resample(state, ctx, trans, vstate, rng)
}

/// `resample_best(n, state) -> state'` (spec §6, §4.7 "Resample-best"): draw
/// `n` candidates, evaluate each one's energy, and install the smallest.
pub fn resample_best(
    n: usize,
    state: &State,
    ctx: &EvalContext,
    obj_registry: &dyn ObjectiveRegistry,
    constr_registry: &dyn ConstraintRegistry,
) -> Result<State, EvalError> {
    let mut rng = state.rng.clone();
    let mut best: Option<(Translation, Vec<f64>, f64)> = None;

    #[cfg(feature = "tracing")]
    tracing::debug!(n, "resample_best: drawing candidates");
    for draw in 0..n.max(1) {
        let (cand_trans, cand_vstate) = sample_candidate(state, ctx.catalog, &mut rng)?;
        let mut energy_trans = cand_trans.clone();
        let mut energy_rng = rng.clone();
        let energy = eval_energy_for_vstate(
            ctx,
            &state.obj_fns,
            &state.constr_fns,
            &state.varying_paths,
            &cand_vstate,
            state.params.weight,
            &mut energy_trans,
            obj_registry,
            constr_registry,
            &mut energy_rng,
        )?;
        let better = match &best {
            None => true,
            Some((_, _, best_energy)) => energy < *best_energy,
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(draw, energy, better, "resample_best candidate scored");
        if better {
            best = Some((cand_trans, cand_vstate, energy));
        }
    }

    let (trans, vstate, _) = best.expect("n.max(1) always draws at least one candidate");
    finish_resample(state, ctx, trans, vstate, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{SchemaEntry, TestCatalog, TestRegistries, ValueType};
    use penrose_core::Expr;

    fn simple_translation() -> Translation {
        let mut t = Translation::new();
        t.insert_gpi("C", "shape", Gpi::new("Circle"));
        t
    }

    fn catalog_with_r() -> TestCatalog {
        let mut c = TestCatalog::new();
        c.add_schema("Circle", vec![SchemaEntry::new("r", ValueType::Float)]);
        c
    }

    #[test]
    fn initial_build_populates_varying_state() {
        let catalog = catalog_with_r();
        let config = EvalConfig::default();
        let state = gen_opt_problem_and_state(simple_translation(), &config, &catalog).unwrap();
        assert_eq!(state.varying_state.len(), state.varying_paths.len());
        assert!(!state.varying_paths.is_empty());
    }

    #[test]
    fn resample_is_deterministic_given_same_seed() {
        let catalog = catalog_with_r();
        let config = EvalConfig::default();
        let state1 = gen_opt_problem_and_state(simple_translation(), &config, &catalog).unwrap();
        let state2 = gen_opt_problem_and_state(simple_translation(), &config, &catalog).unwrap();
        let regs = TestRegistries::new();
        let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
        let r1 = resample_best(5, &state1, &ctx, &regs, &regs).unwrap();
        let r2 = resample_best(5, &state2, &ctx, &regs, &regs).unwrap();
        assert_eq!(r1.varying_state, r2.varying_state);
        assert_eq!(r1.shapes, r2.shapes);
    }

    #[test]
    fn resample_best_installs_evaluated_shapes() {
        let catalog = catalog_with_r();
        let config = EvalConfig::default();
        let state = gen_opt_problem_and_state(simple_translation(), &config, &catalog).unwrap();
        assert!(state.shapes.is_empty(), "initial build defers shape evaluation");

        let regs = TestRegistries::new();
        let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
        let resampled = resample_best(3, &state, &ctx, &regs, &regs).unwrap();
        assert_eq!(resampled.shapes.len(), 1);
        assert_eq!(resampled.shapes[0].name(), Some("C.shape"));
        assert!(resampled.translation.warnings.is_empty());
        assert_eq!(resampled.params.weight, crate::config::INIT_WEIGHT);
    }

    #[test]
    fn resample_one_also_evaluates_shapes() {
        let catalog = catalog_with_r();
        let config = EvalConfig::default();
        let state = gen_opt_problem_and_state(simple_translation(), &config, &catalog).unwrap();
        let regs = TestRegistries::new();
        let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
        let resampled = resample_one(&state, &ctx).unwrap();
        assert_eq!(resampled.shapes.len(), 1);
    }

    /// spec §8's testable property for `resample_best`: across `n` draws,
    /// the state it installs has energy equal to the minimum independently
    /// recomputed over every candidate it drew, not merely a candidate that
    /// happens to pass the shape-count/status checks above. Catches a
    /// regression that flips the `energy < *best_energy` comparison.
    #[test]
    fn resample_best_installs_the_minimum_energy_candidate() {
        let val_path = Path::Field(BindingForm::Style("c".into()), "val".into());
        let mut translation = Translation::new();
        translation
            .insert_path(&val_path, TagExpr::OptEval(Expr::AFloat(penrose_core::AnnotatedFloat::Vary)), false)
            .unwrap();
        translation
            .insert_path(
                &Path::Field(BindingForm::Style("Ob".into()), "rule".into()),
                TagExpr::OptEval(Expr::ObjFn(penrose_core::FnDecl {
                    name: "value".into(),
                    args: vec![Expr::EPath(val_path.clone())],
                })),
                false,
            )
            .unwrap();

        let catalog = TestCatalog::new();
        let config = EvalConfig::default();
        let state = gen_opt_problem_and_state(translation, &config, &catalog).unwrap();

        let mut regs = TestRegistries::new();
        regs.register_objective("value", |args| match args {
            [Value::Float(x)] => Ok(*x),
            _ => unreachable!(),
        });
        let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };

        const N: usize = 6;
        let mut rng = state.rng.clone();
        let mut energies = Vec::with_capacity(N);
        for _ in 0..N {
            let (cand_trans, cand_vstate) = sample_candidate(&state, ctx.catalog, &mut rng).unwrap();
            let mut energy_trans = cand_trans;
            let mut energy_rng = rng.clone();
            let energy = eval_energy_for_vstate(
                &ctx,
                &state.obj_fns,
                &state.constr_fns,
                &state.varying_paths,
                &cand_vstate,
                state.params.weight,
                &mut energy_trans,
                &regs,
                &regs,
                &mut energy_rng,
            )
            .unwrap();
            energies.push(energy);
        }
        let min_energy = energies.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(
            energies.iter().any(|&e| e != min_energy),
            "candidates must be distinguishable for this test to mean anything"
        );

        let resampled = resample_best(N, &state, &ctx, &regs, &regs).unwrap();
        let installed_energy = eval_energy_on(&resampled, &resampled.varying_state, &ctx, &regs, &regs).unwrap();
        assert_eq!(installed_energy, min_energy);
    }

    #[test]
    fn layering_cycle_is_reported() {
        let mut t = simple_translation();
        t.insert_gpi("D", "shape", Gpi::new("Circle"));
        let e1 = Expr::Layering(
            Box::new(Expr::EPath(Path::Field(BindingForm::Style("C".into()), "shape".into()))),
            Box::new(Expr::EPath(Path::Field(BindingForm::Style("D".into()), "shape".into()))),
        );
        let e2 = Expr::Layering(
            Box::new(Expr::EPath(Path::Field(BindingForm::Style("D".into()), "shape".into()))),
            Box::new(Expr::EPath(Path::Field(BindingForm::Style("C".into()), "shape".into()))),
        );
        t.map
            .entry("Ordering".into())
            .or_default()
            .insert("r1".into(), penrose_core::FieldExpr::Val(TagExpr::OptEval(e1)));
        t.map
            .entry("Ordering".into())
            .or_default()
            .insert("r2".into(), penrose_core::FieldExpr::Val(TagExpr::OptEval(e2)));
        let catalog = catalog_with_r();
        let config = EvalConfig::default();
        let err = gen_opt_problem_and_state(t, &config, &catalog).unwrap_err();
        assert!(matches!(err, StateBuildError::LayeringCycle(_)));
    }
}
