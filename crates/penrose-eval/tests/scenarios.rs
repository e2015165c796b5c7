//! Cross-cutting scenarios from spec.md §8, exercised against the crate's
//! public API the way an embedder would use it (as opposed to the
//! unit-level, single-function tests living next to each module).

use penrose_core::{AnnotatedFloat, BindingForm, Expr, FieldExpr, Gpi, Path, TagExpr, Value};
use penrose_eval::{
    analyzer, compute_layering, eval_energy_for_vstate, eval_expr, evaluator::Overlay,
    gen_opt_problem_and_state, split_fn_decls, uninitialized_paths, varying_paths, ConstraintList,
    EvalConfig, EvalContext, SchemaEntry, TestCatalog, TestRegistries, Translation, ValueType,
    CONSTR_WEIGHT, INIT_WEIGHT, MAX_EVAL_DEPTH,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn field(object: &str, name: &str) -> Path {
    Path::Field(BindingForm::Style(object.to_string()), name.to_string())
}

/// Scenario 1: a single free-scalar field and no shapes.
#[test]
fn scenario_one_field_with_one_varying_scalar() {
    let mut trans = Translation::new();
    trans
        .insert_path(&field("x", "val"), TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary)), false)
        .unwrap();
    let catalog = TestCatalog::new();
    let config = EvalConfig { canvas: penrose_eval::CanvasDims { width: 800.0, height: 700.0 }, ..EvalConfig::default() };

    let state = gen_opt_problem_and_state(trans, &config, &catalog).unwrap();
    assert_eq!(state.varying_paths, vec![field("x", "val")]);
    assert_eq!(state.varying_state.len(), 1);
    assert!(state.varying_state[0] >= 0.0 && state.varying_state[0] <= config.canvas.width);

    // No declared objectives/constraints: energy is the empty sum.
    let regs = TestRegistries::new();
    let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
    let mut eval_trans = state.translation.clone();
    let mut rng = state.rng.clone();
    let energy = eval_energy_for_vstate(
        &ctx,
        &ConstraintList::default(),
        &ConstraintList::default(),
        &state.varying_paths,
        &state.varying_state,
        state.params.weight,
        &mut eval_trans,
        &regs,
        &regs,
        &mut rng,
    )
    .unwrap();
    assert_eq!(energy, 0.0);
}

/// Scenario 2: a `Circle` shape whose scalar `r` is absent from the
/// property dict becomes a varying path and reads back the sampled value.
#[test]
fn scenario_shape_scalar_property_becomes_varying() {
    let mut trans = Translation::new();
    trans.insert_gpi("C", "shape", Gpi::new("Circle"));
    let mut catalog = TestCatalog::new();
    catalog.add_schema("Circle", vec![SchemaEntry::new("r", ValueType::Float)]);
    let config = EvalConfig::default();

    let state = gen_opt_problem_and_state(trans, &config, &catalog).unwrap();
    let r_path = Path::Property(BindingForm::Style("C".into()), "shape".into(), "r".into());
    assert!(state.varying_paths.contains(&r_path));

    let regs = TestRegistries::new();
    let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
    let mut eval_trans = state.translation.clone();
    let overlay = Overlay::default();
    let mut rng: SmallRng = state.rng.clone();
    let result = eval_expr(&ctx, 0, MAX_EVAL_DEPTH, &Expr::EPath(r_path), &mut eval_trans, &overlay, &mut rng).unwrap();
    match result {
        penrose_eval::ArgVal::Val(Value::Float(_)) => {}
        other => panic!("expected a sampled Float, got {other:?}"),
    }
}

/// Scenario 4: a constraint `c > 0` evaluated at `c = -2` contributes at
/// least `constr_weight * init_weight * 2` to the energy.
#[test]
fn scenario_constraint_shortfall_is_weighted() {
    let catalog = TestCatalog::new();
    let mut regs = TestRegistries::new();
    regs.register_constraint("greaterThanZero", |args| match args {
        [Value::Float(c)] => Ok((-*c).max(0.0)),
        _ => unreachable!(),
    });
    let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };

    let c_path = field("c", "val");
    let constraints = ConstraintList(vec![penrose_core::FnDecl {
        name: "greaterThanZero".into(),
        args: vec![Expr::EPath(c_path.clone())],
    }]);

    let mut trans = Translation::new();
    let mut rng = SmallRng::seed_from_u64(1);
    let energy = eval_energy_for_vstate(
        &ctx,
        &ConstraintList::default(),
        &constraints,
        &[c_path],
        &[-2.0],
        INIT_WEIGHT,
        &mut trans,
        &regs,
        &regs,
        &mut rng,
    )
    .unwrap();
    assert!(energy >= CONSTR_WEIGHT * INIT_WEIGHT * 2.0);
}

/// Scenario 6: `1 / 0` reachable from a varying path fails with a domain
/// error and leaves no partial memoization on the translation.
#[test]
fn scenario_division_by_zero_leaves_no_partial_memoization() {
    let catalog = TestCatalog::new();
    let regs = TestRegistries::new();
    let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };

    let path = field("x", "val");
    let expr = Expr::BinOp(
        penrose_core::BinOp::Div,
        Box::new(Expr::FloatLit(1.0)),
        Box::new(Expr::FloatLit(0.0)),
    );
    let mut trans = Translation::new();
    trans.insert_path(&path, TagExpr::OptEval(expr), false).unwrap();
    let before = trans.clone();

    let overlay = Overlay::default();
    let mut rng = SmallRng::seed_from_u64(1);
    let err =
        eval_expr(&ctx, 0, MAX_EVAL_DEPTH, &Expr::EPath(path), &mut trans, &overlay, &mut rng).unwrap_err();
    assert_eq!(err.kind, penrose_core::EvalErrorKind::DomainError);
    // The field body is still the unevaluated `OptEval`; no `Done` was written.
    assert_eq!(trans.map, before.map);
}

/// `uninitialized_paths` and `pending_paths` never name the same property
/// (SPEC_FULL §4.2).
#[test]
fn uninitialized_and_pending_are_disjoint_across_a_richer_schema() {
    let mut trans = Translation::new();
    trans.insert_gpi("T", "label", Gpi::new("Text"));
    let mut catalog = TestCatalog::new();
    catalog.add_schema(
        "Text",
        vec![
            SchemaEntry::new("w", ValueType::Float),
            SchemaEntry::new("h", ValueType::Float),
            SchemaEntry::new("bbox", ValueType::Polygon),
        ],
    );
    catalog.set_pending("Text", "w", true);
    catalog.set_pending("Text", "h", true);

    let uninit = uninitialized_paths(&trans, &catalog);
    let pending_before_sampling = analyzer::pending_paths(&trans);
    assert!(pending_before_sampling.is_empty(), "nothing sampled yet, so nothing is Pending yet");
    assert!(uninit.iter().any(|p| matches!(p, Path::Property(_, _, p) if p == "bbox")));
    assert!(!uninit.iter().any(|p| matches!(p, Path::Property(_, _, p) if p == "w" || p == "h")));
}

/// Declared `ObjFn`/`ConstrFn` field bodies are harvested in both buckets.
#[test]
fn declared_objective_and_constraint_are_split_correctly() {
    let mut trans = Translation::new();
    let obj = Expr::ObjFn(penrose_core::FnDecl { name: "dist".into(), args: vec![] });
    let constr = Expr::ConstrFn(penrose_core::FnDecl { name: "greaterThanZero".into(), args: vec![] });
    trans
        .insert_path(&field("Ob", "rule"), TagExpr::OptEval(obj), false)
        .unwrap();
    trans
        .insert_path(&field("Co", "rule"), TagExpr::OptEval(constr), false)
        .unwrap();

    let decls = penrose_eval::declared_fns(&trans);
    let (objectives, constraints) = split_fn_decls(decls);
    assert_eq!(objectives.0.len(), 1);
    assert_eq!(constraints.0.len(), 1);
    assert_eq!(objectives.0[0].name, "dist");
    assert_eq!(constraints.0[0].name, "greaterThanZero");
}

/// Acyclic layering produces a total order; a direct cycle produces none.
#[test]
fn compute_layering_none_iff_cyclic() {
    let mut trans = Translation::new();
    trans.insert_gpi("A", "shape", Gpi::new("Circle"));
    assert_eq!(compute_layering(&trans), Some(vec!["A.shape".to_string()]));

    let self_loop = Expr::Layering(
        Box::new(Expr::EPath(field("A", "shape"))),
        Box::new(Expr::EPath(field("A", "shape"))),
    );
    trans
        .map
        .entry("Ordering".into())
        .or_default()
        .insert("rule".into(), FieldExpr::Val(TagExpr::OptEval(self_loop)));
    assert_eq!(compute_layering(&trans), None);
}

/// `varying_paths` is empty when nothing is declared `vary`.
#[test]
fn no_varying_paths_when_everything_is_fixed() {
    let mut trans = Translation::new();
    trans
        .insert_path(&field("x", "val"), TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Fix(3.0))), false)
        .unwrap();
    let catalog = TestCatalog::new();
    assert!(varying_paths(&trans, &catalog).is_empty());
}
