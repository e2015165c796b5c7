//! End-to-end scenarios exercised through the public facade only
//! (`compile`, `eval_translation`, `resample_best`, and the built-in
//! registries), rather than the lower-level `penrose-eval` API directly.

use penrose::builtins::{BuiltinComputations, BuiltinConstraints, BuiltinObjectives};
use penrose::{
    compile, eval_energy_on, resample_best, AnnotatedFloat, BindingForm, CompilerError, EvalConfig,
    EvalContext, Expr, FnDecl, Gpi, Path, SchemaEntry, TagExpr, TestCatalog, Translation, ValueType,
};

fn field(object: &str, name: &str) -> Path {
    Path::Field(BindingForm::Style(object.to_string()), name.to_string())
}

/// Scenario 3: `minimize dist(A.center, B.center)` with both centers'
/// scalar components declared varying; evaluated at `((3,4),(0,0))` the
/// unweighted objective sum is `5` (each center assembled from its two
/// scalar fields via `ETuple` at argument-evaluation time).
#[test]
fn scenario_dist_objective_at_a_fixed_point() {
    let mut translation = Translation::new();
    for object in ["A", "B"] {
        for axis in ["cx", "cy"] {
            translation
                .insert_path(&field(object, axis), TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary)), false)
                .unwrap();
        }
    }
    let center = |object: &str| {
        Expr::ETuple(Box::new(Expr::EPath(field(object, "cx"))), Box::new(Expr::EPath(field(object, "cy"))))
    };
    translation
        .insert_path(
            &field("Ob", "rule"),
            TagExpr::OptEval(Expr::ObjFn(FnDecl { name: "dist".into(), args: vec![center("A"), center("B")] })),
            false,
        )
        .unwrap();

    let catalog = TestCatalog::new();
    let config = EvalConfig::default();
    let state = compile(translation, &catalog, &config).unwrap();
    assert_eq!(state.varying_paths.len(), 4);

    let computations = BuiltinComputations;
    let objectives = BuiltinObjectives;
    let constraints = BuiltinConstraints;
    let ctx = EvalContext { catalog: &catalog, computations: &computations, plugin_data: None };
    let energy = eval_energy_on(&state, &[3.0, 4.0, 0.0, 0.0], &ctx, &objectives, &constraints).unwrap();
    assert_eq!(energy, 5.0);
}

/// Scenario 5: a mutual layering declaration (`A.shape` above `B.shape`
/// above `A.shape`) aborts `compile` with `CompilerError::StyleLayering`.
#[test]
fn scenario_mutual_layering_aborts_compile() {
    let mut translation = Translation::new();
    translation.insert_gpi("A", "shape", Gpi::new("Circle"));
    translation.insert_gpi("B", "shape", Gpi::new("Circle"));
    let above_ab = Expr::Layering(
        Box::new(Expr::EPath(field("A", "shape"))),
        Box::new(Expr::EPath(field("B", "shape"))),
    );
    let above_ba = Expr::Layering(
        Box::new(Expr::EPath(field("B", "shape"))),
        Box::new(Expr::EPath(field("A", "shape"))),
    );
    translation
        .insert_path(&field("Ordering", "rule1"), TagExpr::OptEval(above_ab), false)
        .unwrap();
    translation
        .insert_path(&field("Ordering", "rule2"), TagExpr::OptEval(above_ba), false)
        .unwrap();

    let mut catalog = TestCatalog::new();
    catalog.add_schema("Circle", vec![SchemaEntry::new("r", ValueType::Float)]);
    let config = EvalConfig::default();

    let err = compile(translation, &catalog, &config).unwrap_err();
    assert!(matches!(err, CompilerError::StyleLayering(_)));
}

/// A constraint violation at the initial varying state pulls the energy up
/// by `constr_weight * init_weight * shortfall`, observable through the
/// facade's own `eval_energy_on`.
#[test]
fn constraint_violation_is_visible_through_the_facade() {
    let mut translation = Translation::new();
    translation
        .insert_path(&field("c", "val"), TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary)), false)
        .unwrap();
    translation
        .insert_path(
            &field("Co", "rule"),
            TagExpr::OptEval(Expr::ConstrFn(FnDecl {
                name: "greaterThanZero".into(),
                args: vec![Expr::EPath(field("c", "val"))],
            })),
            false,
        )
        .unwrap();

    let catalog = TestCatalog::new();
    let config = EvalConfig::default();
    let state = compile(translation, &catalog, &config).unwrap();

    let computations = BuiltinComputations;
    let objectives = BuiltinObjectives;
    let constraints = BuiltinConstraints;
    let ctx = EvalContext { catalog: &catalog, computations: &computations, plugin_data: None };
    let energy = eval_energy_on(&state, &[-2.0], &ctx, &objectives, &constraints).unwrap();
    assert_eq!(energy, penrose::CONSTR_WEIGHT * penrose::INIT_WEIGHT * 2.0);
}

/// `resample_best` always installs exactly one evaluated shape per declared
/// GPI and resets the optimizer status to `NewIter`.
#[test]
fn resample_best_does_not_increase_shape_count() {
    let mut translation = Translation::new();
    translation.insert_gpi("A", "dot", Gpi::new("Circle"));
    let mut catalog = TestCatalog::new();
    catalog.add_schema("Circle", vec![SchemaEntry::new("r", ValueType::Float)]);
    let config = EvalConfig::default();
    let state = compile(translation, &catalog, &config).unwrap();

    let computations = BuiltinComputations;
    let objectives = BuiltinObjectives;
    let constraints = BuiltinConstraints;
    let ctx = EvalContext { catalog: &catalog, computations: &computations, plugin_data: None };
    let resampled = resample_best(10, &state, &ctx, &objectives, &constraints).unwrap();
    assert_eq!(resampled.shapes.len(), 1);
    assert_eq!(resampled.params.status, penrose::OptStatus::NewIter);
}
