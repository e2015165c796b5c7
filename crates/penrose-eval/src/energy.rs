//! The energy assembler (spec §4.6).

use penrose_core::{EvalError, Path, Value};
use rand::rngs::SmallRng;

use crate::analyzer::FnDeclKind;
use crate::config::CONSTR_WEIGHT;
use crate::evaluator::{eval_exprs, EvalContext, Overlay};
use crate::traits::{ConstraintRegistry, ObjectiveRegistry};
use crate::translation::Translation;

/// Evaluate the combined scalar energy `Σ objectives + constr_weight · w ·
/// Σ constraints` for one varying-state vector (spec §4.6).
#[allow(clippy::too_many_arguments)]
pub fn eval_energy_for_vstate(
    ctx: &EvalContext,
    objectives: &ConstraintList,
    constraints: &ConstraintList,
    varying_paths: &[Path],
    varying_state: &[f64],
    weight: f64,
    trans: &mut Translation,
    obj_registry: &dyn ObjectiveRegistry,
    constr_registry: &dyn ConstraintRegistry,
    rng: &mut SmallRng,
) -> Result<f64, EvalError> {
    let overlay: Overlay = varying_paths
        .iter()
        .cloned()
        .zip(varying_state.iter().map(|v| Value::Float(*v)))
        .collect();

    let mut objective_sum = 0.0;
    for decl in &objectives.0 {
        let args = eval_exprs(ctx, 0, crate::config::MAX_EVAL_DEPTH, &decl.args, trans, &overlay, rng)?
            .into_iter()
            .map(|a| a.into_value())
            .collect::<Result<Vec<_>, _>>()?;
        objective_sum += obj_registry.call(&decl.name, &args)?;
    }

    let mut constraint_sum = 0.0;
    for decl in &constraints.0 {
        let args = eval_exprs(ctx, 0, crate::config::MAX_EVAL_DEPTH, &decl.args, trans, &overlay, rng)?
            .into_iter()
            .map(|a| a.into_value())
            .collect::<Result<Vec<_>, _>>()?;
        constraint_sum += constr_registry.call(&decl.name, &args)?;
    }

    Ok(objective_sum + CONSTR_WEIGHT * weight * constraint_sum)
}

/// A flattened, name-only list of `FnDecl`s (objectives and constraints are
/// carried separately once harvested from `FnDeclKind` (spec §4.2's
/// left/right-tagged entries), since the energy pass sums them with
/// different weighting.
#[derive(Debug, Clone, Default)]
pub struct ConstraintList(pub Vec<penrose_core::FnDecl>);

/// Split a mixed list of `FnDeclKind` (as produced by `analyzer::declared_fns`
/// and `analyzer::default_fns`) into separate objective/constraint lists.
pub fn split_fn_decls(decls: Vec<FnDeclKind>) -> (ConstraintList, ConstraintList) {
    let mut objectives = Vec::new();
    let mut constraints = Vec::new();
    for decl in decls {
        match decl {
            FnDeclKind::Objective(d) => objectives.push(d),
            FnDeclKind::Constraint(d) => constraints.push(d),
        }
    }
    (ConstraintList(objectives), ConstraintList(constraints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{TestCatalog, TestRegistries};
    use penrose_core::{BindingForm, FnDecl};
    use rand::SeedableRng;

    #[test]
    fn energy_sums_objectives_and_weighted_constraints() {
        let catalog = TestCatalog::new();
        let mut regs = TestRegistries::new();
        regs.register_objective("dist_from_origin", |args| match args {
            [Value::Float(x)] => Ok(x.abs()),
            _ => unreachable!(),
        });
        regs.register_constraint("positive", |args| match args {
            [Value::Float(x)] => Ok((-*x).max(0.0)),
            _ => unreachable!(),
        });

        let ctx = EvalContext { catalog: &catalog, computations: &regs, plugin_data: None };
        let path = Path::Field(BindingForm::Style("x".into()), "val".into());
        let objectives = ConstraintList(vec![FnDecl {
            name: "dist_from_origin".into(),
            args: vec![penrose_core::Expr::EPath(path.clone())],
        }]);
        let constraints = ConstraintList(vec![FnDecl {
            name: "positive".into(),
            args: vec![penrose_core::Expr::EPath(path.clone())],
        }]);

        let mut trans = Translation::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let energy = eval_energy_for_vstate(
            &ctx,
            &objectives,
            &constraints,
            &[path],
            &[-2.0],
            crate::config::INIT_WEIGHT,
            &mut trans,
            &regs,
            &regs,
            &mut rng,
        )
        .unwrap();
        // objective: |-2| = 2; constraint: positive(-2) = 2, weighted by 1e4 * 1e-3 = 10.
        assert_eq!(energy, 2.0 + 10.0 * 2.0);
    }
}
