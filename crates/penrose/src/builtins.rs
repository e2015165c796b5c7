//! Default, in-memory computation/objective/constraint registries.
//!
//! Spec §6 treats these registries as external collaborators the embedder
//! supplies; this module exists so a caller who has no registry of their own
//! yet (a demo, a doctest, a first integration) can still call [`crate::compile`]
//! and get back a usable [`State`](crate::State). The lookup tables are
//! static `once_cell::sync::Lazy` maps, the same shape the teacher crate uses
//! for its own name-indexed function registry (`formualizer-eval`'s
//! `function_registry.rs`), minus the concurrent `DashMap`: this core is
//! single-threaded by design (spec §5), so a plain `HashMap` behind a
//! `Lazy` is sufficient.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use penrose_core::{EvalError, EvalErrorKind, Value};
use penrose_eval::{ArgVal, ComputationRegistry, ConstraintRegistry, ObjectiveRegistry};
use rand::rngs::SmallRng;

type CompFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;
type ScalarFn = Arc<dyn Fn(&[Value]) -> Result<f64, EvalError> + Send + Sync>;

fn as_point(v: &Value) -> Option<(f64, f64)> {
    match v {
        Value::Point(x, y) | Value::Tuple(x, y) => Some((*x, *y)),
        Value::Vector(xs) if xs.len() == 2 => Some((xs[0], xs[1])),
        _ => None,
    }
}

fn unknown_fn(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnknownFunction).with_message(format!("unknown function `{name}`"))
}

fn arity_error(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::ArityOrTypeMismatch)
        .with_message(format!("argument arity/type mismatch calling `{name}`"))
}

static COMPUTATIONS: Lazy<HashMap<&'static str, CompFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, CompFn> = HashMap::new();
    m.insert(
        "add",
        Arc::new(|args| match args {
            [Value::Float(a), Value::Float(b)] => Ok(Value::Float(a + b)),
            _ => Err(arity_error("add")),
        }),
    );
    m.insert(
        "sub",
        Arc::new(|args| match args {
            [Value::Float(a), Value::Float(b)] => Ok(Value::Float(a - b)),
            _ => Err(arity_error("sub")),
        }),
    );
    m.insert(
        "norm",
        Arc::new(|args| match args {
            [v] if as_point(v).is_some() => {
                let (x, y) = as_point(v).unwrap();
                Ok(Value::Float((x * x + y * y).sqrt()))
            }
            _ => Err(arity_error("norm")),
        }),
    );
    m.insert(
        "dist",
        Arc::new(|args| match args {
            [a, b] if as_point(a).is_some() && as_point(b).is_some() => {
                let (ax, ay) = as_point(a).unwrap();
                let (bx, by) = as_point(b).unwrap();
                Ok(Value::Float(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()))
            }
            _ => Err(arity_error("dist")),
        }),
    );
    m
});

static OBJECTIVES: Lazy<HashMap<&'static str, ScalarFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, ScalarFn> = HashMap::new();
    // `minimize dist(A.center, B.center)` (spec §8 scenario 3).
    m.insert(
        "dist",
        Arc::new(|args| match args {
            [a, b] if as_point(a).is_some() && as_point(b).is_some() => {
                let (ax, ay) = as_point(a).unwrap();
                let (bx, by) = as_point(b).unwrap();
                Ok(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
            }
            _ => Err(arity_error("dist")),
        }),
    );
    m.insert(
        "equal",
        Arc::new(|args| match args {
            [Value::Float(a), Value::Float(b)] => Ok((a - b).powi(2)),
            _ => Err(arity_error("equal")),
        }),
    );
    m
});

static CONSTRAINTS: Lazy<HashMap<&'static str, ScalarFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, ScalarFn> = HashMap::new();
    // `c > 0` (spec §8 scenario 4): penalize the shortfall, zero once satisfied.
    m.insert(
        "greaterThanZero",
        Arc::new(|args| match args {
            [Value::Float(c)] => Ok((-*c).max(0.0)),
            _ => Err(arity_error("greaterThanZero")),
        }),
    );
    m.insert(
        "lessThan",
        Arc::new(|args| match args {
            [Value::Float(a), Value::Float(b)] => Ok((a - b).max(0.0)),
            _ => Err(arity_error("lessThan")),
        }),
    );
    m
});

/// A minimal built-in computation registry covering scalar/point arithmetic
/// (spec §6 "Function registries"). Embedders with richer needs supply their
/// own [`ComputationRegistry`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinComputations;

impl ComputationRegistry for BuiltinComputations {
    fn call(&self, name: &str, args: &[Value], rng: SmallRng) -> Result<(Value, SmallRng), EvalError> {
        let f = COMPUTATIONS.get(name).ok_or_else(|| unknown_fn(name))?;
        Ok((f(args)?, rng))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinObjectives;

impl ObjectiveRegistry for BuiltinObjectives {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError> {
        let f = OBJECTIVES.get(name).ok_or_else(|| unknown_fn(name))?;
        f(args)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinConstraints;

impl ConstraintRegistry for BuiltinConstraints {
    fn call(&self, name: &str, args: &[Value]) -> Result<f64, EvalError> {
        let f = CONSTRAINTS.get(name).ok_or_else(|| unknown_fn(name))?;
        f(args)
    }
}

/// `Val`/`Gpi` discriminant re-exported for callers that only depend on this
/// facade crate and need to match on [`penrose_eval::eval_translation`]'s
/// per-shape results without pulling in `penrose-eval` directly.
pub type EvaluatedArg = ArgVal;
