//! The recursive expression evaluator (spec §4.4).

use indexmap::IndexMap;
use penrose_core::{
    AnnotatedFloat, BinOp, BindingForm, Expr, EvalError, EvalErrorKind, FieldExpr, Gpi, Path,
    Shape, TagExpr, UnOp, Value,
};
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

use crate::traits::{ArgVal, ComputationRegistry, ShapeCatalog};
use crate::translation::Translation;

/// The varying-value overlay: paths the optimizer currently controls,
/// authoritative over whatever the translation holds for them for the
/// duration of one evaluation pass (spec §4.4 "Variable overlay").
pub type Overlay = FxHashMap<Path, Value>;

/// Bundles the external collaborators a full evaluation pass needs, plus the
/// optional plugin-data map `EPath`/`PluginAccess` nodes may consult
/// (SPEC_FULL §4.4, always `None` in this crate; resolving `PluginAccess`
/// against it is future work).
pub struct EvalContext<'a> {
    pub catalog: &'a dyn ShapeCatalog,
    pub computations: &'a dyn ComputationRegistry,
    pub plugin_data: Option<&'a FxHashMap<String, Value>>,
}

struct Frame<'a> {
    ctx: &'a EvalContext<'a>,
    trans: &'a mut Translation,
    overlay: &'a Overlay,
    rng: &'a mut SmallRng,
    max_depth: u32,
}

/// Evaluate a single expression at a given recursion depth (spec §4.4
/// "Contract"). `trans` and `rng` are threaded explicitly via `&mut` rather
/// than by return value: the single-threaded, single-owner form the design
/// notes call out as simplest (spec §9 "Cyclic expression graph").
pub fn eval_expr(
    ctx: &EvalContext,
    depth: u32,
    max_depth: u32,
    expr: &Expr,
    trans: &mut Translation,
    overlay: &Overlay,
    rng: &mut SmallRng,
) -> Result<ArgVal, EvalError> {
    let mut frame = Frame { ctx, trans, overlay, rng, max_depth };
    eval(&mut frame, depth, expr)
}

/// Batch variant: evaluate every expression left-to-right, threading
/// `trans`/`rng` sequentially, returning results in input order
/// (spec §4.4 "Batch variant").
pub fn eval_exprs(
    ctx: &EvalContext,
    depth: u32,
    max_depth: u32,
    exprs: &[Expr],
    trans: &mut Translation,
    overlay: &Overlay,
    rng: &mut SmallRng,
) -> Result<Vec<ArgVal>, EvalError> {
    let mut out = Vec::with_capacity(exprs.len());
    for e in exprs {
        out.push(eval_expr(ctx, depth, max_depth, e, trans, overlay, rng)?);
    }
    Ok(out)
}

fn check_depth(depth: u32, max_depth: u32) -> Result<(), EvalError> {
    if depth >= max_depth {
        #[cfg(feature = "tracing")]
        tracing::debug!(depth, max_depth, "cycle depth exceeded");
        return Err(EvalError::new(EvalErrorKind::CycleDepthExceeded)
            .with_message(format!("exceeded max_eval_depth = {max_depth}")));
    }
    Ok(())
}

fn eval(frame: &mut Frame, depth: u32, expr: &Expr) -> Result<ArgVal, EvalError> {
    check_depth(depth, frame.max_depth)?;
    match expr {
        Expr::IntLit(i) => Ok(ArgVal::Val(Value::Int(*i))),
        Expr::FloatLit(n) => Ok(ArgVal::Val(Value::Float(*n))),
        Expr::StringLit(s) => Ok(ArgVal::Val(Value::Str(s.clone()))),
        Expr::BoolLit(b) => Ok(ArgVal::Val(Value::Bool(*b))),
        Expr::AFloat(AnnotatedFloat::Fix(n)) => Ok(ArgVal::Val(Value::Float(*n))),
        Expr::AFloat(AnnotatedFloat::Vary) => {
            Err(EvalError::new(EvalErrorKind::UninitializedVary)
                .with_message("reached an unsampled `vary` literal"))
        }
        Expr::EPath(path) => eval_path(frame, depth, path),
        Expr::UnOp(op, inner) => eval_unop(frame, depth, *op, inner),
        Expr::BinOp(op, lhs, rhs) => eval_binop(frame, depth, *op, lhs, rhs),
        Expr::List(elems) => {
            let mut xs = Vec::with_capacity(elems.len());
            for e in elems {
                let v = eval(frame, depth + 1, e)?.into_value()?;
                match v.as_float() {
                    Some(n) if matches!(v, Value::Float(_)) => xs.push(n),
                    _ => {
                        return Err(EvalError::new(EvalErrorKind::ElementTypeError)
                            .with_message("list element is not a Float"))
                    }
                }
            }
            Ok(ArgVal::Val(Value::List(xs)))
        }
        Expr::ETuple(a, b) => {
            let va = eval(frame, depth + 1, a)?.into_value()?;
            let vb = eval(frame, depth + 1, b)?.into_value()?;
            match (va, vb) {
                (Value::Float(x), Value::Float(y)) => Ok(ArgVal::Val(Value::Tuple(x, y))),
                _ => Err(EvalError::new(EvalErrorKind::ElementTypeError)
                    .with_message("tuple elements must be Float")),
            }
        }
        Expr::Vector(elems) => {
            let mut xs = Vec::with_capacity(elems.len());
            for e in elems {
                let v = eval(frame, depth + 1, e)?.into_value()?;
                match v {
                    Value::Float(n) => xs.push(n),
                    _ => {
                        return Err(EvalError::new(EvalErrorKind::ElementTypeError)
                            .with_message("vector element is not a Float"))
                    }
                }
            }
            Ok(ArgVal::Val(Value::Vector(xs)))
        }
        Expr::MatrixCtor(rows) => {
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let mut r = Vec::with_capacity(row.len());
                for e in row {
                    let v = eval(frame, depth + 1, e)?.into_value()?;
                    match v {
                        Value::Float(n) => r.push(n),
                        _ => {
                            return Err(EvalError::new(EvalErrorKind::ElementTypeError)
                                .with_message("matrix element is not a Float"))
                        }
                    }
                }
                out.push(r);
            }
            Ok(ArgVal::Val(Value::Matrix(out)))
        }
        Expr::VectorAccess(inner, idx) => {
            let v = eval(frame, depth + 1, inner)?.into_value()?;
            crate::translation::access_value(&v, idx)
                .map(ArgVal::Val)
                .ok_or_else(|| {
                    EvalError::new(EvalErrorKind::ElementTypeError)
                        .with_message(format!("cannot access {idx:?}"))
                })
        }
        Expr::ListAccess(inner, i) => {
            let v = eval(frame, depth + 1, inner)?.into_value()?;
            crate::translation::access_value(&v, &[*i])
                .map(ArgVal::Val)
                .ok_or_else(|| {
                    EvalError::new(EvalErrorKind::ElementTypeError)
                        .with_message(format!("cannot access index {i}"))
                })
        }
        Expr::CompApp(name, args) => {
            let mut vals = Vec::with_capacity(args.len());
            for a in args {
                vals.push(eval(frame, depth + 1, a)?.into_value()?);
            }
            let taken_rng = frame.rng.clone();
            let (result, new_rng) = frame.ctx.computations.call(name, &vals, taken_rng)?;
            *frame.rng = new_rng;
            Ok(ArgVal::Val(result))
        }
        Expr::ColorLit(c) => Ok(ArgVal::Val(Value::Color(*c))),
        Expr::HMatrixLit(m) => Ok(ArgVal::Val(Value::HMatrix(*m))),
        Expr::Layering(..) | Expr::ObjFn(_) | Expr::ConstrFn(_) | Expr::AvoidFn(_) => {
            Err(EvalError::new(EvalErrorKind::Misuse)
                .with_message("declarative-only node reached in an evaluation context"))
        }
        Expr::PluginAccess(name, _args) => match frame.ctx.plugin_data.and_then(|m| m.get(name)) {
            Some(v) => Ok(ArgVal::Val(v.clone())),
            None => Err(EvalError::new(EvalErrorKind::Misuse)
                .with_message(format!("no plugin data supplied for `{name}`"))),
        },
    }
}

fn eval_unop(frame: &mut Frame, depth: u32, op: UnOp, inner: &Expr) -> Result<ArgVal, EvalError> {
    let v = eval(frame, depth + 1, inner)?.into_value()?;
    match (op, &v) {
        (UnOp::Neg, Value::Float(n)) => Ok(ArgVal::Val(Value::Float(-n))),
        (UnOp::Neg, Value::Int(i)) => Ok(ArgVal::Val(Value::Int(-i))),
        (UnOp::Pos, Value::Float(_) | Value::Int(_)) => Ok(ArgVal::Val(v)),
        _ => Err(EvalError::new(EvalErrorKind::TypeError)
            .with_message("unary operator applied to a non-numeric value")),
    }
}

fn eval_binop(frame: &mut Frame, depth: u32, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<ArgVal, EvalError> {
    let a = eval(frame, depth + 1, lhs)?.into_value()?;
    let b = eval(frame, depth + 1, rhs)?.into_value()?;
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => apply_binop_f64(op, x, y).map(Value::Float).map(ArgVal::Val),
        (Value::Int(x), Value::Int(y)) => apply_binop_i64(op, x, y).map(ArgVal::Val),
        _ => Err(EvalError::new(EvalErrorKind::TypeError)
            .with_message("binary operator operands must both be Float or both be Int")),
    }
}

fn apply_binop_f64(op: BinOp, x: f64, y: f64) -> Result<f64, EvalError> {
    match op {
        BinOp::Add => Ok(x + y),
        BinOp::Sub => Ok(x - y),
        BinOp::Mul => Ok(x * y),
        BinOp::Div => {
            if y == 0.0 {
                Err(EvalError::new(EvalErrorKind::DomainError).with_message("division by zero"))
            } else {
                Ok(x / y)
            }
        }
        BinOp::Exp => Ok(x.powf(y)),
    }
}

fn apply_binop_i64(op: BinOp, x: i64, y: i64) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => Ok(Value::Int(x + y)),
        BinOp::Sub => Ok(Value::Int(x - y)),
        BinOp::Mul => Ok(Value::Int(x * y)),
        BinOp::Div => {
            if y == 0 {
                Err(EvalError::new(EvalErrorKind::DomainError).with_message("division by zero"))
            } else {
                Ok(Value::Int(x / y))
            }
        }
        BinOp::Exp => {
            if y < 0 {
                Err(EvalError::new(EvalErrorKind::DomainError)
                    .with_message("negative exponent on an Int power"))
            } else {
                Ok(Value::Int(x.pow(y as u32)))
            }
        }
    }
}

fn eval_path(frame: &mut Frame, depth: u32, path: &Path) -> Result<ArgVal, EvalError> {
    if let Some(v) = frame.overlay.get(path) {
        return Ok(ArgVal::Val(v.clone()));
    }
    match path {
        Path::Field(bform, field) => eval_field(frame, depth, bform, field),
        Path::Property(bform, field, prop) => {
            eval_property(frame, depth, bform, field, prop).map(ArgVal::Val)
        }
        Path::Access(inner, idx) => {
            let v = eval_path(frame, depth, inner)?.into_value()?;
            crate::translation::access_value(&v, idx)
                .map(ArgVal::Val)
                .ok_or_else(|| {
                    EvalError::new(EvalErrorKind::ElementTypeError)
                        .with_message(format!("cannot access {idx:?}"))
                        .at_path((**inner).clone())
                })
        }
        Path::LocalVar(v) => Err(EvalError::new(EvalErrorKind::UnknownPath)
            .with_message(format!("local var ${v} is not bound"))),
    }
}

fn eval_field(frame: &mut Frame, depth: u32, bform: &BindingForm, field: &str) -> Result<ArgVal, EvalError> {
    let fexpr = frame.trans.lookup_field(bform.name(), field)?.clone();
    match fexpr {
        FieldExpr::Val(tag) => eval_tag(frame, depth, &Path::Field(bform.clone(), field.to_string()), &tag),
        FieldExpr::Gpi(gpi) => eval_gpi(frame, depth, bform, field, &gpi),
    }
}

/// Public entry point for evaluating a single `Field` path directly, used by
/// `state::eval_translation` to evaluate each declared shape path in turn
/// without going through a full `Expr::EPath` node.
pub fn eval_field_pub(
    ctx: &EvalContext,
    depth: u32,
    bform: &BindingForm,
    field: &str,
    trans: &mut Translation,
    overlay: &Overlay,
    rng: &mut SmallRng,
) -> Result<ArgVal, EvalError> {
    let mut frame = Frame { ctx, trans, overlay, rng, max_depth: crate::config::MAX_EVAL_DEPTH };
    eval_field(&mut frame, depth, bform, field)
}

/// Resolve a scalar `TagExpr`, recursing through `OptEval`, memoizing on a
/// successful `Val` result, and propagating an alias's `Gpi` without
/// memoizing (spec §4.4 "Memoization").
fn eval_tag(frame: &mut Frame, depth: u32, path: &Path, tag: &TagExpr) -> Result<ArgVal, EvalError> {
    match tag {
        TagExpr::Done(v) | TagExpr::Pending(v) => Ok(ArgVal::Val(v.clone())),
        // A field whose body is `OptEval(EPath q)` is a path synonym for `q`;
        // `q == path` is the degenerate self-alias, which must fail loudly
        // rather than recurse until the depth bound trips (spec §4.1
        // "Path-synonym resolution").
        TagExpr::OptEval(Expr::EPath(q)) if q == path => Err(EvalError::new(EvalErrorKind::AliasCycle)
            .with_message(format!("{path} aliases itself"))
            .at_path(path.clone())),
        TagExpr::OptEval(inner) => match eval(frame, depth + 1, inner)? {
            ArgVal::Val(v) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(%path, value = %v, "memoizing evaluated field");
                frame.trans.memoize(path, v.clone())?;
                Ok(ArgVal::Val(v))
            }
            ArgVal::Gpi(shape) => Ok(ArgVal::Gpi(shape)),
        },
    }
}

fn eval_gpi(frame: &mut Frame, depth: u32, bform: &BindingForm, field: &str, gpi: &Gpi) -> Result<ArgVal, EvalError> {
    let mut out = IndexMap::with_capacity(gpi.properties.len());
    for prop in gpi.properties.keys() {
        let v = eval_property(frame, depth, bform, field, prop)?;
        out.insert(prop.clone(), v);
    }
    out.insert(
        "name".to_string(),
        Value::Str(format!("{}.{field}", bform.name())),
    );
    Ok(ArgVal::Gpi(Shape { shape_type: gpi.shape_type.clone(), properties: out }))
}

fn eval_property(
    frame: &mut Frame,
    depth: u32,
    bform: &BindingForm,
    field: &str,
    prop: &str,
) -> Result<Value, EvalError> {
    if let Some(v) = frame
        .overlay
        .get(&Path::Property(bform.clone(), field.to_string(), prop.to_string()))
    {
        return Ok(v.clone());
    }
    let shape_type = match frame.trans.lookup_field(bform.name(), field)? {
        FieldExpr::Gpi(gpi) => gpi.shape_type.clone(),
        FieldExpr::Val(_) => {
            return Err(EvalError::new(EvalErrorKind::WrongFieldKind)
                .with_message(format!("{}.{field} is not a graphical primitive", bform.name())))
        }
    };
    if let Some((arg_names, compute)) = frame.ctx.catalog.computed_property(&shape_type, prop) {
        let mut args = Vec::with_capacity(arg_names.len());
        for arg_name in &arg_names {
            args.push(eval_property(frame, depth + 1, bform, field, arg_name)?);
        }
        return compute(&args);
    }
    let tag = match frame.trans.lookup_field(bform.name(), field)? {
        FieldExpr::Gpi(gpi) => gpi.properties.get(prop).cloned().ok_or_else(|| {
            EvalError::new(EvalErrorKind::UnknownPath)
                .with_message(format!("no property {}.{field}.{prop}", bform.name()))
        })?,
        FieldExpr::Val(_) => unreachable!("checked above"),
    };
    let path = Path::Property(bform.clone(), field.to_string(), prop.to_string());
    match eval_tag(frame, depth, &path, &tag)? {
        ArgVal::Val(v) => Ok(v),
        ArgVal::Gpi(_) => Err(EvalError::new(EvalErrorKind::WrongFieldKind)
            .with_message(format!("{}.{field}.{prop} aliases a graphical primitive", bform.name()))),
    }
}
