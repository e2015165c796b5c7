//! The layering solver (spec §4.5).

use penrose_core::{BindingForm, Expr, FieldExpr, Path, TagExpr};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::translation::Translation;

/// Internal, richer result so a caller can name the cycle instead of just
/// reporting that one exists (SPEC_FULL §4.5). The public surface described
/// in spec §6 is `compute_layering(trans) -> Option<Vec<String>>`, kept
/// byte-for-byte below; this struct only backs it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeringResult {
    pub order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Resolve a field body down to the shape name it ultimately denotes,
/// following `OptEval(EPath q)` aliases and failing on a self-loop
/// (spec §4.5 first paragraph).
fn resolve_shape_name(trans: &Translation, path: &Path, seen: &mut FxHashSet<String>) -> Option<String> {
    let field_path = path.field_path();
    let Path::Field(bform, field) = &field_path else {
        return None;
    };
    let key = format!("{}.{}", bform.name(), field);
    if !seen.insert(key.clone()) {
        return None;
    }
    match trans.map.get(bform.name()).and_then(|fs| fs.get(field)) {
        Some(FieldExpr::Gpi(_)) => Some(key),
        Some(FieldExpr::Val(TagExpr::OptEval(Expr::EPath(inner)))) => resolve_shape_name(trans, inner, seen),
        _ => None,
    }
}

/// Collect every `Layering(a, b)` declaration in the translation and resolve
/// both sides to shape names (spec §4.5).
fn layering_edges(trans: &Translation) -> Option<Vec<(String, String)>> {
    let mut edges = Vec::new();
    for (object, fields) in &trans.map {
        for (field, fexpr) in fields {
            if let FieldExpr::Val(TagExpr::OptEval(Expr::Layering(a, b))) = fexpr {
                let _ = (object, field);
                let mut seen_a = FxHashSet::default();
                let mut seen_b = FxHashSet::default();
                let name_a = resolve_path_expr(trans, a, &mut seen_a)?;
                let name_b = resolve_path_expr(trans, b, &mut seen_b)?;
                edges.push((name_a, name_b));
            }
        }
    }
    Some(edges)
}

fn resolve_path_expr(trans: &Translation, expr: &Expr, seen: &mut FxHashSet<String>) -> Option<String> {
    match expr {
        Expr::EPath(p) => resolve_shape_name(trans, p, seen),
        _ => None,
    }
}

/// Build the DAG over every shape name, detect cycles (any SCC of size > 1,
/// or a self-loop), and return a deterministic topological order otherwise
/// (spec §4.5).
pub fn compute_layering_detailed(trans: &Translation) -> LayeringResult {
    let nodes = trans.shape_names();
    let Some(edges) = layering_edges(trans) else {
        return LayeringResult { order: None, cycle: None };
    };

    let mut adjacency: FxHashMap<String, Vec<String>> = FxHashMap::default();
    let mut indegree: FxHashMap<String, usize> = FxHashMap::default();
    for n in &nodes {
        adjacency.entry(n.clone()).or_default();
        indegree.entry(n.clone()).or_insert(0);
    }
    for (a, b) in &edges {
        if a == b {
            return LayeringResult { order: None, cycle: Some(vec![a.clone()]) };
        }
        adjacency.entry(a.clone()).or_default().push(b.clone());
        *indegree.entry(b.clone()).or_insert(0) += 1;
        indegree.entry(a.clone()).or_insert(0);
    }

    // Kahn's algorithm; ties broken by first-declaration order of `nodes`
    // for determinism (spec §4.5 "Tie-break").
    let position: FxHashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut ready: Vec<String> = nodes
        .iter()
        .filter(|n| indegree.get(n.as_str()).copied().unwrap_or(0) == 0)
        .cloned()
        .collect();
    ready.sort_by_key(|n| position.get(n.as_str()).copied().unwrap_or(usize::MAX));

    let mut order = Vec::with_capacity(nodes.len());
    let mut indegree_mut = indegree.clone();
    while let Some(next_idx) = ready
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| position.get(n.as_str()).copied().unwrap_or(usize::MAX))
        .map(|(i, _)| i)
    {
        let n = ready.remove(next_idx);
        order.push(n.clone());
        if let Some(succs) = adjacency.get(&n) {
            for succ in succs {
                if let Some(d) = indegree_mut.get_mut(succ) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(succ.clone());
                    }
                }
            }
        }
    }

    if order.len() == nodes.len() {
        LayeringResult { order: Some(order), cycle: None }
    } else {
        let remaining: Vec<String> = nodes
            .iter()
            .filter(|n| !order.contains(n))
            .cloned()
            .collect();
        LayeringResult { order: None, cycle: Some(remaining) }
    }
}

/// The public entry point named in spec §6: `compute_layering(trans) ->
/// Option<Vec<ShapeName>>`.
pub fn compute_layering(trans: &Translation) -> Option<Vec<String>> {
    compute_layering_detailed(trans).order
}
