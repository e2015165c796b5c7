//! Pure traversals over a `Translation` (spec §4.2).

use penrose_core::{AnnotatedFloat, BindingForm, Expr, FieldExpr, Path, TagExpr, Value};

use crate::traits::ShapeCatalog;
use crate::translation::Translation;

/// Scalar shape properties excluded from the varying set by policy
/// (spec §3 invariants, "unoptimized property").
pub const UNOPTIMIZED_PROPERTIES: &[&str] = &[
    "rotation",
    "strokeWidth",
    "thickness",
    "transform",
    "transformation",
    "opacity",
    "finalW",
    "finalH",
    "arrowheadSize",
];

/// Vector-valued shape properties expanded element-wise when computing the
/// varying set, always exactly two components (spec §4.2, spec §9 Open
/// Questions: hard-coded to 2; we reject higher-arity schema entries for
/// these names explicitly rather than silently truncating).
pub const OPTIMIZED_VECTOR_PROPERTIES: &[&str] = &["start", "end", "center"];

fn binding_form(object: &str) -> BindingForm {
    // The analyzer only ever needs the plain name to reconstruct a `Path`
    // for output; whether it was substance- or style-bound was settled at
    // insertion time and is irrelevant to which paths are varying.
    BindingForm::Style(object.to_string())
}

/// Every free-scalar path in declaration order (spec §4.2 "Varying paths").
pub fn varying_paths(trans: &Translation, catalog: &dyn ShapeCatalog) -> Vec<Path> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        match fexpr {
            FieldExpr::Val(tag) => {
                collect_field_varying(&binding_form(object), field, tag, &mut acc);
            }
            FieldExpr::Gpi(gpi) => {
                collect_gpi_varying(&binding_form(object), field, gpi, catalog, &mut acc);
            }
        }
        acc
    })
}

fn collect_field_varying(bform: &BindingForm, field: &str, tag: &TagExpr, acc: &mut Vec<Path>) {
    match tag {
        TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary)) => {
            acc.push(Path::Field(bform.clone(), field.to_string()));
        }
        TagExpr::OptEval(Expr::Vector(elems)) => {
            for (i, e) in elems.iter().enumerate() {
                if matches!(e, Expr::AFloat(AnnotatedFloat::Vary)) {
                    acc.push(Path::Access(
                        Box::new(Path::Field(bform.clone(), field.to_string())),
                        smallvec::smallvec![i],
                    ));
                }
            }
        }
        _ => {}
    }
}

fn collect_gpi_varying(
    bform: &BindingForm,
    field: &str,
    gpi: &penrose_core::Gpi,
    catalog: &dyn ShapeCatalog,
    acc: &mut Vec<Path>,
) {
    let Some(schema) = catalog.schema(&gpi.shape_type) else {
        return;
    };
    for entry in schema {
        if !entry.value_type.is_scalar_schema() {
            continue;
        }
        if UNOPTIMIZED_PROPERTIES.contains(&entry.name.as_str()) {
            continue;
        }
        if catalog.pending(&gpi.shape_type, &entry.name) {
            continue;
        }
        let prop_path = Path::Property(bform.clone(), field.to_string(), entry.name.clone());
        match gpi.properties.get(&entry.name) {
            None => acc.push(prop_path),
            Some(TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary))) => acc.push(prop_path),
            Some(TagExpr::OptEval(Expr::Vector(elems)))
                if OPTIMIZED_VECTOR_PROPERTIES.contains(&entry.name.as_str())
                    && elems.len() == 2
                    && elems
                        .iter()
                        .all(|e| matches!(e, Expr::AFloat(AnnotatedFloat::Vary))) =>
            {
                for i in 0..2 {
                    acc.push(Path::Access(Box::new(prop_path.clone()), smallvec::smallvec![i]));
                }
            }
            _ => {}
        }
    }
}

/// Non-scalar schema properties with no dict entry yet (spec §4.2
/// "Uninitialized paths"). Disjoint from `pending_paths` by construction
/// (SPEC_FULL §4.2): a property flagged *pending* by the catalog is skipped
/// here regardless of whether the dict currently holds an entry for it.
pub fn uninitialized_paths(trans: &Translation, catalog: &dyn ShapeCatalog) -> Vec<Path> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        if let FieldExpr::Gpi(gpi) = fexpr {
            if let Some(schema) = catalog.schema(&gpi.shape_type) {
                for entry in schema {
                    if entry.name == "name" {
                        continue;
                    }
                    if entry.value_type.is_scalar_schema() {
                        continue;
                    }
                    if catalog.pending(&gpi.shape_type, &entry.name) {
                        continue;
                    }
                    if !gpi.properties.contains_key(&entry.name) {
                        acc.push(Path::Property(
                            binding_form(object),
                            field.to_string(),
                            entry.name.clone(),
                        ));
                    }
                }
            }
        }
        acc
    })
}

/// Property paths currently holding a `Pending` value (spec §4.2).
pub fn pending_paths(trans: &Translation) -> Vec<Path> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        if let FieldExpr::Gpi(gpi) = fexpr {
            for (prop, tag) in &gpi.properties {
                if tag.is_pending() {
                    acc.push(Path::Property(
                        binding_form(object),
                        field.to_string(),
                        prop.clone(),
                    ));
                }
            }
        }
        acc
    })
}

/// `"object.field"` for every graphical primitive, in declaration order.
pub fn shape_names(trans: &Translation) -> Vec<String> {
    trans.shape_names()
}

/// `(object, field, property)` triples for every GPI's property dict, in
/// declaration order.
pub fn shape_properties(trans: &Translation) -> Vec<(String, String, String)> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        if let FieldExpr::Gpi(gpi) = fexpr {
            for prop in gpi.properties.keys() {
                acc.push((object.to_string(), field.to_string(), prop.clone()));
            }
        }
        acc
    })
}

/// A declared objective or constraint call found directly on a field body.
#[derive(Debug, Clone, PartialEq)]
pub enum FnDeclKind {
    Objective(penrose_core::FnDecl),
    Constraint(penrose_core::FnDecl),
}

/// Every `ObjFn`/`ConstrFn` declared directly in the translation, in
/// declaration order (spec §4.2 "Objective/constraint declarations").
pub fn declared_fns(trans: &Translation) -> Vec<FnDeclKind> {
    trans.fold(Vec::new(), |mut acc, _object, _field, fexpr| {
        if let FieldExpr::Val(TagExpr::OptEval(expr)) = fexpr {
            match expr {
                Expr::ObjFn(decl) => acc.push(FnDeclKind::Objective(decl.clone())),
                Expr::ConstrFn(decl) => acc.push(FnDeclKind::Constraint(decl.clone())),
                _ => {}
            }
        }
        acc
    })
}

/// Default objectives/constraints contributed by each shape's catalog entry,
/// each applied to the single argument `EPath(Field(object, field))`
/// (spec §4.2 "Default functions").
pub fn default_fns(trans: &Translation, catalog: &dyn ShapeCatalog) -> Vec<FnDeclKind> {
    trans.fold(Vec::new(), |mut acc, object, field, fexpr| {
        if let FieldExpr::Gpi(gpi) = fexpr {
            let self_path = Expr::EPath(Path::Field(binding_form(object), field.to_string()));
            for name in catalog.default_objectives(&gpi.shape_type) {
                acc.push(FnDeclKind::Objective(penrose_core::FnDecl {
                    name,
                    args: vec![self_path.clone()],
                }));
            }
            for name in catalog.default_constraints(&gpi.shape_type) {
                acc.push(FnDeclKind::Constraint(penrose_core::FnDecl {
                    name,
                    args: vec![self_path.clone()],
                }));
            }
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{SchemaEntry, TestCatalog, ValueType};

    fn catalog_with_circle() -> TestCatalog {
        let mut c = TestCatalog::new();
        c.add_schema(
            "Circle",
            vec![
                SchemaEntry::new("r", ValueType::Float),
                SchemaEntry::new("center", ValueType::Vector),
                SchemaEntry::new("label", ValueType::Str),
            ],
        );
        c.set_pending("Circle", "label", true);
        c
    }

    #[test]
    fn varying_field_scalar() {
        let mut t = Translation::new();
        t.insert_path(
            &Path::Field(BindingForm::Style("x".into()), "val".into()),
            TagExpr::OptEval(Expr::AFloat(AnnotatedFloat::Vary)),
            false,
        )
        .unwrap();
        let catalog = TestCatalog::new();
        let paths = varying_paths(&t, &catalog);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn varying_and_uninitialized_are_disjoint() {
        let mut t = Translation::new();
        t.insert_gpi("C", "shape", penrose_core::Gpi::new("Circle"));
        let catalog = catalog_with_circle();
        let varying = varying_paths(&t, &catalog);
        let uninitialized = uninitialized_paths(&t, &catalog);
        assert!(varying.iter().any(|p| matches!(p, Path::Property(_, _, p) if p == "r")));
        assert!(uninitialized
            .iter()
            .any(|p| matches!(p, Path::Property(_, _, p) if p == "center")));
        for v in &varying {
            assert!(!uninitialized.contains(v));
        }
        // `label` is pending, so it must appear in neither varying nor uninitialized.
        assert!(!varying.iter().any(|p| matches!(p, Path::Property(_, _, p) if p == "label")));
        assert!(!uninitialized
            .iter()
            .any(|p| matches!(p, Path::Property(_, _, p) if p == "label")));
    }
}
