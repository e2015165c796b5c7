//! The translation store (spec §4.1).

use indexmap::IndexMap;
use penrose_core::{EvalError, EvalErrorKind, FieldExpr, Gpi, Path, TagExpr};

/// The two-level mapping *object-name → field-name → field-expression*, plus
/// accumulated non-fatal warnings.
///
/// Iteration order over objects and, within an object, over fields is
/// insertion order (`IndexMap`), so every analyzer fold is deterministic
/// across runs without an explicit sort (spec §4.2 "Output order").
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub map: IndexMap<String, IndexMap<String, FieldExpr>>,
    pub warnings: Vec<String>,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a `Field` or `Property` path down to its `FieldExpr`, without
    /// following `OptEval(EPath ..)` aliases; that is the evaluator's job.
    pub fn lookup_field(&self, object: &str, field: &str) -> Result<&FieldExpr, EvalError> {
        self.map
            .get(object)
            .and_then(|fields| fields.get(field))
            .ok_or_else(|| {
                EvalError::new(EvalErrorKind::UnknownPath)
                    .with_message(format!("no field {object}.{field}"))
            })
    }

    fn lookup_field_mut(&mut self, object: &str, field: &str) -> Result<&mut FieldExpr, EvalError> {
        self.map
            .get_mut(object)
            .and_then(|fields| fields.get_mut(field))
            .ok_or_else(|| {
                EvalError::new(EvalErrorKind::UnknownPath)
                    .with_message(format!("no field {object}.{field}"))
            })
    }

    /// Resolve a `Property` path to its `TagExpr`, failing if the field is
    /// not a graphical primitive.
    pub fn lookup_property(
        &self,
        object: &str,
        field: &str,
        property: &str,
    ) -> Result<&TagExpr, EvalError> {
        match self.lookup_field(object, field)? {
            FieldExpr::Gpi(gpi) => gpi.properties.get(property).ok_or_else(|| {
                EvalError::new(EvalErrorKind::UnknownPath)
                    .with_message(format!("no property {object}.{field}.{property}"))
            }),
            FieldExpr::Val(_) => Err(EvalError::new(EvalErrorKind::WrongFieldKind)
                .with_message(format!("{object}.{field} is not a graphical primitive"))),
        }
    }

    /// Resolve any `Path` to the `TagExpr` it ultimately names, expanding
    /// `Access` at lookup time (spec §4.1 "Path-synonym resolution" note:
    /// `Access` is not a separate stored form).
    pub fn lookup_path(&self, path: &Path) -> Result<TagExpr, EvalError> {
        match path {
            Path::Field(b, f) => match self.lookup_field(b.name(), f)? {
                FieldExpr::Val(tag) => Ok(tag.clone()),
                FieldExpr::Gpi(_) => Err(EvalError::new(EvalErrorKind::WrongFieldKind)
                    .with_message(format!("{}.{} is a graphical primitive", b.name(), f))),
            },
            Path::Property(b, f, p) => self.lookup_property(b.name(), f, p).cloned(),
            Path::Access(inner, idx) => {
                let tag = self.lookup_path(inner)?;
                access_tag(&tag, idx).ok_or_else(|| {
                    EvalError::new(EvalErrorKind::ElementTypeError)
                        .with_message(format!("cannot access {idx:?} on {inner}"))
                        .at_path((**inner).clone())
                })
            }
            Path::LocalVar(v) => Err(EvalError::new(EvalErrorKind::UnknownPath)
                .with_message(format!("local var ${v} has no translation entry"))),
        }
    }

    /// Insert a value at `path`, failing when the key already exists and
    /// `override_existing` is false (spec §4.1 "Insertion policy").
    pub fn insert_path(
        &mut self,
        path: &Path,
        value: TagExpr,
        override_existing: bool,
    ) -> Result<(), EvalError> {
        match path {
            Path::Field(b, f) => {
                let fields = self.map.entry(b.name().to_string()).or_default();
                if fields.contains_key(f) && !override_existing {
                    return Err(EvalError::new(EvalErrorKind::DuplicateInsert)
                        .with_message(format!("{}.{} already exists", b.name(), f)));
                }
                fields.insert(f.clone(), FieldExpr::Val(value));
                Ok(())
            }
            Path::Property(b, f, p) => {
                let fields = self.map.entry(b.name().to_string()).or_default();
                let entry = fields
                    .entry(f.clone())
                    .or_insert_with(|| FieldExpr::Gpi(Gpi::new("")));
                match entry {
                    FieldExpr::Gpi(gpi) => {
                        if gpi.properties.contains_key(p) && !override_existing {
                            return Err(EvalError::new(EvalErrorKind::DuplicateInsert).with_message(
                                format!("{}.{}.{} already exists", b.name(), f, p),
                            ));
                        }
                        gpi.properties.insert(p.clone(), value);
                        Ok(())
                    }
                    FieldExpr::Val(_) => Err(EvalError::new(EvalErrorKind::WrongFieldKind)
                        .with_message(format!("{}.{} is not a graphical primitive", b.name(), f))),
                }
            }
            Path::Access(_, _) => Err(EvalError::new(EvalErrorKind::WrongFieldKind)
                .with_message("cannot insert directly through an Access path")),
            Path::LocalVar(v) => Err(EvalError::new(EvalErrorKind::UnknownPath)
                .with_message(format!("cannot insert into local var ${v}"))),
        }
    }

    /// Overwrite a `Done`/`Pending` value in place, used by the evaluator's
    /// memoization step, which always overrides (spec §9 "Memoization of
    /// path-alias results").
    pub fn memoize(&mut self, path: &Path, value: penrose_core::Value) -> Result<(), EvalError> {
        self.insert_path(path, TagExpr::Done(value), true)
    }

    /// Insert or replace a graphical primitive at a field path.
    pub fn insert_gpi(&mut self, object: &str, field: &str, gpi: Gpi) {
        self.map
            .entry(object.to_string())
            .or_default()
            .insert(field.to_string(), FieldExpr::Gpi(gpi));
    }

    /// Structural fold over every `(object, field, field-expr)` triple, in
    /// the store's deterministic iteration order.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, &str, &str, &FieldExpr) -> A) -> A {
        let mut acc = init;
        for (object, fields) in &self.map {
            for (field, fexpr) in fields {
                acc = f(acc, object, field, fexpr);
            }
        }
        acc
    }

    pub fn fold_mut<A>(&mut self, init: A, mut f: impl FnMut(A, &str, &str, &mut FieldExpr) -> A) -> A {
        let mut acc = init;
        for (object, fields) in &mut self.map {
            for (field, fexpr) in fields {
                acc = f(acc, object, field, fexpr);
            }
        }
        acc
    }

    /// Every declared shape name, `"object.field"`, in the store's
    /// deterministic order.
    pub fn shape_names(&self) -> Vec<String> {
        self.fold(Vec::new(), |mut acc, object, field, fexpr| {
            if matches!(fexpr, FieldExpr::Gpi(_)) {
                acc.push(format!("{object}.{field}"));
            }
            acc
        })
    }
}

/// Expand an `Access(path, idx)` lookup against an already-resolved `TagExpr`.
fn access_tag(tag: &TagExpr, idx: &[usize]) -> Option<TagExpr> {
    let value = tag.as_done().or_else(|| match tag {
        TagExpr::Pending(v) => Some(v),
        _ => None,
    })?;
    access_value(value, idx).map(TagExpr::Done)
}

pub(crate) fn access_value(value: &penrose_core::Value, idx: &[usize]) -> Option<penrose_core::Value> {
    use penrose_core::Value;
    match (value, idx) {
        (Value::Vector(xs), [i]) => xs.get(*i).map(|x| Value::Float(*x)),
        (Value::List(xs), [i]) => xs.get(*i).map(|x| Value::Float(*x)),
        (Value::Tuple(a, b), [i]) => match i {
            0 => Some(Value::Float(*a)),
            1 => Some(Value::Float(*b)),
            _ => None,
        },
        (Value::Matrix(rows), [i, j]) => rows.get(*i).and_then(|r| r.get(*j)).map(|x| Value::Float(*x)),
        (Value::Matrix(rows), [i]) => rows.get(*i).map(|r| Value::Vector(r.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penrose_core::{BindingForm, Value};
    use proptest::prelude::*;

    fn field_path(object: &str, field: &str) -> Path {
        Path::Field(BindingForm::Style(object.to_string()), field.to_string())
    }

    #[test]
    fn duplicate_insert_without_override_fails() {
        let mut trans = Translation::new();
        let path = field_path("x", "val");
        trans.insert_path(&path, TagExpr::Done(Value::Float(1.0)), false).unwrap();
        let err = trans
            .insert_path(&path, TagExpr::Done(Value::Float(2.0)), false)
            .unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::DuplicateInsert);
        // the first value must survive the failed insert
        assert_eq!(trans.lookup_path(&path).unwrap(), TagExpr::Done(Value::Float(1.0)));
    }

    #[test]
    fn insert_with_override_replaces_existing() {
        let mut trans = Translation::new();
        let path = field_path("x", "val");
        trans.insert_path(&path, TagExpr::Done(Value::Float(1.0)), false).unwrap();
        trans.insert_path(&path, TagExpr::Done(Value::Float(2.0)), true).unwrap();
        assert_eq!(trans.lookup_path(&path).unwrap(), TagExpr::Done(Value::Float(2.0)));
    }

    #[test]
    fn fold_visits_in_insertion_order() {
        let mut trans = Translation::new();
        trans.insert_path(&field_path("b", "v"), TagExpr::Done(Value::Float(1.0)), false).unwrap();
        trans.insert_path(&field_path("a", "v"), TagExpr::Done(Value::Float(2.0)), false).unwrap();
        let order = trans.fold(Vec::new(), |mut acc, object, _field, _fexpr| {
            acc.push(object.to_string());
            acc
        });
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn property_insert_fails_on_non_gpi_field() {
        let mut trans = Translation::new();
        trans.insert_path(&field_path("x", "val"), TagExpr::Done(Value::Float(1.0)), false).unwrap();
        let prop = Path::Property(BindingForm::Style("x".into()), "val".into(), "r".into());
        let err = trans.insert_path(&prop, TagExpr::Done(Value::Float(1.0)), false).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::WrongFieldKind);
    }

    proptest! {
        /// `insert_paths(paths, lookup_paths(paths, t), t) == t` up to evaluation
        /// equivalence (spec §8 "Laws"): inserting a value and reading it straight
        /// back yields exactly what was inserted, for any object/field name and
        /// any finite float.
        #[test]
        fn insert_then_lookup_roundtrips(
            object in "[a-zA-Z][a-zA-Z0-9_]{0,8}",
            field in "[a-zA-Z][a-zA-Z0-9_]{0,8}",
            n in -1.0e6f64..1.0e6,
        ) {
            let mut trans = Translation::new();
            let path = field_path(&object, &field);
            trans.insert_path(&path, TagExpr::Done(Value::Float(n)), false).unwrap();
            let got = trans.lookup_path(&path).unwrap();
            prop_assert_eq!(got, TagExpr::Done(Value::Float(n)));
        }

        /// Re-inserting at the same path with `override_existing = true` never
        /// fails and always wins, regardless of how many times it happens.
        #[test]
        fn repeated_override_insert_always_succeeds(
            object in "[a-zA-Z][a-zA-Z0-9_]{0,8}",
            field in "[a-zA-Z][a-zA-Z0-9_]{0,8}",
            values in prop::collection::vec(-1.0e3f64..1.0e3, 1..6),
        ) {
            let mut trans = Translation::new();
            let path = field_path(&object, &field);
            for v in &values {
                trans.insert_path(&path, TagExpr::Done(Value::Float(*v)), true).unwrap();
            }
            let last = *values.last().unwrap();
            prop_assert_eq!(trans.lookup_path(&path).unwrap(), TagExpr::Done(Value::Float(last)));
        }
    }
}
