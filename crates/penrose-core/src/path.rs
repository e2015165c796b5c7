//! Paths: the unique keys into the translation (spec §3 "Path").

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::expr::IndexVec;

/// Whether an identifier was bound by the substance program or the style
/// program. Paths carry this so that two identically-named objects declared
/// on either side of the compile never alias each other by accident.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingForm {
    Substance(String),
    Style(String),
}

impl BindingForm {
    pub fn name(&self) -> &str {
        match self {
            BindingForm::Substance(s) | BindingForm::Style(s) => s,
        }
    }
}

impl fmt::Display for BindingForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed reference into the translation.
///
/// `Field` and `Property` are the only variants the translation store can
/// use as a top-level key; `Access` selects an element inside a
/// vector/matrix-valued path and is expanded at lookup time rather than
/// stored directly (spec §4.1); `LocalVar` names a let-bound identifier
/// local to a single expression evaluation and never appears in the
/// translation's own keys.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    Field(BindingForm, String),
    Property(BindingForm, String, String),
    Access(Box<Path>, IndexVec),
    LocalVar(String),
}

impl Path {
    /// The field-level path this path is rooted at, stripping any trailing
    /// `Property`/`Access` layers. Used when resolving a property path back
    /// to the shape that owns it.
    pub fn field_path(&self) -> Path {
        match self {
            Path::Field(b, f) => Path::Field(b.clone(), f.clone()),
            Path::Property(b, f, _) => Path::Field(b.clone(), f.clone()),
            Path::Access(inner, _) => inner.field_path(),
            Path::LocalVar(v) => Path::LocalVar(v.clone()),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Field(b, field) => write!(f, "{b}.{field}"),
            Path::Property(b, field, prop) => write!(f, "{b}.{field}.{prop}"),
            Path::Access(p, idx) => write!(f, "{p}{idx:?}"),
            Path::LocalVar(v) => write!(f, "${v}"),
        }
    }
}
