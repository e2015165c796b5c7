//! Initial-value sampling (spec §4.3).

use penrose_core::{Gpi, Path, TagExpr, Value};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::config::CanvasDims;
use crate::traits::ShapeCatalog;
use crate::translation::Translation;

/// Draw a single `f64` uniformly from `[lo, hi)`, advancing `rng` exactly
/// once (spec §4.3 "RNG is advanced exactly once per sample draw").
pub fn uniform(rng: &mut SmallRng, lo: f64, hi: f64) -> f64 {
    if lo >= hi {
        return lo;
    }
    rng.gen_range(lo..hi)
}

/// Sample every property of a single GPI per the table in spec §4.3,
/// threading `rng` left-to-right through the schema's declared order. The
/// synthetic `"name"` property is set last regardless of iteration order.
pub fn sample_gpi(
    gpi: &mut Gpi,
    object: &str,
    field: &str,
    catalog: &dyn ShapeCatalog,
    canvas: &CanvasDims,
    rng: &mut SmallRng,
) {
    let Some(schema) = catalog.schema(&gpi.shape_type) else {
        return;
    };
    for entry in &schema {
        let pending = catalog.pending(&gpi.shape_type, &entry.name);
        let current = gpi.properties.get(&entry.name);
        let should_sample = match current {
            None => true,
            Some(TagExpr::OptEval(penrose_core::Expr::AFloat(penrose_core::AnnotatedFloat::Vary))) => true,
            Some(TagExpr::OptEval(penrose_core::Expr::Vector(elems)))
                if elems.len() == 2
                    && elems.iter().all(|e| {
                        matches!(e, penrose_core::Expr::AFloat(penrose_core::AnnotatedFloat::Vary))
                    }) =>
            {
                true
            }
            _ => false,
        };
        if !should_sample {
            continue;
        }
        let sampled = (entry.sample)(rng, canvas.width, canvas.height);
        #[cfg(feature = "tracing")]
        tracing::trace!(object, field, property = %entry.name, value = %sampled, "sampled shape property");
        let tag = if pending && current.is_none() {
            TagExpr::Pending(sampled)
        } else {
            TagExpr::Done(sampled)
        };
        gpi.properties.insert(entry.name.clone(), tag);
    }
    gpi.properties.insert(
        "name".to_string(),
        TagExpr::Done(Value::Str(format!("{object}.{field}"))),
    );
}

/// Sample every graphical primitive's properties in declaration order
/// (spec §4.7 "sample shape properties").
pub fn sample_shapes(
    trans: &mut Translation,
    catalog: &dyn ShapeCatalog,
    canvas: &CanvasDims,
    rng: &mut SmallRng,
) {
    let objects: Vec<String> = trans.map.keys().cloned().collect();
    for object in objects {
        let Some(fields) = trans.map.get_mut(&object) else {
            continue;
        };
        let field_names: Vec<String> = fields.keys().cloned().collect();
        for field in field_names {
            if let Some(penrose_core::FieldExpr::Gpi(gpi)) = trans.map.get_mut(&object).and_then(|f| f.get_mut(&field))
            {
                sample_gpi(gpi, &object, &field, catalog, canvas, rng);
            }
        }
    }
}

/// Sample every varying *field* path (as opposed to a shape property)
/// uniformly over the canvas dimensions and insert it as `Done(Float)`
/// (spec §4.3 last paragraph, spec §4.7 "sample varying-field values").
pub fn sample_varying_fields(
    trans: &mut Translation,
    varying_paths: &[Path],
    canvas: &CanvasDims,
    rng: &mut SmallRng,
) {
    for path in varying_paths {
        if let Path::Field(_, _) = path {
            let v = uniform(rng, 0.0, canvas.width);
            let _ = trans.insert_path(path, TagExpr::Done(Value::Float(v)), true);
        }
    }
}
