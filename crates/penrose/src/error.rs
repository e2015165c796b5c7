//! The facade crate's compile-time error surface (spec §6 "Upstream
//! (consumed)": `compile(..) -> State | CompilerError`).

use penrose_core::EvalError;
use penrose_eval::StateBuildError;

/// What can keep [`crate::compile`] from producing a [`crate::State`].
///
/// `StyleTypecheck`/`StyleLayering` are named directly in spec §6; this crate
/// has no surface-language typechecker of its own (that stage is out of
/// scope per spec §1, callers hand in an already-typechecked
/// [`penrose_eval::Translation`]), so `StyleTypecheck` is carried only so an
/// embedder who *does* run a typechecker ahead of `compile` has somewhere to
/// report its errors through the same type. `Eval` is this crate's own
/// addition, covering the structural/type/domain/registry failure classes of
/// spec §7 that `compile` can also surface; those aren't named in spec §6's
/// two-variant sketch, but propagating them silently would violate spec §7's
/// "abort the operation and surface as a compiler error" (see DESIGN.md).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompilerError {
    #[error("style typecheck failed: {}", .0.join("; "))]
    StyleTypecheck(Vec<String>),

    #[error("layering graph has a cycle: {0}")]
    StyleLayering(String),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<StateBuildError> for CompilerError {
    fn from(err: StateBuildError) -> Self {
        match err {
            StateBuildError::Eval(e) => CompilerError::Eval(e),
            StateBuildError::LayeringCycle(names) => {
                CompilerError::StyleLayering(format!("cycle involving: {}", names.join(", ")))
            }
        }
    }
}
