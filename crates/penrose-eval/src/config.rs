//! Configuration and constants (spec §6 "Configuration" / "Constants").

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recursive evaluation depth at which the evaluator gives up and signals
/// `CycleDepthExceeded`: the expression graph had an unresolved cycle.
pub const MAX_EVAL_DEPTH: u32 = 500;

/// Multiplier applied to the summed constraint functions before adding them
/// to the summed objectives (spec §4.6 step 4).
pub const CONSTR_WEIGHT: f64 = 1e4;

/// Initial penalty weight `w` a freshly built `State` carries.
pub const INIT_WEIGHT: f64 = 1e-3;

/// Default number of candidate draws `resample_best` takes when the caller
/// does not specify one.
pub const DEFAULT_RESAMPLE_COUNT: usize = 500;

/// Fixed RNG seed used by tests and any caller that wants reproducible
/// sampling without supplying their own seed.
pub const DEFAULT_SEED: u64 = 17;

/// The canvas dimensions varying *fields* (not shape properties) are sampled
/// against (spec §4.3).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasDims {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasDims {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 700.0,
        }
    }
}

/// Which external numerical method the assembled energy function is handed
/// off to. The core never implements any of these; it only names the
/// method for the optimizer to honor and carries the bookkeeping state
/// (`BfgsParams`) a quasi-Newton method needs between calls.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptMethod {
    GradientDescent,
    Newton,
    Bfgs,
    #[default]
    Lbfgs,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptConfig {
    pub method: OptMethod,
}

/// L-BFGS memory the external optimizer reads and writes between successive
/// calls to `eval_energy_on`; reset to its default on every resample.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct BfgsParams {
    pub last_state: Option<Vec<f64>>,
    pub last_grad: Option<Vec<f64>>,
    pub inv_h: Option<Vec<Vec<f64>>>,
    pub s_list: Vec<Vec<f64>>,
    pub y_list: Vec<Vec<f64>>,
    pub num_unconstr_steps: u32,
    pub mem_size: usize,
}

impl BfgsParams {
    pub fn new() -> Self {
        Self {
            mem_size: 17,
            ..Default::default()
        }
    }
}

/// Optimizer status, reset to `NewIter` on every resample (spec §3 "State"
/// `params` field, §4.7 "Resample-best").
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptStatus {
    #[default]
    NewIter,
    UnconstrainedRunning,
    UnconstrainedConverged,
    Error,
}

/// The optimizer control block carried on `State` (spec §3 `params` field).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct OptParams {
    pub weight: f64,
    pub status: OptStatus,
    pub bfgs: BfgsParams,
}

impl OptParams {
    pub fn fresh() -> Self {
        Self {
            weight: INIT_WEIGHT,
            status: OptStatus::NewIter,
            bfgs: BfgsParams::new(),
        }
    }
}

/// Build-time configuration supplied by the embedder (spec §4.7 "Initial build").
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    pub canvas: CanvasDims,
    pub opt_config: OptConfig,
    pub seed: u64,
    pub resample_count: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasDims::default(),
            opt_config: OptConfig::default(),
            seed: DEFAULT_SEED,
            resample_count: DEFAULT_RESAMPLE_COUNT,
        }
    }
}
