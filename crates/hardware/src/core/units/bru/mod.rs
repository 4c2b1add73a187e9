//! Branch prediction unit (BRU).
//!
//! Fetch consults one configured direction predictor (static not-taken or
//! bimodal); each carries its own return-address stack.

pub use self::branch_predictor::BranchPredictor;

/// Bimodal 2-bit counter predictor.
pub mod bimodal;

/// Predictor interface.
pub mod branch_predictor;

/// Return address stack.
pub mod ras;

/// Static not-taken predictor.
pub mod static_bp;

use self::{bimodal::BimodalPredictor, static_bp::StaticPredictor};
use crate::config::{BranchPredictor as PredictorKind, PipelineConfig};

/// The configured predictor, dispatched statically.
#[derive(Clone, Debug)]
pub enum Predictor {
    /// Always not-taken.
    Static(StaticPredictor),
    /// 2-bit counters.
    Bimodal(BimodalPredictor),
}

impl Predictor {
    /// Builds the predictor named by the pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        match config.branch_predictor {
            PredictorKind::Static => Self::Static(StaticPredictor::new(config.ras_size)),
            PredictorKind::Bimodal => {
                Self::Bimodal(BimodalPredictor::new(config.bht_size, config.ras_size))
            }
        }
    }

    fn inner(&self) -> &dyn BranchPredictor {
        match self {
            Self::Static(bp) => bp,
            Self::Bimodal(bp) => bp,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn BranchPredictor {
        match self {
            Self::Static(bp) => bp,
            Self::Bimodal(bp) => bp,
        }
    }
}

impl BranchPredictor for Predictor {
    fn predict(&self, pc: u64) -> bool {
        self.inner().predict(pc)
    }

    fn train(&mut self, pc: u64, taken: bool) {
        self.inner_mut().train(pc, taken);
    }

    fn push_return(&mut self, addr: u64) {
        self.inner_mut().push_return(addr);
    }

    fn pop_return(&mut self) -> Option<u64> {
        self.inner_mut().pop_return()
    }
}
