//! Error type for the scrim controller.
//!
//! Every variant signals a caller or catalog defect rather than a runtime condition.
//! The controller never clamps these away; they surface synchronously at the call that
//! produced them.

use thiserror::Error;

use crate::layer::ScrimLayer;
use crate::state::ScrimState;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScrimError {
    /// A caller passed a value the controller cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A composed opacity turned out to be NaN.
    #[error("scrim opacity is NaN for state {state}: front={front}, behind={behind}")]
    NanOpacity {
        state: ScrimState,
        front: f32,
        behind: f32,
    },

    /// A layer was addressed that was never attached to the controller.
    #[error("{0} is not attached to the controller")]
    LayerNotAttached(ScrimLayer),
}

/// Convenience alias used across the controller modules.
pub type ScrimResult<T> = Result<T, ScrimError>;
