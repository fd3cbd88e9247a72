//! Merge engine errors

use thiserror::Error;

use crate::engine::RunState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Sources can only be registered before the run starts (engine is {0:?})")]
    RegistrationClosed(RunState),

    #[error("Engine cannot run from state {0:?}; build a new engine to run again")]
    NotRunnable(RunState),
}

pub type Result<T> = std::result::Result<T, MergeError>;
