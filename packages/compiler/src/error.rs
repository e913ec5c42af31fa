//! Pipeline Errors
//!
//! Every failure surfaced by the pipeline is an internal invariant violation or an input shape the
//! upstream lowering should have normalized away. Either way the current job is aborted.

use thiserror::Error;

use crate::template::pipeline::ir::enums::OpKind;
use crate::template::pipeline::ir::handle::XrefId;
use crate::template::pipeline::ir::operations::{ListId, OpId};

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("cannot mutate the list-end sentinel of list {0:?}")]
    SentinelMutation(ListId),

    #[error("operation {op:?} is not owned by list {list:?}")]
    OpNotOwned { op: OpId, list: ListId },

    #[error("operation {0:?} was already removed from its list")]
    StaleOp(OpId),

    #[error("slot was read before slot allocation assigned it")]
    SlotUnset,

    #[error("slot handle was assigned twice (had {existing}, got {attempted})")]
    SlotReassigned { existing: usize, attempted: usize },

    #[error("variable offset was read before variable counting assigned it")]
    VarOffsetUnset,

    #[error("{what} was read before it was assigned")]
    Unset { what: &'static str },

    #[error("{what} was assigned twice")]
    Reassigned { what: &'static str },

    #[error("view {0:?} does not exist in this job")]
    MissingView(XrefId),

    #[error("no i18n context {0:?} for an op that requires one")]
    MissingI18nContext(XrefId),

    #[error("no lexical reads should remain, but found read of `{0}`")]
    UnresolvedName(String),

    #[error("no saved view {view:?} from view {from:?}")]
    NoSavedView { view: XrefId, from: XrefId },

    #[error("no context found for reference to view {view:?} from view {from:?}")]
    NoContext { view: XrefId, from: XrefId },

    #[error("variable {0:?} was not named")]
    UnnamedVariable(XrefId),

    #[error("unexpected {kind:?} operation during {phase}")]
    UnexpectedOp { kind: OpKind, phase: &'static str },

    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("invalid pipeline options: {0}")]
    InvalidOptions(String),

    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl PipelineError {
    pub fn assertion(message: impl Into<String>) -> Self {
        PipelineError::Assertion(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        PipelineError::Unsupported(message.into())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::InvalidOptions(err.to_string())
    }
}
