//! Host invocation error types.

use handoff_core::{BodyError, ErrorCode};
use thiserror::Error;

/// Contract violations and failures observed while invoking a handler.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("handler returned without resolving its response outparam")]
    OutparamUnresolved,

    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    #[error("response body error: {0}")]
    Body(#[from] BodyError),

    #[error("handler resolved with failure: {0}")]
    Failed(ErrorCode),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type InvokeResult<T> = Result<T, InvokeError>;
