//! Error types for the handoff contract.

use thiserror::Error;

/// Errors raised while building or mutating a [`Fields`](crate::Fields) collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("invalid header syntax: {0}")]
    InvalidSyntax(String),

    #[error("forbidden header: {0}")]
    Forbidden(String),

    #[error("fields are immutable")]
    Immutable,
}

/// Errors raised by an [`OutputStream`](crate::OutputStream).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("output stream closed")]
    Closed,

    #[error("write of {requested} bytes exceeds the {permitted} bytes permitted")]
    BudgetExceeded { requested: usize, permitted: usize },
}

/// Reasons a handler could not produce a valid response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    #[error("status code {0} is outside 100..=599")]
    InvalidStatus(u16),

    #[error("response body already taken")]
    BodyAlreadyTaken,

    #[error("transport has no free body slots")]
    TransportExhausted,

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// The failure value a handler resolves its outparam with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorCode {
    #[error("response construction failed: {0}")]
    ResponseConstruction(#[from] ConstructError),
}

impl From<HeaderError> for ErrorCode {
    fn from(err: HeaderError) -> Self {
        Self::ResponseConstruction(err.into())
    }
}

impl From<StreamError> for ErrorCode {
    fn from(err: StreamError) -> Self {
        Self::ResponseConstruction(err.into())
    }
}

/// Caller-side failures while collecting a resolved response's body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    #[error("body was dropped before finish")]
    Unfinished,

    #[error("body exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
}

/// The handler released its outparam without setting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("response outparam dropped without being set")]
pub struct Unresolved;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_from_header_error() {
        let code = ErrorCode::from(HeaderError::Immutable);
        assert_eq!(
            code,
            ErrorCode::ResponseConstruction(ConstructError::Header(HeaderError::Immutable))
        );
    }

    #[test]
    fn error_code_from_stream_error() {
        let code = ErrorCode::from(StreamError::Closed);
        assert_eq!(
            code,
            ErrorCode::ResponseConstruction(ConstructError::Stream(StreamError::Closed))
        );
    }

    #[test]
    fn error_code_display_includes_cause() {
        let code = ErrorCode::from(ConstructError::InvalidStatus(700));
        assert_eq!(
            format!("{code}"),
            "response construction failed: status code 700 is outside 100..=599"
        );
    }

    #[test]
    fn budget_exceeded_display() {
        let err = StreamError::BudgetExceeded {
            requested: 10,
            permitted: 4,
        };
        assert_eq!(
            format!("{err}"),
            "write of 10 bytes exceeds the 4 bytes permitted"
        );
    }

    #[test]
    fn errors_are_std_errors() {
        let _: &dyn std::error::Error = &ErrorCode::from(StreamError::Closed);
        let _: &dyn std::error::Error = &BodyError::Unfinished;
        let _: &dyn std::error::Error = &Unresolved;
    }
}
