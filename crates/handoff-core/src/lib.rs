//! Handoff contract types.
//!
//! A caller delivers one [`IncomingRequest`] to an [`IncomingHandler`]
//! together with an unresolved [`ResponseOutparam`]. The handler builds
//! an [`OutgoingResponse`], writes its [`OutgoingBody`] through an
//! [`OutputStream`], finishes the body and resolves the outparam exactly
//! once: with the response, or with an [`ErrorCode`] when construction
//! fails.
//!
//! # Linear use
//!
//! The single-assignment and seal rules are carried by ownership:
//!
//! - [`ResponseOutparam::set`] consumes the outparam, so it cannot be set
//!   twice. Dropping it unset is observed by the caller as [`Unresolved`].
//! - [`OutgoingBody::write`] borrows the body and
//!   [`OutgoingBody::finish`] consumes it, so nothing can be written after
//!   finish.
//!
//! # Transport
//!
//! Response bodies are pipes allocated from the caller's [`Transport`].
//! A drain task collects each body from the moment the response is
//! constructed; writers suspend while the pipe is full. Opening a body
//! therefore requires a tokio runtime.

mod body;
mod error;
mod fields;
mod handler;
mod outparam;
mod request;
mod response;
mod transport;

pub use body::{ByteStream, OutgoingBody, OutputStream, DEFAULT_CHUNK_SIZE};
pub use error::{BodyError, ConstructError, ErrorCode, HeaderError, StreamError, Unresolved};
pub use fields::{Field, Fields};
pub use handler::IncomingHandler;
pub use outparam::{Outcome, PendingResponse, ResponseOutparam};
pub use request::{IncomingBody, IncomingRequest, Scheme};
pub use response::{CompletedResponse, OutgoingResponse};
pub use transport::{Transport, TransportConfig};

pub use http::Method;
