//! handoff-host: the caller side of the handler boundary.
//!
//! Delivers one request to an [`IncomingHandler`](handoff_core::IncomingHandler)
//! and checks the handoff contract on the way back.
//!
//! # Architecture
//!
//! ```text
//! http::Request<Bytes>
//!   │
//!   ├── convert → IncomingRequest
//!   ├── ResponseOutparam::new(transport)
//!   ├── spawn handler.handle(request, out)
//!   ├── await the single resolution
//!   ├── await the body drain (finish)
//!   │
//!   ▼
//! Resolution / http::Response<Bytes>
//! ```
//!
//! Contract violations surface as [`InvokeError`]: an outparam dropped
//! unset, a handler panic, or a body dropped before finish.

pub mod config;
pub mod convert;
pub mod error;
pub mod host;

pub use config::HostConfig;
pub use convert::Trailers;
pub use error::{InvokeError, InvokeResult};
pub use host::{Host, Resolution};
