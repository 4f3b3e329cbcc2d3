//! The hello handler.
//!
//! Ignores the request and answers `200` with no headers and a fixed
//! greeting as the body.

use bytes::Bytes;
use tracing::debug;

use handoff_core::{
    ErrorCode, Fields, IncomingHandler, IncomingRequest, OutgoingResponse, ResponseOutparam,
    Transport,
};

/// The default response body.
pub const GREETING: &str = "Hello from Python!\n";

#[derive(Debug, Clone)]
pub struct Hello {
    message: Bytes,
}

impl Hello {
    pub fn new() -> Self {
        Self::with_message(GREETING)
    }

    /// A handler that answers with `message` instead of [`GREETING`].
    pub fn with_message(message: impl Into<Bytes>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &[u8] {
        &self.message
    }
}

impl Default for Hello {
    fn default() -> Self {
        Self::new()
    }
}

impl IncomingHandler for Hello {
    async fn handle(&self, request: IncomingRequest, out: ResponseOutparam) {
        debug!(method = %request.method(), "hello handler invoked");
        let message = self.message.clone();
        out.resolve_with(|transport| respond(transport, message)).await;
    }
}

async fn respond(transport: Transport, message: Bytes) -> Result<OutgoingResponse, ErrorCode> {
    let mut response = OutgoingResponse::new(&transport, Fields::new())?;
    response.set_status_code(200)?;
    let mut body = response.body()?;
    body.write().blocking_write_and_flush(&message).await?;
    body.finish(None).await?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_message_is_greeting() {
        assert_eq!(Hello::new().message(), GREETING.as_bytes());
        assert_eq!(Hello::default().message(), b"Hello from Python!\n");
    }

    #[test]
    fn custom_message() {
        assert_eq!(Hello::with_message("hi").message(), b"hi");
    }

    #[tokio::test]
    async fn respond_builds_finished_response() {
        let transport = Transport::default();
        let response = respond(transport, Bytes::from_static(b"direct")).await.unwrap();
        assert_eq!(response.status_code(), 200);
        assert!(response.headers().is_empty());

        let done = response.complete().await.unwrap();
        assert_eq!(done.body().as_ref(), b"direct");
        assert!(done.trailers().is_none());
    }
}
