//! Handler invocation.
//!
//! `Host` plays the caller's side of the handoff: it builds the
//! outparam, runs the handler on its own task, waits for the single
//! resolution and then for the body to be sealed.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use handoff_core::{
    CompletedResponse, ErrorCode, IncomingHandler, IncomingRequest, ResponseOutparam, Transport,
};

use crate::config::HostConfig;
use crate::convert;
use crate::error::{InvokeError, InvokeResult};

/// How a handler resolved its outparam.
#[derive(Debug)]
pub enum Resolution {
    /// A response whose body was finished and fully collected.
    Response(CompletedResponse),
    /// The failure value the handler resolved with.
    Failed(ErrorCode),
}

impl Resolution {
    pub fn into_response(self) -> Option<CompletedResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The caller side of the handler boundary.
///
/// Invocations are independent; the only state they share is the
/// transport's pool of body slots.
#[derive(Debug, Clone)]
pub struct Host {
    transport: Transport,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        info!(
            write_budget = config.transport.write_budget,
            max_open_bodies = config.transport.max_open_bodies,
            max_body_bytes = config.transport.max_body_bytes,
            "handoff host initialized"
        );
        Self {
            transport: Transport::new(config.transport),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(HostConfig::default())
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Invoke `handler` with `request` and a fresh outparam.
    ///
    /// The handler runs on its own task, so it may resolve the outparam
    /// before it has finished writing the body. A response is returned
    /// only once its body has been finished.
    ///
    /// A handler that resolves but neither finishes nor drops its body
    /// keeps this call pending; no timeout is applied here.
    pub async fn invoke<H: IncomingHandler>(
        &self,
        handler: Arc<H>,
        request: IncomingRequest,
    ) -> InvokeResult<Resolution> {
        let span = info_span!(
            "invoke",
            method = %request.method(),
            path = request.path_with_query().unwrap_or("/"),
        );

        self.run(handler, request).instrument(span).await
    }

    async fn run<H: IncomingHandler>(
        &self,
        handler: Arc<H>,
        request: IncomingRequest,
    ) -> InvokeResult<Resolution> {
        let (out, pending) = ResponseOutparam::new(self.transport.clone());
        let task = tokio::spawn(async move { handler.handle(request, out).await });

        match pending.resolved().await {
            Ok(Ok(response)) => {
                let completed = response.complete().await;
                join_handler(task).await?;
                let completed = completed?;
                debug!(
                    status = completed.status(),
                    body_len = completed.body().len(),
                    "handler responded"
                );
                Ok(Resolution::Response(completed))
            }
            Ok(Err(code)) => {
                join_handler(task).await?;
                warn!(error = %code, "handler resolved with failure");
                Ok(Resolution::Failed(code))
            }
            Err(_) => {
                join_handler(task).await?;
                error!("handler returned without resolving its outparam");
                Err(InvokeError::OutparamUnresolved)
            }
        }
    }

    /// Invoke `handler` with an `http::Request` and return an `http::Response`.
    ///
    /// A failure resolution is returned as [`InvokeError::Failed`].
    pub async fn handle_http<H: IncomingHandler>(
        &self,
        handler: Arc<H>,
        request: http::Request<Bytes>,
    ) -> InvokeResult<http::Response<Bytes>> {
        let request = convert::request_from_http(request)?;
        match self.invoke(handler, request).await? {
            Resolution::Response(response) => convert::response_to_http(response),
            Resolution::Failed(code) => Err(InvokeError::Failed(code)),
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::with_defaults()
    }
}

async fn join_handler(task: JoinHandle<()>) -> InvokeResult<()> {
    task.await.map_err(|err| {
        let reason = if err.is_panic() {
            panic_message(err.into_panic())
        } else {
            err.to_string()
        };
        error!(%reason, "handler task failed");
        InvokeError::HandlerPanicked(reason)
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_accessors() {
        let failed = Resolution::Failed(ErrorCode::from(
            handoff_core::ConstructError::TransportExhausted,
        ));
        assert!(failed.is_failed());
        assert!(failed.into_response().is_none());
    }

    #[test]
    fn panic_message_extracts_strings() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "non-string panic payload");
    }

    #[test]
    fn host_uses_configured_transport() {
        let mut config = HostConfig::default();
        config.transport.max_open_bodies = 3;
        let host = Host::new(config);
        assert_eq!(host.transport().available_slots(), 3);
    }
}
