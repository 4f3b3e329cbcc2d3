//! The single-assignment response slot.

use std::future::Future;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{ErrorCode, Unresolved};
use crate::response::OutgoingResponse;
use crate::transport::Transport;

/// What a handler resolves its outparam with.
pub type Outcome = Result<OutgoingResponse, ErrorCode>;

/// The slot a handler deposits its one outcome into.
///
/// [`set()`](ResponseOutparam::set) consumes the outparam, so it can be
/// resolved at most once. Dropping it unresolved is reported to the
/// caller as [`Unresolved`].
#[derive(Debug)]
pub struct ResponseOutparam {
    slot: Option<oneshot::Sender<Outcome>>,
    transport: Transport,
}

/// The caller's end of a [`ResponseOutparam`].
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Outcome>,
}

impl ResponseOutparam {
    /// Create an unresolved outparam backed by `transport`.
    pub fn new(transport: Transport) -> (Self, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        let out = Self {
            slot: Some(tx),
            transport,
        };
        (out, PendingResponse { rx })
    }

    /// The transport responses for this outparam are allocated from.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Resolve the outparam.
    ///
    /// If the caller has already abandoned the request the outcome is
    /// discarded.
    ///
    /// ```
    /// use handoff_core::{ConstructError, ResponseOutparam, Transport};
    ///
    /// let (out, _pending) = ResponseOutparam::new(Transport::default());
    /// out.set(Err(ConstructError::TransportExhausted.into()));
    /// ```
    ///
    /// `set` consumes the outparam, so a second resolution does not compile:
    ///
    /// ```compile_fail,E0382
    /// use handoff_core::{ConstructError, ResponseOutparam, Transport};
    ///
    /// let (out, _pending) = ResponseOutparam::new(Transport::default());
    /// out.set(Err(ConstructError::TransportExhausted.into()));
    /// out.set(Err(ConstructError::TransportExhausted.into()));
    /// ```
    pub fn set(mut self, outcome: Outcome) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let ok = outcome.is_ok();
        if slot.send(outcome).is_err() {
            debug!(ok, "caller abandoned response outparam");
            return;
        }
        debug!(ok, "response outparam resolved");
    }

    /// Run `build` and resolve the outparam with whatever it returns.
    ///
    /// A construction failure becomes the failure resolution, so the
    /// outparam is set exactly once on every path.
    pub async fn resolve_with<F, Fut>(self, build: F)
    where
        F: FnOnce(Transport) -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let outcome = build(self.transport.clone()).await;
        if let Err(err) = &outcome {
            warn!(error = %err, "resolving response outparam with failure");
        }
        self.set(outcome);
    }
}

impl Drop for ResponseOutparam {
    fn drop(&mut self) {
        if self.slot.is_some() {
            warn!("response outparam dropped without resolution");
        }
    }
}

impl PendingResponse {
    /// Wait for the handler to resolve the outparam.
    pub async fn resolved(self) -> Result<Outcome, Unresolved> {
        self.rx.await.map_err(|_| Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstructError;
    use crate::fields::Fields;

    #[tokio::test]
    async fn set_delivers_response() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        let mut resp = OutgoingResponse::new(out.transport(), Fields::new()).unwrap();
        resp.set_status_code(202).unwrap();
        out.set(Ok(resp));

        let resp = pending.resolved().await.unwrap().unwrap();
        assert_eq!(resp.status_code(), 202);
    }

    #[tokio::test]
    async fn set_delivers_failure() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        out.set(Err(ConstructError::TransportExhausted.into()));

        let err = pending.resolved().await.unwrap().unwrap_err();
        assert_eq!(
            err,
            ErrorCode::ResponseConstruction(ConstructError::TransportExhausted)
        );
    }

    #[tokio::test]
    async fn dropped_outparam_is_unresolved() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        drop(out);
        assert_eq!(pending.resolved().await.unwrap_err(), Unresolved);
    }

    #[tokio::test]
    async fn set_after_caller_left_is_discarded() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        drop(pending);
        out.set(Err(ConstructError::BodyAlreadyTaken.into()));
    }

    #[tokio::test]
    async fn resolve_with_sets_success() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        out.resolve_with(|transport| async move {
            let resp = OutgoingResponse::new(&transport, Fields::new())?;
            Ok::<_, ErrorCode>(resp)
        })
        .await;

        assert!(pending.resolved().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn resolve_with_turns_construction_error_into_failure() {
        let (out, pending) = ResponseOutparam::new(Transport::default());
        out.resolve_with(|transport| async move {
            let mut resp = OutgoingResponse::new(&transport, Fields::new())?;
            resp.set_status_code(42)?;
            Ok::<_, ErrorCode>(resp)
        })
        .await;

        let err = pending.resolved().await.unwrap().unwrap_err();
        assert_eq!(
            err,
            ErrorCode::ResponseConstruction(ConstructError::InvalidStatus(42))
        );
    }
}
