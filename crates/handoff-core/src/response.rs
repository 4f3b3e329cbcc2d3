use bytes::Bytes;

use crate::body::OutgoingBody;
use crate::error::{BodyError, ConstructError};
use crate::fields::Fields;
use crate::transport::{BodyDrain, Transport};

/// An outgoing HTTP response under construction.
///
/// Constructing a response allocates its body pipe from the
/// [`Transport`]; the transport starts collecting the body right away,
/// so the handler may write before or after resolving its outparam.
///
/// The status defaults to 200. Headers passed in become immutable.
#[derive(Debug)]
pub struct OutgoingResponse {
    status: u16,
    headers: Fields,
    body: Option<OutgoingBody>,
    drain: BodyDrain,
}

impl OutgoingResponse {
    pub fn new(transport: &Transport, headers: Fields) -> Result<Self, ConstructError> {
        let (body, drain) = transport.open_body()?;
        Ok(Self {
            status: 200,
            headers: headers.into_immutable(),
            body: Some(body),
            drain,
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn set_status_code(&mut self, status: u16) -> Result<(), ConstructError> {
        if !(100..=599).contains(&status) {
            return Err(ConstructError::InvalidStatus(status));
        }
        self.status = status;
        Ok(())
    }

    pub fn headers(&self) -> &Fields {
        &self.headers
    }

    /// Take the response body. Only the first call succeeds.
    pub fn body(&mut self) -> Result<OutgoingBody, ConstructError> {
        self.body.take().ok_or(ConstructError::BodyAlreadyTaken)
    }

    /// Wait for the transport to collect the finished body.
    ///
    /// A body that was never taken is sealed as empty. A taken body must
    /// be finished by the handler; otherwise this waits until the body is
    /// dropped and fails with [`BodyError::Unfinished`].
    pub async fn complete(self) -> Result<CompletedResponse, BodyError> {
        let Self {
            status,
            headers,
            body,
            drain,
        } = self;

        if let Some(body) = body {
            body.finish(None).await.map_err(|_| BodyError::Unfinished)?;
        }

        let collected = drain.await.map_err(|_| BodyError::Unfinished)??;
        Ok(CompletedResponse {
            status,
            headers,
            body: collected.data,
            trailers: collected.trailers,
        })
    }
}

/// A resolved response whose body the transport has fully collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedResponse {
    status: u16,
    headers: Fields,
    body: Bytes,
    trailers: Option<Fields>,
}

impl CompletedResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Fields {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn trailers(&self) -> Option<&Fields> {
        self.trailers.as_ref()
    }

    pub fn into_parts(self) -> (u16, Fields, Bytes, Option<Fields>) {
        (self.status, self.headers, self.body, self.trailers)
    }
}
