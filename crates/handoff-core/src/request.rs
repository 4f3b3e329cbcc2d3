use bytes::Bytes;
use http::Method;

use crate::body::{ByteStream, ChunkedBytesStream, DEFAULT_CHUNK_SIZE};
use crate::fields::Fields;

/// The scheme an incoming request arrived over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Other(String),
}

/// One incoming HTTP request, owned by the caller and read by the handler.
///
/// The header collection is immutable. The body is handed out once
/// through [`consume()`](IncomingRequest::consume).
#[derive(Debug)]
pub struct IncomingRequest {
    method: Method,
    path_with_query: Option<String>,
    scheme: Option<Scheme>,
    authority: Option<String>,
    headers: Fields,
    body: Option<IncomingBody>,
}

impl IncomingRequest {
    /// Create a request with no headers and an empty body.
    pub fn new(method: Method, path_with_query: impl Into<String>) -> Self {
        Self {
            method,
            path_with_query: Some(path_with_query.into()),
            scheme: None,
            authority: None,
            headers: Fields::new().into_immutable(),
            body: Some(IncomingBody::new(Bytes::new())),
        }
    }

    pub fn with_headers(mut self, headers: Fields) -> Self {
        self.headers = headers.into_immutable();
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(IncomingBody::new(body.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_with_query(&self) -> Option<&str> {
        self.path_with_query.as_deref()
    }

    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn headers(&self) -> &Fields {
        &self.headers
    }

    /// Take the request body. Returns `None` once it has been taken.
    pub fn consume(&mut self) -> Option<IncomingBody> {
        self.body.take()
    }
}

/// The buffered body of an [`IncomingRequest`].
#[derive(Debug, Clone)]
pub struct IncomingBody {
    data: Bytes,
}

impl IncomingBody {
    fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Direct access to the body buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// The body as a stream of [`DEFAULT_CHUNK_SIZE`] chunks.
    ///
    /// Chunks are zero-copy `Bytes::slice()` views. Each call creates an
    /// independent stream over the same buffer.
    pub fn stream(&self) -> ByteStream {
        self.stream_chunked(DEFAULT_CHUNK_SIZE)
    }

    /// Like [`stream()`](IncomingBody::stream) but with a custom chunk size.
    /// A `chunk_size` of zero is treated as one.
    pub fn stream_chunked(&self, chunk_size: usize) -> ByteStream {
        Box::pin(ChunkedBytesStream::new(self.data.clone(), chunk_size.max(1)))
    }
}
