use std::future::Future;

use crate::outparam::ResponseOutparam;
use crate::request::IncomingRequest;

/// The handler boundary: one request in, one outparam resolution out.
///
/// Implementations must resolve `out` exactly once before the returned
/// future completes, with a response on success or an
/// [`ErrorCode`](crate::ErrorCode) when construction fails.
/// [`ResponseOutparam::resolve_with`] covers both paths.
pub trait IncomingHandler: Send + Sync + 'static {
    fn handle(
        &self,
        request: IncomingRequest,
        out: ResponseOutparam,
    ) -> impl Future<Output = ()> + Send;
}
