//! The application handler the cache sits in front of.

use std::future::Future;
use std::pin::Pin;

use crate::http::{Request, Response};
use crate::validation::ConditionalRequest;

/// Boxed future returned by an [`Origin`].
pub type OriginFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Produces responses for requests the cache cannot answer itself.
///
/// The cache passes the conditional headers it wants checked, both written
/// onto `request` and separately as `conditional`. An origin that finds them
/// matching answers `304 Not Modified` with no body; otherwise it renders.
/// Either way the response carries `Cache-Control` and any validators.
///
/// Any `Fn(Request, ConditionalRequest) -> impl Future<Output = Response>`
/// that is `Send + Sync + 'static` implements this trait.
pub trait Origin: Send + Sync + 'static {
    fn handle(&self, request: Request, conditional: ConditionalRequest) -> OriginFuture;
}

impl<T, F> Origin for T
where
    T: Fn(Request, ConditionalRequest) -> F + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, request: Request, conditional: ConditionalRequest) -> OriginFuture {
        Box::pin((self)(request, conditional))
    }
}
