//! Endpoints: everything the router can hand a request to.
//!
//! The route trees hold two kinds of endpoint side by side, plain async
//! functions registered with [`Router::on`](crate::Router::on) and mounted
//! controllers, so both are erased to one trait object:
//!
//! ```text
//! router.on(GET, "/ping", ping)          router.mount("/api", controller)
//!          │                                       │
//!   FnEndpoint<typeof ping>             MountedController<T, X>
//!          └──────────── SharedEndpoint ───────────┘
//!                  endpoint.respond(req).await → Response
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The future an endpoint returns.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Object-safe endpoint interface.
///
/// `#[doc(hidden)] pub` because it shows up in [`Handler::into_endpoint`].
#[doc(hidden)]
pub trait Endpoint: Send + Sync + 'static {
    fn respond(&self, req: Request) -> BoxFuture;
}

/// How the router stores endpoints: shared by every template that maps to
/// them and by every in-flight request.
#[doc(hidden)]
pub type SharedEndpoint = Arc<dyn Endpoint>;

/// A plain route handler: any `async fn(Request) -> impl IntoResponse`.
///
/// Cannot be implemented outside this crate; the blanket impl covers every
/// function and closure with that shape.
pub trait Handler: sealed::Sealed {
    #[doc(hidden)]
    fn into_endpoint(self) -> SharedEndpoint;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn into_endpoint(self) -> SharedEndpoint {
        Arc::new(FnEndpoint(self))
    }
}

struct FnEndpoint<F>(F);

impl<F, Fut> Endpoint for FnEndpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn respond(&self, req: Request) -> BoxFuture {
        let pending = (self.0)(req);
        Box::pin(async move { pending.await.into_response() })
    }
}
