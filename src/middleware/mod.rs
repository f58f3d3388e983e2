//! Middleware.
//!
//! Two layers live here:
//!
//! - [`RequestMiddleware`] runs inside a controller, after the path has been
//!   split into an operation and its parameters but before the operation is
//!   looked up. It can rewrite either, or stop the request.
//! - [`AccessLog`] runs at the server and renders one line per request.

mod access_log;

pub use access_log::{AccessLog, DEFAULT_LAYOUT, DEFAULT_LAYOUT_WITH_HEADER, RequestSummary};

/// Per-request routing state seen by controller middleware.
///
/// Starts out as the operation and tail parameters parsed from the path.
/// Whatever it holds after the last middleware is what dispatch uses: the
/// operation picks the dispatch entry and the parameters are republished as
/// the `params` path parameter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestArg {
    operation: String,
    params: String,
    stopped: bool,
}

impl RequestArg {
    pub fn new(operation: impl Into<String>, params: impl Into<String>) -> Self {
        Self { operation: operation.into(), params: params.into(), stopped: false }
    }

    /// The operation about to be dispatched, in snake case.
    pub fn operation(&self) -> &str { &self.operation }

    /// Redirects the request to another operation. Must be snake case.
    pub fn set_operation(&mut self, operation: impl Into<String>) {
        self.operation = operation.into();
    }

    /// The path remainder after the operation segment.
    pub fn params(&self) -> &str { &self.params }

    pub fn set_params(&mut self, params: impl Into<String>) {
        self.params = params.into();
    }

    /// Ends the request after the current middleware returns. Later
    /// middleware and the operation are skipped; the middleware is expected
    /// to have written its own response.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool { self.stopped }
}

/// Controller middleware over execution context `X`.
///
/// Implemented for every `Fn(&mut X, &mut RequestArg)` closure:
///
/// ```
/// use autoroute::{Context, RequestArg};
/// use http::StatusCode;
///
/// let require_token = |ctx: &mut Context, arg: &mut RequestArg| {
///     if ctx.header("x-token").is_none() {
///         ctx.set_status(StatusCode::UNAUTHORIZED);
///         arg.stop();
///     }
/// };
/// # let _ = require_token;
/// ```
pub trait RequestMiddleware<X>: Send + Sync + 'static {
    fn handle(&self, ctx: &mut X, arg: &mut RequestArg);
}

impl<X, F> RequestMiddleware<X> for F
where
    F: Fn(&mut X, &mut RequestArg) + Send + Sync + 'static,
{
    fn handle(&self, ctx: &mut X, arg: &mut RequestArg) {
        self(ctx, arg)
    }
}
