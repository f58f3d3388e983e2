//! Request dispatch for mounted controllers.
//!
//! Every request under `/{name}` or `/{name}/{*params}` goes through the same
//! steps:
//!
//! ```text
//! tail "fn/a/b"          → operation "fn", params "a/b"
//!                          (no "fn" entry but a default one? operation "", params "fn/a/b")
//! context factory        → X, or stop with the factory's response
//! middleware, in order   → may rewrite operation/params, may stop
//! republish params       → ctx.param("params") == final params
//! table lookup           → 404 if the operation does not exist
//! invoke                 → Reply
//! X::set_result          → bytes on the wire
//! ```

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error, warn};

use crate::context::Context;
use crate::controller::{Controller, TAIL_PARAM};
use crate::execution::ExecutionContext;
use crate::handler::{BoxFuture, Endpoint};
use crate::middleware::RequestArg;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::verb::Verb;

impl<T, X> Controller<T, X>
where
    T: Send + Sync + 'static,
    X: ExecutionContext,
{
    /// Runs one request through the controller and returns the context
    /// holding the response.
    ///
    /// The tail is read from the `params` path parameter. Unknown operations
    /// answer `404` with a message naming the verb, the controller path and
    /// the operation.
    pub fn dispatch(&self, mut ctx: Context) -> Context {
        let Some(verb) = Verb::from_method(ctx.method()) else {
            let message = format!("{} {}/{}: method not supported", ctx.method(), self.parent, self.name);
            reject(&mut ctx, StatusCode::METHOD_NOT_ALLOWED, &message);
            return ctx;
        };

        let mut arg = self.split_tail(verb, ctx.param(TAIL_PARAM).unwrap_or_default());

        let mut exec = match (self.factory)(ctx) {
            Ok(exec) => exec,
            Err(ctx) => {
                debug!(controller = %self.name, "context factory ended the request");
                return ctx;
            }
        };

        for middleware in &self.middlewares {
            middleware.handle(&mut exec, &mut arg);
            if arg.is_stopped() {
                debug!(controller = %self.name, operation = arg.operation(), "stopped by middleware");
                return exec.into_context();
            }
        }

        exec.context_mut().set_param(TAIL_PARAM, arg.params());

        let Some(entry) = self.entry(verb, arg.operation()) else {
            let message = format!("{verb} {}/{}: no operation `{}`", self.parent, self.name, arg.operation());
            warn!("{message}");
            let mut ctx = exec.into_context();
            reject(&mut ctx, StatusCode::NOT_FOUND, &message);
            return ctx;
        };

        debug!(key = %entry.key(), params = arg.params(), "dispatching");
        let reply = entry.invoke(&self.instance, &mut exec);
        exec.set_result(reply, &self.encoder);
        exec.into_context()
    }

    /// Splits the captured tail into the operation and its parameters.
    ///
    /// When the first segment names no operation for `verb` but the verb has
    /// a default operation, the default takes the whole tail as parameters.
    pub fn split_tail(&self, verb: Verb, tail: &str) -> RequestArg {
        let tail = tail.trim_matches('/');
        let (operation, params) = tail.split_once('/').unwrap_or((tail, ""));

        if !self.contains(verb, operation) && self.contains(verb, "") {
            RequestArg::new("", tail)
        } else {
            RequestArg::new(operation, params)
        }
    }
}

fn reject(ctx: &mut Context, status: StatusCode, message: &str) {
    ctx.set_status(status);
    ctx.default_content_type(ContentType::Text);
    ctx.write_str(message);
}

// ── Handler adapter ───────────────────────────────────────────────────────────

/// A mounted controller, as stored in the router.
///
/// Dispatch is synchronous and operations may block, so each request runs on
/// tokio's blocking pool. A panic there comes back as a `JoinError` and is
/// answered with `500`; the connection task never sees it.
pub(crate) struct MountedController<T, X>(pub(crate) Arc<Controller<T, X>>);

impl<T, X> Endpoint for MountedController<T, X>
where
    T: Send + Sync + 'static,
    X: ExecutionContext,
{
    fn respond(&self, req: Request) -> BoxFuture {
        let controller = Arc::clone(&self.0);
        Box::pin(async move {
            let path = req.path().to_owned();
            let ctx = Context::new(req);
            match tokio::task::spawn_blocking(move || controller.dispatch(ctx)).await {
                Ok(ctx) => ctx.into_response(),
                Err(e) => {
                    error!(%path, "controller dispatch failed: {e}");
                    Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .text("internal server error")
                }
            }
        })
    }
}
