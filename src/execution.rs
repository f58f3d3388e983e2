//! Execution contexts: what a controller operation receives.
//!
//! By default operations get the raw [`Context`] and their [`Reply`] is
//! written by the controller's [`ResultEncoder`]. A controller built with
//! [`Controller::with_context`](crate::Controller::with_context) instead hands
//! every operation a caller-defined wrapper, produced per request by a
//! [`ContextFactory`], and the wrapper decides how replies are written.
//!
//! ```
//! use autoroute::{Context, ExecutionContext, Reply, ResultEncoder};
//!
//! /// Wraps every reply in `{"data": ...}`.
//! struct Envelope(Context);
//!
//! impl ExecutionContext for Envelope {
//!     fn context(&self) -> &Context { &self.0 }
//!     fn context_mut(&mut self) -> &mut Context { &mut self.0 }
//!     fn into_context(self) -> Context { self.0 }
//!
//!     fn set_result(&mut self, reply: Reply, encoder: &ResultEncoder) {
//!         match reply {
//!             Reply::Structured(v) => match v.to_value() {
//!                 Ok(data) => encoder.encode(&mut self.0, Reply::json(serde_json::json!({ "data": data }))),
//!                 Err(e) => encoder.encode(&mut self.0, Reply::error(e)),
//!             },
//!             other => encoder.encode(&mut self.0, other),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::context::Context;
use crate::encoder::ResultEncoder;
use crate::reply::Reply;

/// A per-request context an operation runs against.
pub trait ExecutionContext: Send + 'static {
    fn context(&self) -> &Context;

    fn context_mut(&mut self) -> &mut Context;

    /// Receives the operation's return value. Called exactly once per invoked
    /// operation, with [`Reply::Empty`] when there was nothing returned.
    fn set_result(&mut self, reply: Reply, encoder: &ResultEncoder);

    /// Gives back the raw context so the response can be sent.
    fn into_context(self) -> Context
    where
        Self: Sized;
}

impl ExecutionContext for Context {
    fn context(&self) -> &Context { self }

    fn context_mut(&mut self) -> &mut Context { self }

    fn set_result(&mut self, reply: Reply, encoder: &ResultEncoder) {
        encoder.encode(self, reply);
    }

    fn into_context(self) -> Context { self }
}

/// Builds an execution context from the raw one.
///
/// Returning `Err(ctx)` ends dispatch on the spot: nothing else runs and `ctx`,
/// with whatever the factory wrote into it, becomes the response.
pub type ContextFactory<X> = Arc<dyn Fn(Context) -> Result<X, Context> + Send + Sync + 'static>;

pub(crate) fn raw_factory() -> ContextFactory<Context> {
    Arc::new(Ok::<Context, Context>)
}
