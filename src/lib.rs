//! # autoroute
//!
//! Convention-based controllers on a minimal hyper framework.
//!
//! Register an object and a table of its methods; autoroute derives the
//! routes from the names. `TestController` mounts at `/test`, a method
//! declared as `Fn` answers `GET /test/fn`, `PostFn` answers `POST /test/fn`,
//! and whatever follows the operation segment reaches the method as the
//! `params` path parameter.
//!
//! Per request the controller:
//!
//! - splits the path tail into operation and parameters,
//! - builds the execution context (the raw [`Context`], or a custom wrapper),
//! - runs its [`RequestMiddleware`] chain, any of which may stop the request,
//! - invokes the operation, and
//! - encodes the returned [`Reply`] (bytes verbatim, errors as text, anything
//!   serializable as JSON).
//!
//! The host side, routing, connections and graceful shutdown, stays as small
//! as it can: [`Router`] is a [`matchit`] radix tree per method and [`Server`]
//! is a tokio accept loop over hyper.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use autoroute::{Context, Controller, Json, Router, Server};
//!
//! struct UserController;
//!
//! impl UserController {
//!     // GET /api/user/list
//!     fn list(&self, _ctx: &mut Context) -> Json<Vec<&'static str>> {
//!         Json(vec!["alice", "bob"])
//!     }
//!
//!     // GET /api/user/avatar/{anything}
//!     fn avatar(&self, ctx: &mut Context) -> Vec<u8> {
//!         let who = ctx.param("params").unwrap_or_default();
//!         format!("<svg>{who}</svg>").into_bytes()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), autoroute::Error> {
//!     let users = Controller::builder(UserController)
//!         .method("List", UserController::list)
//!         .method("Avatar", UserController::avatar)
//!         .build()?;
//!
//!     let app = Router::new().mount("/api", users);
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//! ```

mod context;
mod controller;
mod dispatcher;
mod encoder;
mod error;
mod execution;
mod handler;
mod reply;
mod request;
mod response;
mod router;
mod server;
mod verb;

pub mod color;
pub mod middleware;
pub mod naming;

pub use context::Context;
pub use controller::{Controller, ControllerBuilder, DispatchKey, MethodEntry, TAIL_PARAM};
pub use encoder::ResultEncoder;
pub use error::Error;
pub use execution::{ContextFactory, ExecutionContext};
pub use handler::Handler;
pub use middleware::{AccessLog, RequestArg, RequestMiddleware};
pub use reply::{BoxError, IntoReply, Json, Reply, StatusError, Structured};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use verb::Verb;
