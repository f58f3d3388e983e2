//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Plain handlers are
//! registered one template at a time; controllers bring their own dispatch
//! table and only claim two templates per verb.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::controller::{Controller, TAIL_PARAM};
use crate::dispatcher::MountedController;
use crate::execution::ExecutionContext;
use crate::handler::{Handler, SharedEndpoint};
use crate::request::Request;
use crate::response::Response;
use crate::verb::Verb;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<SharedEndpoint>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if the template is invalid or conflicts with one already
    /// registered for `method`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler.into_endpoint())
    }

    /// Mounts a controller under `parent`, e.g. `""` or `"/api/v1"`.
    ///
    /// For a controller named `test` this claims `{parent}/test` and
    /// `{parent}/test/{*params}` for all six controller verbs, so every
    /// request under the controller reaches its dispatcher, including ones
    /// for operations it does not have.
    ///
    /// ```
    /// use autoroute::{Context, Controller, Router};
    ///
    /// struct TestController;
    ///
    /// let test = Controller::builder(TestController)
    ///     .method("Fn", |_: &TestController, ctx: &mut Context| ctx.write_str("get"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let app = Router::new().mount("/api/", test);  // GET /api/test/fn
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the controller's templates conflict with existing routes.
    pub fn mount<T, X>(self, parent: &str, mut controller: Controller<T, X>) -> Self
    where
        T: Send + Sync + 'static,
        X: ExecutionContext,
    {
        let parent = parent.trim_end_matches('/');
        controller.parent = match parent {
            "" => String::new(),
            p if p.starts_with('/') => p.to_owned(),
            p => format!("/{p}"),
        };

        let base = format!("{}/{}", controller.parent, controller.name);
        let tail = format!("{base}/{{*{TAIL_PARAM}}}");
        debug!(controller = %controller.name, path = %base, keys = ?controller.keys(), "mounting controller");

        let endpoint: SharedEndpoint = Arc::new(MountedController(Arc::new(controller)));
        Verb::ALL.into_iter().fold(self, |router, verb| {
            router
                .add(verb.to_method(), &base, Arc::clone(&endpoint))
                .add(verb.to_method(), &tail, Arc::clone(&endpoint))
        })
    }

    fn add(mut self, method: Method, path: &str, endpoint: SharedEndpoint) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(SharedEndpoint, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let endpoint = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((endpoint, params))
    }

    /// Routes one request and produces its response: `404` when no template
    /// matches. Used by the server, and handy for driving an app in tests.
    ///
    /// A path with one trailing `/` that matches nothing is retried without
    /// it, so `/users/` reaches a controller mounted at `/users`.
    pub async fn call(&self, mut req: Request) -> Response {
        let found = self.lookup(req.method(), req.path()).or_else(|| {
            let trimmed = req.path().strip_suffix('/').filter(|p| !p.is_empty())?;
            self.lookup(req.method(), trimmed)
        });
        match found {
            Some((endpoint, params)) => {
                req.params.extend(params);
                endpoint.respond(req).await
            }
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
