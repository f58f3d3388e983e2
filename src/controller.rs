//! Controllers and their dispatch tables.
//!
//! A controller owns one instance of a user type plus a table mapping
//! `(verb, operation)` to a method on that instance. The table is filled
//! through [`ControllerBuilder`], either from declared method names run
//! through [`naming::classify`](crate::naming::classify) or from explicit
//! keys, and is frozen once [`ControllerBuilder::build`] succeeds.
//!
//! ```
//! use autoroute::{Context, Controller, Json};
//!
//! struct UserController;
//!
//! impl UserController {
//!     fn list(&self, _ctx: &mut Context) -> Json<Vec<&'static str>> {
//!         Json(vec!["alice", "bob"])
//!     }
//!
//!     fn post_avatar(&self, ctx: &mut Context) {
//!         ctx.write_str("stored");
//!     }
//! }
//!
//! let users = Controller::builder(UserController)
//!     .method("List", UserController::list)            // GET  /user/list
//!     .method("PostAvatar", UserController::post_avatar) // POST /user/avatar
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(users.name(), "user");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::context::Context;
use crate::encoder::ResultEncoder;
use crate::error::Error;
use crate::execution::{ContextFactory, ExecutionContext, raw_factory};
use crate::middleware::RequestMiddleware;
use crate::naming;
use crate::reply::{IntoReply, Reply};
use crate::verb::Verb;

/// Path parameter holding everything after the controller's route name.
pub const TAIL_PARAM: &str = "params";

type Callable<T, X> = Box<dyn Fn(&T, &mut X) -> Reply + Send + Sync + 'static>;

/// A `(verb, operation)` pair. Displays as `get/fn`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct DispatchKey {
    pub verb: Verb,
    pub operation: String,
}

impl DispatchKey {
    pub fn new(verb: Verb, operation: impl Into<String>) -> Self {
        Self { verb, operation: operation.into() }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.verb.as_str(), self.operation)
    }
}

/// One dispatchable operation.
pub struct MethodEntry<T, X> {
    verb: Verb,
    operation: String,
    declared: String,
    callable: Callable<T, X>,
}

impl<T, X> MethodEntry<T, X> {
    pub fn verb(&self) -> Verb { self.verb }
    pub fn operation(&self) -> &str { &self.operation }

    /// The name the entry was registered under, before classification.
    pub fn declared_name(&self) -> &str { &self.declared }

    pub fn key(&self) -> DispatchKey {
        DispatchKey::new(self.verb, self.operation.as_str())
    }

    pub(crate) fn invoke(&self, instance: &T, ctx: &mut X) -> Reply {
        (self.callable)(instance, ctx)
    }
}

impl<T, X> fmt::Debug for MethodEntry<T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("verb", &self.verb)
            .field("operation", &self.operation)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// A registered controller: an owned instance, its dispatch table, and the
/// per-request pipeline configuration.
///
/// `X` is the execution context operations receive: the raw [`Context`]
/// unless the controller was built with [`Controller::with_context`].
pub struct Controller<T, X = Context> {
    pub(crate) name: String,
    pub(crate) parent: String,
    pub(crate) instance: T,
    pub(crate) table: HashMap<Verb, HashMap<String, MethodEntry<T, X>>>,
    pub(crate) factory: ContextFactory<X>,
    pub(crate) custom_context: bool,
    pub(crate) middlewares: Vec<Box<dyn RequestMiddleware<X>>>,
    pub(crate) encoder: ResultEncoder,
}

impl<T> Controller<T, Context>
where
    T: Send + Sync + 'static,
{
    /// Starts a controller whose operations receive the raw [`Context`].
    pub fn builder(instance: T) -> ControllerBuilder<T, Context> {
        ControllerBuilder::new(instance, raw_factory(), false)
    }
}

impl<T, X> Controller<T, X>
where
    T: Send + Sync + 'static,
    X: ExecutionContext,
{
    /// Starts a controller whose operations receive an `X` built by `factory`
    /// on every request. Replies go to [`ExecutionContext::set_result`].
    pub fn with_context<F>(instance: T, factory: F) -> ControllerBuilder<T, X>
    where
        F: Fn(Context) -> Result<X, Context> + Send + Sync + 'static,
    {
        ControllerBuilder::new(instance, Arc::new(factory), true)
    }
}

impl<T, X> Controller<T, X> {
    /// The snake-case route name the controller mounts under.
    pub fn name(&self) -> &str { &self.name }

    /// Path of the router scope the controller was mounted in, without a
    /// trailing `/`. Empty until mounted, and for root mounts.
    pub fn parent_path(&self) -> &str { &self.parent }

    pub fn instance(&self) -> &T { &self.instance }

    pub fn has_custom_context(&self) -> bool { self.custom_context }

    pub fn entry(&self, verb: Verb, operation: &str) -> Option<&MethodEntry<T, X>> {
        self.table.get(&verb)?.get(operation)
    }

    pub fn contains(&self, verb: Verb, operation: &str) -> bool {
        self.entry(verb, operation).is_some()
    }

    /// Every dispatch key, sorted.
    pub fn keys(&self) -> Vec<DispatchKey> {
        let mut keys: Vec<_> = self.table.values().flat_map(HashMap::values).map(MethodEntry::key).collect();
        keys.sort();
        keys
    }
}

impl<T, X> fmt::Debug for Controller<T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("keys", &self.keys())
            .field("custom_context", &self.custom_context)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

// ── ControllerBuilder ─────────────────────────────────────────────────────────

/// Registration table for a [`Controller`].
///
/// Entries registered later replace earlier ones with the same key.
pub struct ControllerBuilder<T, X = Context> {
    instance: T,
    name: Option<String>,
    table: HashMap<Verb, HashMap<String, MethodEntry<T, X>>>,
    factory: ContextFactory<X>,
    custom_context: bool,
    middlewares: Vec<Box<dyn RequestMiddleware<X>>>,
    encoder: ResultEncoder,
}

impl<T, X> ControllerBuilder<T, X>
where
    T: Send + Sync + 'static,
    X: ExecutionContext,
{
    fn new(instance: T, factory: ContextFactory<X>, custom_context: bool) -> Self {
        Self {
            instance,
            name: None,
            table: HashMap::new(),
            factory,
            custom_context,
            middlewares: Vec::new(),
            encoder: ResultEncoder::new(),
        }
    }

    /// Overrides the route name derived from `T`'s type name. The override is
    /// snake-cased; an empty override fails [`build`](Self::build).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Registers `callable` under a declared camel-case name.
    ///
    /// The verb comes from the name's prefix (`PostAvatar` → `POST avatar`),
    /// defaulting to `GET` (`Avatar` → `GET avatar`). A bare verb (`Post`)
    /// registers the verb's default operation, which also catches paths whose
    /// first segment matches nothing else.
    pub fn method<F, R>(self, declared: &str, callable: F) -> Self
    where
        F: Fn(&T, &mut X) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let (verb, operation) = naming::classify(declared);
        self.insert(verb, operation, declared.to_owned(), callable)
    }

    /// Registers `callable` under an explicit verb and operation. The
    /// operation is snake-cased; `""` is the verb's default operation.
    pub fn route<F, R>(self, verb: Verb, operation: &str, callable: F) -> Self
    where
        F: Fn(&T, &mut X) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let declared = format!("{}{}", verb.prefix(), operation);
        self.insert(verb, naming::snake_case(operation), declared, callable)
    }

    /// Appends a middleware. Middleware runs in registration order.
    pub fn middleware(mut self, middleware: impl RequestMiddleware<X>) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Status for error replies that do not carry one. Errors keep the
    /// response status (normally `200`) when this is not set.
    pub fn error_status(mut self, status: StatusCode) -> Self {
        self.encoder = ResultEncoder::with_error_status(status);
        self
    }

    pub fn build(self) -> Result<Controller<T, X>, Error> {
        let name = naming::controller_name(std::any::type_name::<T>(), self.name.as_deref())?;
        debug!(
            controller = %name,
            operations = self.table.values().map(HashMap::len).sum::<usize>(),
            custom_context = self.custom_context,
            "controller built"
        );

        Ok(Controller {
            name,
            parent: String::new(),
            instance: self.instance,
            table: self.table,
            factory: self.factory,
            custom_context: self.custom_context,
            middlewares: self.middlewares,
            encoder: self.encoder,
        })
    }

    fn insert<F, R>(mut self, verb: Verb, operation: String, declared: String, callable: F) -> Self
    where
        F: Fn(&T, &mut X) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        let callable: Callable<T, X> =
            Box::new(move |instance: &T, ctx: &mut X| callable(instance, ctx).into_reply());
        let entry = MethodEntry { verb, operation: operation.clone(), declared, callable };

        if let Some(old) = self.table.entry(verb).or_default().insert(operation, entry) {
            debug!(key = %old.key(), replaced = old.declared_name(), "dispatch entry overwritten");
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestController;

    impl TestController {
        fn get_fn(&self, ctx: &mut Context) {
            ctx.write_str("get");
        }

        fn post_fn(&self, ctx: &mut Context) {
            ctx.write_str("post");
        }
    }

    #[test]
    fn builds_table_from_declared_names() {
        let controller = Controller::builder(TestController)
            .method("Fn", TestController::get_fn)
            .method("PostFn", TestController::post_fn)
            .method("Delete", |_: &TestController, _: &mut Context| ())
            .build()
            .unwrap();

        assert_eq!(controller.name(), "test");
        assert_eq!(
            controller.keys().iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["get/fn", "post/fn", "delete/"]
        );
        assert_eq!(controller.entry(Verb::Post, "fn").unwrap().declared_name(), "PostFn");
        assert!(!controller.has_custom_context());
    }

    #[test]
    fn later_entries_overwrite() {
        let controller = Controller::builder(TestController)
            .method("Fn", TestController::get_fn)
            .route(Verb::Get, "fn", TestController::post_fn)
            .build()
            .unwrap();

        assert_eq!(controller.keys().len(), 1);
        assert_eq!(controller.entry(Verb::Get, "fn").unwrap().declared_name(), "Getfn");
    }

    #[test]
    fn explicit_route_is_snake_cased() {
        let controller = Controller::builder(TestController)
            .route(Verb::Patch, "UserName", TestController::get_fn)
            .build()
            .unwrap();
        assert!(controller.contains(Verb::Patch, "user_name"));
    }

    #[test]
    fn name_override() {
        let controller = Controller::builder(TestController).name("Admin").build().unwrap();
        assert_eq!(controller.name(), "admin");

        let err = Controller::builder(TestController).name("").build().unwrap_err();
        assert!(matches!(err, Error::EmptyOverride(_)));
    }

    #[test]
    fn suffix_only_type_needs_a_name() {
        struct Controller;
        let err = super::Controller::builder(Controller).build().unwrap_err();
        assert!(matches!(err, Error::EmptyName(_)));
    }
}
