use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use autoroute::{
    Context, Controller, ExecutionContext, Json, Reply, Request, RequestArg, Response,
    ResultEncoder, Router, StatusError,
};
use bytes::Bytes;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde::Serialize;

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct TestController {
    hits: Arc<AtomicUsize>,
}

impl TestController {
    fn get_fn(&self, ctx: &mut Context) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let params = ctx.param("params").unwrap_or_default().to_owned();
        ctx.write_str(&format!("get [{params}]"));
    }

    fn post_fn(&self, ctx: &mut Context) {
        ctx.write_str("post");
    }
}

fn request(method: Method, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap()
        .into()
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let res: Response = app.call(request(method, uri)).await;
    (res.status_code(), String::from_utf8_lossy(res.body()).into_owned())
}

fn test_app() -> Router {
    let test = Controller::builder(TestController::default())
        .method("Fn", TestController::get_fn)
        .method("PostFn", TestController::post_fn)
        .build()
        .unwrap();
    Router::new().mount("", test)
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn verb_prefix_selects_operation() {
    let app = test_app();
    assert_eq!(send(&app, Method::GET, "/test/fn").await, (StatusCode::OK, "get []".to_owned()));
    assert_eq!(send(&app, Method::POST, "/test/fn").await, (StatusCode::OK, "post".to_owned()));
}

#[tokio::test]
async fn tail_after_operation_becomes_params() {
    let app = test_app();
    let (_, body) = send(&app, Method::GET, "/test/fn/extra/path?a=123").await;
    assert_eq!(body, "get [extra/path]");
}

#[tokio::test]
async fn unknown_operation_names_controller_and_operation() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/test/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "GET /test: no operation `unknown`");
}

#[tokio::test]
async fn paths_outside_controllers_are_not_found() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/other/fn").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "");
}

#[tokio::test]
async fn default_operation_catches_unmatched_tails() {
    let files = Controller::builder(TestController::default())
        .name("files")
        .method("Get", |_: &TestController, ctx: &mut Context| {
            let params = ctx.param("params").unwrap_or_default().to_owned();
            ctx.write_str(&params);
        })
        .build()
        .unwrap();
    let app = Router::new().mount("/static", files);

    assert_eq!(send(&app, Method::GET, "/static/files/whatever/more").await.1, "whatever/more");
    assert_eq!(send(&app, Method::GET, "/static/files").await.1, "");
}

#[tokio::test]
async fn trailing_slash_behaves_like_bare_controller_path() {
    let files = Controller::builder(TestController::default())
        .name("files")
        .method("Get", |_: &TestController, ctx: &mut Context| {
            let params = ctx.param("params").unwrap_or_default().to_owned();
            ctx.write_str(&format!("default[{params}]"));
        })
        .method("Fn", |_: &TestController, ctx: &mut Context| ctx.write_str("fn[]"))
        .build()
        .unwrap();
    let app = Router::new().mount("", files);

    assert_eq!(send(&app, Method::GET, "/files").await, (StatusCode::OK, "default[]".to_owned()));
    assert_eq!(send(&app, Method::GET, "/files/").await, (StatusCode::OK, "default[]".to_owned()));
    assert_eq!(send(&app, Method::GET, "/files/fn/").await, (StatusCode::OK, "fn[]".to_owned()));

    // Without a default operation the controller answers with its own diagnostic.
    let (status, body) = send(&test_app(), Method::GET, "/test/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "GET /test: no operation ``");
}

#[tokio::test]
async fn same_methods_under_two_names_stay_independent() {
    let v1 = TestController::default();
    let v2 = TestController::default();

    let app = Router::new()
        .mount("", Controller::builder(v1.clone()).name("v1").method("Fn", TestController::get_fn).build().unwrap())
        .mount("", Controller::builder(v2.clone()).name("v2").method("Fn", TestController::get_fn).build().unwrap());

    send(&app, Method::GET, "/v1/fn").await;
    send(&app, Method::GET, "/v1/fn").await;
    send(&app, Method::GET, "/v2/fn").await;

    assert_eq!(v1.hits.load(Ordering::SeqCst), 2);
    assert_eq!(v2.hits.load(Ordering::SeqCst), 1);
}

// ── Middleware ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stop_prevents_invocation() {
    let controller = TestController::default();
    let ran_second = Arc::new(AtomicUsize::new(0));
    let second = Arc::clone(&ran_second);

    let test = Controller::builder(controller.clone())
        .method("Fn", TestController::get_fn)
        .middleware(|ctx: &mut Context, arg: &mut RequestArg| {
            if ctx.header("authorization").is_none() {
                ctx.set_status(StatusCode::UNAUTHORIZED);
                ctx.write_str("login first");
                arg.stop();
            }
        })
        .middleware(move |_: &mut Context, _: &mut RequestArg| {
            second.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    let app = Router::new().mount("", test);

    let (status, body) = send(&app, Method::GET, "/test/fn").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "login first");
    assert_eq!(controller.hits.load(Ordering::SeqCst), 0);
    assert_eq!(ran_second.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn middleware_params_are_republished() {
    let test = Controller::builder(TestController::default())
        .method("Fn", TestController::get_fn)
        .middleware(|_: &mut Context, arg: &mut RequestArg| {
            let upper = arg.params().to_uppercase();
            arg.set_params(upper);
        })
        .build()
        .unwrap();
    let app = Router::new().mount("", test);

    assert_eq!(send(&app, Method::GET, "/test/fn/abc").await.1, "get [ABC]");
}

// ── Result encoding ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct User {
    id: u32,
    name: &'static str,
}

struct ReplyController;

fn reply_app() -> Router {
    let replies = Controller::builder(ReplyController)
        .method("Raw", |_: &ReplyController, _: &mut Context| Bytes::from_static(b"\x00raw\xff"))
        .method("Fail", |_: &ReplyController, _: &mut Context| -> Result<(), io::Error> {
            Err(io::Error::other("user not found"))
        })
        .method("Conflict", |_: &ReplyController, _: &mut Context| -> Result<(), StatusError> {
            Err(StatusError::new(StatusCode::CONFLICT, "already exists"))
        })
        .method("User", |_: &ReplyController, _: &mut Context| Json(User { id: 1, name: "alice" }))
        .method("Nothing", |_: &ReplyController, _: &mut Context| ())
        .method("Direct", |_: &ReplyController, ctx: &mut Context| ctx.write_str("direct"))
        .method("Boom", |_: &ReplyController, _: &mut Context| -> () { panic!("operation bug") })
        .build()
        .unwrap();
    Router::new().mount("", replies)
}

#[tokio::test]
async fn bytes_are_written_unmodified() {
    let res = reply_app().call(request(Method::GET, "/reply/raw")).await;
    assert_eq!(&res.body()[..], b"\x00raw\xff");
}

#[tokio::test]
async fn errors_are_written_as_text() {
    let app = reply_app();
    assert_eq!(send(&app, Method::GET, "/reply/fail").await, (StatusCode::OK, "user not found".to_owned()));
    assert_eq!(
        send(&app, Method::GET, "/reply/conflict").await,
        (StatusCode::CONFLICT, "already exists".to_owned())
    );
}

#[tokio::test]
async fn error_status_is_configurable() {
    let strict = Controller::builder(ReplyController)
        .error_status(StatusCode::BAD_REQUEST)
        .method("Fail", |_: &ReplyController, _: &mut Context| Err::<(), _>("bad input"))
        .build()
        .unwrap();
    let app = Router::new().mount("", strict);
    assert_eq!(send(&app, Method::GET, "/reply/fail").await, (StatusCode::BAD_REQUEST, "bad input".to_owned()));
}

#[tokio::test]
async fn values_are_written_as_json() {
    let res = reply_app().call(request(Method::GET, "/reply/user")).await;
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(&res.body()[..], br#"{"id":1,"name":"alice"}"#);
}

#[tokio::test]
async fn no_return_value_writes_no_body() {
    let app = reply_app();
    assert_eq!(send(&app, Method::GET, "/reply/nothing").await, (StatusCode::OK, String::new()));
    assert_eq!(send(&app, Method::GET, "/reply/direct").await.1, "direct");
}

#[tokio::test]
async fn panicking_operation_is_a_server_error() {
    let app = reply_app();
    assert_eq!(send(&app, Method::GET, "/reply/boom").await.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(send(&app, Method::GET, "/reply/direct").await.1, "direct");
}

fn crashing(uri: &str) -> Request {
    http::Request::get(uri).header("x-crash", "1").body(Bytes::new()).unwrap().into()
}

#[tokio::test]
async fn panicking_middleware_is_a_server_error() {
    let test = Controller::builder(TestController::default())
        .method("Fn", TestController::get_fn)
        .middleware(|ctx: &mut Context, _: &mut RequestArg| -> () {
            if ctx.header("x-crash").is_some() {
                panic!("middleware bug");
            }
        })
        .build()
        .unwrap();
    let app = Router::new().mount("", test);

    let res = app.call(crashing("/test/fn")).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(send(&app, Method::GET, "/test/fn").await, (StatusCode::OK, "get []".to_owned()));
}

#[tokio::test]
async fn panicking_context_factory_is_a_server_error() {
    let test = Controller::with_context(TestController::default(), |ctx: Context| -> Result<Context, Context> {
        if ctx.header("x-crash").is_some() {
            panic!("factory bug");
        }
        Ok(ctx)
    })
    .name("test")
    .method("Fn", TestController::get_fn)
    .build()
    .unwrap();
    let app = Router::new().mount("", test);

    let res = app.call(crashing("/test/fn")).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(send(&app, Method::GET, "/test/fn").await, (StatusCode::OK, "get []".to_owned()));
}

// ── Custom contexts ───────────────────────────────────────────────────────────

/// Remembers the full request path and writes replies as `text: <json>`.
struct TracedContext {
    ctx: Context,
    full_path: String,
    results: Arc<AtomicUsize>,
}

impl ExecutionContext for TracedContext {
    fn context(&self) -> &Context { &self.ctx }
    fn context_mut(&mut self) -> &mut Context { &mut self.ctx }
    fn into_context(self) -> Context { self.ctx }

    fn set_result(&mut self, reply: Reply, encoder: &ResultEncoder) {
        self.results.fetch_add(1, Ordering::SeqCst);
        match reply {
            Reply::Structured(value) => {
                let json = value.to_json().unwrap_or_default();
                self.ctx.write_str("text: ");
                self.ctx.write(&json);
            }
            other => encoder.encode(&mut self.ctx, other),
        }
    }
}

struct CustomController;

fn custom_app(results: Arc<AtomicUsize>) -> Router {
    let custom = Controller::with_context(CustomController, move |ctx: Context| {
        if ctx.header("x-deny").is_some() {
            let mut ctx = ctx;
            ctx.set_status(StatusCode::FORBIDDEN);
            return Err(ctx);
        }
        let full_path = ctx.full_path().to_owned();
        Ok(TracedContext { ctx, full_path, results: Arc::clone(&results) })
    })
    .name("test")
    .method("Fn", |_: &CustomController, ctx: &mut TracedContext| ctx.full_path.clone())
    .method("PostFn", |_: &CustomController, _: &mut TracedContext| ())
    .middleware(|ctx: &mut TracedContext, arg: &mut RequestArg| {
        if ctx.full_path.ends_with("?skip") {
            arg.stop();
        }
    })
    .build()
    .unwrap();
    Router::new().mount("", custom)
}

#[tokio::test]
async fn custom_context_receives_reply() {
    let results = Arc::new(AtomicUsize::new(0));
    let app = custom_app(Arc::clone(&results));

    let (_, body) = send(&app, Method::GET, "/test/fn/getparam?a=123").await;
    assert_eq!(body, r#"text: "/test/fn/getparam?a=123""#);

    // Empty replies still reach the wrapper.
    let (_, body) = send(&app, Method::POST, "/test/fn").await;
    assert_eq!(body, "");
    assert_eq!(results.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn factory_can_end_the_request() {
    let results = Arc::new(AtomicUsize::new(0));
    let app = custom_app(Arc::clone(&results));

    let req = http::Request::get("/test/fn").header("x-deny", "1").body(Bytes::new()).unwrap();
    let res = app.call(req.into()).await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert!(res.body().is_empty());

    let (status, _) = send(&app, Method::GET, "/test/fn?skip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results.load(Ordering::SeqCst), 0);
}
