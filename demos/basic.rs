//! Minimal autoroute example: a user controller, a guard middleware and an
//! access log.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/user/list
//!   curl http://localhost:3000/api/user/42
//!   curl -X POST http://localhost:3000/api/user -d '{"name":"carol"}'
//!   curl -X DELETE http://localhost:3000/api/user/42 -H 'x-admin: 1'

use std::sync::RwLock;

use autoroute::{AccessLog, Context, Controller, Json, RequestArg, Router, Server, StatusError};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

struct UserController {
    users: RwLock<Vec<User>>,
}

impl UserController {
    // GET /api/user/list
    fn list(&self, _ctx: &mut Context) -> Json<Vec<User>> {
        Json(self.users.read().map(|u| u.clone()).unwrap_or_default())
    }

    // GET /api/user/{id}: the default GET operation receives the whole tail.
    fn get(&self, ctx: &mut Context) -> Result<Json<User>, StatusError> {
        let id = parse_id(ctx)?;
        self.users
            .read()
            .ok()
            .and_then(|users| users.iter().find(|u| u.id == id).cloned())
            .map(Json)
            .ok_or_else(|| StatusError::new(StatusCode::NOT_FOUND, format!("no user {id}")))
    }

    // POST /api/user
    fn post(&self, ctx: &mut Context) -> Result<Json<User>, StatusError> {
        let input: NewUser = serde_json::from_slice(ctx.body())
            .map_err(|e| StatusError::new(StatusCode::BAD_REQUEST, e))?;
        let mut users = self
            .users
            .write()
            .map_err(|_| StatusError::new(StatusCode::INTERNAL_SERVER_ERROR, "user store poisoned"))?;
        let user = User { id: users.len() as u32 + 1, name: input.name };
        users.push(user.clone());
        ctx.set_status(StatusCode::CREATED);
        Ok(Json(user))
    }

    // DELETE /api/user/{id}
    fn delete(&self, ctx: &mut Context) -> Result<(), StatusError> {
        let id = parse_id(ctx)?;
        if let Ok(mut users) = self.users.write() {
            users.retain(|u| u.id != id);
        }
        ctx.set_status(StatusCode::NO_CONTENT);
        Ok(())
    }
}

fn parse_id(ctx: &Context) -> Result<u32, StatusError> {
    let raw = ctx.param("params").unwrap_or_default();
    raw.parse()
        .map_err(|_| StatusError::new(StatusCode::BAD_REQUEST, format!("bad user id `{raw}`")))
}

#[tokio::main]
async fn main() -> Result<(), autoroute::Error> {
    tracing_subscriber::fmt::init();

    let users = UserController {
        users: RwLock::new(vec![User { id: 1, name: "alice".into() }, User { id: 2, name: "bob".into() }]),
    };

    let users = Controller::builder(users)
        .method("List", UserController::list)
        .method("Get", UserController::get)
        .method("Post", UserController::post)
        .method("Delete", UserController::delete)
        .middleware(|ctx: &mut Context, arg: &mut RequestArg| {
            if ctx.method() == http::Method::DELETE && ctx.header("x-admin").is_none() {
                ctx.set_status(StatusCode::FORBIDDEN);
                ctx.write_str("admins only");
                arg.stop();
            }
        })
        .build()?;

    let app = Router::new().mount("/api", users);

    Server::bind("0.0.0.0:3000")
        .access_log(AccessLog::default())
        .serve(app)
        .await
}
