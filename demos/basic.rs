//! Minimal verbrouter example: one `/users` endpoint with middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'              # 401
//!   curl -X POST http://localhost:3000/users -H 'authorization: Bearer t' \
//!        -d '{"name":"alice"}'                                                  # 201
//!   curl -i -X PUT http://localhost:3000/users                                 # 405

use verbrouter::error::Outcome;
use verbrouter::middleware::{self, Next};
use verbrouter::{Request, Response, Server, StatusCode, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut users = create_router();
    users
        .with(middleware::trace)
        .with(powered_by)
        .get(list_users)
        .post_with(create_user, (require_token,))
        .options(|_req: Request| async { StatusCode::NO_CONTENT });

    if let Err(e) = Server::bind("0.0.0.0:3000").serve(&users).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

// Post-processes every response.
async fn powered_by(_req: Request, next: Next) -> Outcome {
    let mut res = next.run().await?;
    res.set_header("x-powered-by", "verbrouter");
    Ok(res)
}

// Short-circuits with 401 when there is no credential.
async fn require_token(req: Request, next: Next) -> Outcome {
    if req.header("authorization").is_none() {
        return Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .json(br#"{"error":"Unauthorized"}"#.to_vec()));
    }
    next.run().await
}

// GET /users
async fn list_users(_req: Request) -> Response {
    Response::json(br#"[{"id":"1","name":"alice"}]"#.to_vec())
}

// POST /users
//
// req.body() is the buffered body; parse it with serde_json::from_slice.
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(br#"{"id":"99","name":"new_user"}"#.to_vec())
}
