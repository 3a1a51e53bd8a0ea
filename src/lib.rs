//! # verbrouter
//!
//! A per-endpoint HTTP method router. One endpoint, one handler per verb,
//! ordered middleware around them. Nothing more.
//!
//! ## The contract
//!
//! The hosting framework owns everything around the endpoint:
//!
//! - **Path routing**: which endpoint a URL belongs to
//! - **Request construction**: URL, header and body parsing
//! - **Failure handling**: turning a failed handler into an error page
//!
//! What's left for verbrouter:
//!
//! - One handler per verb: GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS
//! - Global and route middleware, composed in a fixed order around the handler
//! - `405 Method Not Allowed` for every verb nobody registered
//! - An [`Exports`] map with exactly one dispatch function per registered verb
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use verbrouter::{create_router, middleware, Request, Response, Server, StatusCode};
//! use verbrouter::middleware::Next;
//! use verbrouter::error::Outcome;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut users = create_router();
//!     users
//!         .with(middleware::trace)
//!         .get(list_users)
//!         .post_with(create_user, (require_token,));
//!
//!     Server::bind("0.0.0.0:3000").serve(users.export()).await.unwrap();
//! }
//!
//! async fn require_token(req: Request, next: Next) -> Outcome {
//!     match req.header("authorization") {
//!         Some(_) => next.run().await,
//!         None => Ok(Response::status(StatusCode::UNAUTHORIZED)),
//!     }
//! }
//!
//! async fn list_users(_req: Request) -> Response {
//!     Response::json(br#"[{"id":1}]"#.to_vec())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":99}"#.to_vec())
//! }
//! ```

mod dispatch;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod error;
pub mod middleware;

pub use dispatch::{Dispatch, Exports};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use http::StatusCode;
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoOutcome, IntoResponse, Json, Response, ResponseBuilder};
pub use router::{Router, create_router};
pub use server::Server;
