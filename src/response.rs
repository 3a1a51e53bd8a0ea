//! Outgoing HTTP response type and the conversion traits handlers return through.
//!
//! Build a [`Response`] in a handler or middleware and return it. Anything
//! implementing [`IntoOutcome`] can be returned instead, including
//! `Result<T, E>` for fallible handlers.

use bytes::Bytes;
use http::StatusCode;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::error::{BoxError, Outcome};

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use verbrouter::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use verbrouter::{ContentType, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::UNAUTHORIZED)
///     .header("www-authenticate", "Bearer")
///     .json(br#"{"error":"Unauthorized"}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    body: Bytes,
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::bytes_raw("application/json", body.into())
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", Bytes::from(body.into()))
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Bytes::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    fn bytes_raw(content_type: &str, body: Bytes) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: StatusCode::OK,
        }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive lookup of the first header named `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_status(&mut self, code: StatusCode) {
        self.status = code;
    }

    /// Replaces every header named `name` with a single `name: value`.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.append_header(name, value);
    }

    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Converts into the `http` representation hyper writes to the wire.
    ///
    /// Headers that are not valid HTTP tokens are dropped with a warning.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.finish("application/json", body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", Bytes::from(body.into()))
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), body.into())
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Bytes) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── Json ──────────────────────────────────────────────────────────────────────

/// Serialises `T` with serde_json into an `application/json` response.
///
/// ```rust
/// use serde::Serialize;
/// use verbrouter::{Json, Request};
///
/// #[derive(Serialize)]
/// struct User { id: u64 }
///
/// async fn get_user(_req: Request) -> Json<User> {
///     Json(User { id: 1 })
/// }
/// ```
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => {
                warn!(error = %e, "json serialisation failed");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers
/// (together with [`IntoOutcome`]).
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

// ── IntoOutcome ───────────────────────────────────────────────────────────────

/// What a handler or middleware future may resolve to.
///
/// Infallible values become `Ok(response)`. A `Result` keeps its error, boxed
/// but otherwise untouched, so failures reach the caller of the dispatch.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

macro_rules! infallible_outcome {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoOutcome for $ty {
                fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
            }
        )+
    };
}

infallible_outcome!(Response, &'static str, String, StatusCode);

impl<T: Serialize> IntoOutcome for Json<T> {
    fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_puts_content_type_first() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(br#"{"id":42}"#.to_vec());

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.headers()[0], ("content-type".to_owned(), "application/json".to_owned()));
        assert_eq!(res.header("Location"), Some("/users/42"));
        assert_eq!(res.body().as_ref(), br#"{"id":42}"#);
    }

    #[test]
    fn no_body_keeps_status_and_headers_only() {
        let res = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("allow", "GET, OPTIONS")
            .no_body();

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert!(res.body().is_empty());
        assert_eq!(res.header("content-type"), None);
        assert_eq!(res.header("allow"), Some("GET, OPTIONS"));
    }

    #[test]
    fn bytes_sets_the_content_type() {
        let cases = [
            (ContentType::Html, "text/html; charset=utf-8"),
            (ContentType::Xml, "application/xml"),
            (ContentType::OctetStream, "application/octet-stream"),
        ];
        for (content_type, expected) in cases {
            let res = Response::builder().bytes(content_type, &b"<a/>"[..]);
            assert_eq!(res.header("content-type"), Some(expected));
            assert_eq!(res.body().as_ref(), b"<a/>");
        }
    }

    #[test]
    fn set_header_replaces_existing_values() {
        let mut res = Response::text("hi");
        res.append_header("x-trace", "a");
        res.append_header("X-Trace", "b");
        res.set_header("x-trace", "c");

        let traces: Vec<_> = res.headers().iter().filter(|(k, _)| k == "x-trace").collect();
        assert_eq!(traces.len(), 1);
        assert_eq!(res.header("x-trace"), Some("c"));
    }

    #[test]
    fn json_wrapper_serialises() {
        #[derive(Serialize)]
        struct Body { ok: bool }

        let res = Json(Body { ok: true }).into_response();
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn result_keeps_the_error() {
        let failed: Result<Response, std::io::Error> =
            Err(std::io::Error::other("db down"));
        let err = failed.into_outcome().unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());

        let status = StatusCode::ACCEPTED.into_outcome().unwrap();
        assert_eq!(status.status_code(), StatusCode::ACCEPTED);
    }

    #[test]
    fn into_inner_drops_invalid_headers() {
        let mut res = Response::status(StatusCode::NO_CONTENT);
        res.append_header("x-ok", "1");
        res.append_header("bad header", "1");

        let inner = res.into_inner();
        assert_eq!(inner.status(), StatusCode::NO_CONTENT);
        assert_eq!(inner.headers().len(), 1);
        assert_eq!(inner.headers()["x-ok"], "1");
    }
}
