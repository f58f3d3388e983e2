//! Responses as the router hands them back to the server.
//!
//! Plain route handlers build a [`Response`] directly. Controller operations
//! usually never see one: they write through a [`Context`](crate::Context),
//! which becomes a `Response` once dispatch is over.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use tracing::warn;

/// The body types this crate writes itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Html,
    Json,
    OctetStream,
    Text,
}

impl ContentType {
    /// The `content-type` header value, with a charset for textual types.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    pub(crate) fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// A complete response: status, headers and a fully buffered body.
///
/// ```rust
/// use autoroute::{ContentType, Response};
/// use http::StatusCode;
///
/// let ok = Response::text("pong");
/// let gone = Response::status(StatusCode::GONE);
/// let created = Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/api/user/3")
///     .bytes(ContentType::Json, r#"{"id":3}"#);
///
/// assert_eq!(ok.status_code(), StatusCode::OK);
/// assert!(gone.body().is_empty());
/// assert_eq!(created.headers()["location"], "/api/user/3");
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// 200 with an `application/json` body.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// 200 with a `text/plain` body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// An empty response with the given status.
    pub fn status(code: StatusCode) -> Self {
        Self::from_parts(code, HeaderMap::new(), Bytes::new())
    }

    /// Starts a `200` response that needs extra headers or another status.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: HeaderMap::new() }
    }

    pub(crate) fn from_parts(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let Self { status, headers, body } = self;
        let mut res = http::Response::new(Full::new(body));
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }
}

/// See [`Response::builder`]. Every builder ends in exactly one body call.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn status(self, status: StatusCode) -> Self {
        Self { status, ..self }
    }

    /// Adds a header. Invalid names or values are logged and skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.bytes(ContentType::Text, body)
    }

    pub fn bytes(mut self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.headers.insert(CONTENT_TYPE, content_type.header_value());
        Response::from_parts(self.status, self.headers, body.into())
    }

    /// Ends the builder without a body or content type.
    pub fn no_body(self) -> Response {
        Response::from_parts(self.status, self.headers, Bytes::new())
    }
}

/// Anything a plain route handler may return.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}
