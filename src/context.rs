//! The raw execution context handed to controller operations.

use std::ops::{Deref, DerefMut};

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::request::Request;
use crate::response::{ContentType, Response};

/// A request together with the response being written for it.
///
/// Operations read the request through `Deref<Target = Request>` and write
/// the response in place: set a status, add headers, append bytes. Once
/// dispatch is over the context is turned into a [`Response`].
///
/// ```
/// use autoroute::Context;
/// use http::StatusCode;
///
/// let req = http::Request::get("/ping").body(bytes::Bytes::new()).unwrap();
/// let mut ctx = Context::new(req.into());
/// ctx.set_status(StatusCode::ACCEPTED);
/// ctx.write_str("pong");
///
/// let res = ctx.into_response();
/// assert_eq!(res.status_code(), StatusCode::ACCEPTED);
/// assert_eq!(&res.body()[..], b"pong");
/// ```
#[derive(Debug)]
pub struct Context {
    request: Request,
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn request_mut(&mut self) -> &mut Request { &mut self.request }

    pub fn status(&self) -> StatusCode { self.status }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn response_headers(&self) -> &HeaderMap { &self.headers }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Sets `content-type` unless the operation already chose one.
    pub fn default_content_type(&mut self, content_type: ContentType) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(CONTENT_TYPE, content_type.header_value());
        }
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] { &self.body }

    /// Appends raw bytes to the response body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Drops anything written so far. Status and headers are kept.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    pub fn into_response(self) -> Response {
        let body: Bytes = self.body.freeze();
        Response::from_parts(self.status, self.headers, body)
    }
}

impl Deref for Context {
    type Target = Request;

    fn deref(&self) -> &Request { &self.request }
}

impl DerefMut for Context {
    fn deref_mut(&mut self) -> &mut Request { &mut self.request }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str) -> Context {
        Context::new(http::Request::get(uri).body(Bytes::new()).unwrap().into())
    }

    #[test]
    fn reads_request_through_deref() {
        let mut ctx = context("/test/fn/a/b?x=1");
        ctx.set_param("params", "a/b");
        assert_eq!(ctx.path(), "/test/fn/a/b");
        assert_eq!(ctx.query(), Some("x=1"));
        assert_eq!(ctx.param("params"), Some("a/b"));
    }

    #[test]
    fn default_content_type_keeps_explicit_choice() {
        let mut ctx = context("/");
        ctx.insert_header(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
        ctx.default_content_type(ContentType::Json);
        assert_eq!(ctx.response_headers()[CONTENT_TYPE], "text/csv");
    }

    #[test]
    fn writes_accumulate() {
        let mut ctx = context("/");
        ctx.write(b"ab");
        ctx.write_str("cd");
        assert_eq!(ctx.written(), b"abcd");
        ctx.clear_body();
        assert!(ctx.into_response().body().is_empty());
    }
}
