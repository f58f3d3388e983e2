//! What a controller operation returns.
//!
//! Every operation's return value is converted into one [`Reply`] through
//! [`IntoReply`]. The conversion is picked by the compiler from the
//! operation's declared return type:
//!
//! | Return type | Reply |
//! |---|---|
//! | `()`, `None` | `Empty` |
//! | `Bytes`, `Vec<u8>`, `&'static [u8]`, `Box<[u8]>` | `Bytes` |
//! | `Result<R, E>` | `R`'s reply, or `Error` |
//! | `Json<T>`, `String`, `&'static str`, `serde_json::Value` | `Structured` |

use std::error::Error as StdError;
use std::fmt;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

/// Boxed error carried by [`Reply::Error`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The result of one controller operation.
pub enum Reply {
    /// Nothing to encode. The operation wrote to its context directly, or
    /// had nothing to say.
    Empty,
    /// Written to the body verbatim.
    Bytes(Bytes),
    /// Written as the error's message.
    Error(BoxError),
    /// Serialized as JSON.
    Structured(Box<dyn Structured>),
}

impl Reply {
    pub fn json<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::Structured(Box::new(value))
    }

    pub fn error(err: impl Into<BoxError>) -> Self {
        Self::Error(err.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Structured(_) => f.write_str("Structured(..)"),
        }
    }
}

/// A value that can be serialized to JSON behind a trait object.
pub trait Structured: Send {
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
    fn to_value(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: Serialize + Send> Structured for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Marks a return value for JSON encoding.
///
/// ```
/// use autoroute::{IntoReply, Json, Reply};
///
/// let reply = Json(vec![1, 2, 3]).into_reply();
/// assert!(matches!(reply, Reply::Structured(_)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Json<T>(pub T);

/// An error that asks for a specific response status.
///
/// Returned through [`Reply::Error`], its message becomes the body and its
/// status replaces the response status. Plain errors keep the status the
/// operation left in place.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct StatusError {
    status: StatusCode,
    source: BoxError,
}

impl StatusError {
    pub fn new(status: StatusCode, err: impl Into<BoxError>) -> Self {
        Self { status, source: err.into() }
    }

    pub fn status(&self) -> StatusCode { self.status }

    pub fn into_inner(self) -> BoxError { self.source }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion from an operation's return value into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply { self }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply { Reply::Empty }
}

impl<R: IntoReply> IntoReply for Option<R> {
    fn into_reply(self) -> Reply {
        self.map_or(Reply::Empty, IntoReply::into_reply)
    }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Reply {
        match self {
            Ok(r) => r.into_reply(),
            Err(e) => Reply::Error(e.into()),
        }
    }
}

impl IntoReply for StatusError {
    fn into_reply(self) -> Reply { Reply::Error(Box::new(self)) }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Reply { Reply::Bytes(self) }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply { Reply::Bytes(self.into()) }
}

impl IntoReply for Box<[u8]> {
    fn into_reply(self) -> Reply { Reply::Bytes(self.into()) }
}

impl IntoReply for &'static [u8] {
    fn into_reply(self) -> Reply { Reply::Bytes(Bytes::from_static(self)) }
}

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    fn into_reply(self) -> Reply { Reply::json(self.0) }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Reply { Reply::json(self) }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply { Reply::json(self) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply { Reply::json(self) }
}
