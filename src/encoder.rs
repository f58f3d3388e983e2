//! Writes a [`Reply`] into a raw [`Context`].

use http::StatusCode;
use tracing::error;

use crate::context::Context;
use crate::reply::{Reply, StatusError};
use crate::response::ContentType;

/// Encoding policy for replies written to a raw [`Context`].
///
/// | Reply | Body | Status |
/// |---|---|---|
/// | `Empty` | untouched | untouched |
/// | `Bytes` | appended verbatim | untouched |
/// | `Error` | the error message | [`StatusError`]'s, else [`error_status`](Self::error_status), else untouched |
/// | `Structured` | JSON | untouched, `500` if serialization fails |
///
/// Errors keep the status by default, so a failed operation answers `200`
/// with the message as body unless told otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultEncoder {
    error_status: Option<StatusCode>,
}

impl ResultEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status applied to every error reply that does not carry its own.
    pub fn with_error_status(status: StatusCode) -> Self {
        Self { error_status: Some(status) }
    }

    pub fn error_status(&self) -> Option<StatusCode> {
        self.error_status
    }

    pub fn encode(&self, ctx: &mut Context, reply: Reply) {
        match reply {
            Reply::Empty => {}
            Reply::Bytes(bytes) => ctx.write(&bytes),
            Reply::Error(err) => {
                let status = err
                    .downcast_ref::<StatusError>()
                    .map(StatusError::status)
                    .or(self.error_status);
                if let Some(status) = status {
                    ctx.set_status(status);
                }
                ctx.default_content_type(ContentType::Text);
                ctx.write_str(&err.to_string());
            }
            Reply::Structured(value) => match value.to_json() {
                Ok(json) => {
                    ctx.default_content_type(ContentType::Json);
                    ctx.write(&json);
                }
                Err(err) => {
                    error!(path = ctx.path(), "reply serialization failed: {err}");
                    ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                    ctx.default_content_type(ContentType::Text);
                    ctx.write_str(&err.to_string());
                }
            },
        }
    }
}
