//! Unified error type.

/// The error type returned by autoroute's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures (binding to a port, accepting a connection) and
/// controller registration failures, which are meant to abort startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The controller's type has no usable name.
    #[error("cannot read a name from controller type `{0}`")]
    UnnamedType(String),

    /// An explicit route-name override was given but it is empty.
    #[error("controller `{0}`: explicit route name is empty")]
    EmptyOverride(String),

    /// Stripping the `Controller` suffix left nothing to mount under.
    #[error("controller `{0}` has no route name; pass one with `ControllerBuilder::name`")]
    EmptyName(String),
}
