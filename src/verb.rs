//! Controller verbs as a typed enum.
//!
//! Only the six methods a controller can declare are covered. Their order
//! matters: [`Verb::ALL`] is the order in which declared names are tested for
//! a verb prefix, so `Get` wins over everything else.

use std::fmt;
use std::str::FromStr;

use http::Method;

/// An HTTP method a controller operation can be bound to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum Verb {
    Get,
    Post,
    Delete,
    Put,
    Patch,
    Head,
}

impl Verb {
    /// Every verb, in prefix-matching order.
    pub const ALL: [Verb; 6] = [
        Self::Get,
        Self::Post,
        Self::Delete,
        Self::Put,
        Self::Patch,
        Self::Head,
    ];

    /// The prefix a declared operation name starts with (e.g. `"Post"` in `PostFn`).
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Get    => "Get",
            Self::Post   => "Post",
            Self::Delete => "Delete",
            Self::Put    => "Put",
            Self::Patch  => "Patch",
            Self::Head   => "Head",
        }
    }

    /// Lowercase form used in dispatch keys (e.g. `"post"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get    => "get",
            Self::Post   => "post",
            Self::Delete => "delete",
            Self::Put    => "put",
            Self::Patch  => "patch",
            Self::Head   => "head",
        }
    }

    pub fn to_method(self) -> Method {
        match self {
            Self::Get    => Method::GET,
            Self::Post   => Method::POST,
            Self::Delete => Method::DELETE,
            Self::Put    => Method::PUT,
            Self::Patch  => Method::PATCH,
            Self::Head   => Method::HEAD,
        }
    }

    /// `None` for methods a controller cannot declare (OPTIONS, TRACE, ...).
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.to_method() == *method)
    }
}

/// Parses a verb case-insensitively (`"GET"`, `"get"` and `"Get"` all work).
impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_method().as_str())
    }
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Method {
        verb.to_method()
    }
}
