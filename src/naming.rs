//! Name conventions.
//!
//! Pure functions that turn declared names into routing keys:
//!
//! ```text
//! TestController          → route name  "test"
//! Fn                      → GET    /test/fn
//! PostFn                  → POST   /test/fn
//! Post                    → POST   /test
//! DeleteUserAvatar        → DELETE /test/user_avatar
//! ```

use crate::error::Error;
use crate::verb::Verb;

/// Suffix stripped from a controller's type name.
pub const CONTROLLER_SUFFIX: &str = "Controller";

/// Converts a camel-case identifier to lowercase-underscore form.
///
/// An underscore goes before every uppercase letter past the first character,
/// once at least one non-underscore character has been seen. Existing
/// underscores are kept.
///
/// ```
/// use autoroute::naming::snake_case;
///
/// assert_eq!(snake_case("PostFn"), "post_fn");
/// assert_eq!(snake_case("Fn"), "fn");
/// assert_eq!(snake_case("user_Id"), "user__id");
/// ```
pub fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() * 2);
    let mut seen_word = false;
    for (i, c) in ident.chars().enumerate() {
        if i > 0 && seen_word && c.is_ascii_uppercase() {
            out.push('_');
        }
        if c != '_' {
            seen_word = true;
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Splits a declared operation name into its verb and snake-cased operation.
///
/// The first verb of [`Verb::ALL`] whose prefix starts `name` wins; names with
/// no verb prefix are `GET`. Matching is case-sensitive, so `fn` is `GET fn`.
pub fn classify(name: &str) -> (Verb, String) {
    for verb in Verb::ALL {
        if let Some(rest) = name.strip_prefix(verb.prefix()) {
            return (verb, snake_case(rest));
        }
    }
    (Verb::Get, snake_case(name))
}

/// Derives the route name a controller is mounted under.
///
/// `type_name` is a Rust type path as produced by [`std::any::type_name`];
/// generic arguments and the module path are dropped and a trailing
/// `Controller` is stripped. A non-`None` `explicit` replaces the derived
/// name. Either way the result is snake-cased.
pub fn controller_name(type_name: &str, explicit: Option<&str>) -> Result<String, Error> {
    let bare = type_name.split('<').next().unwrap_or_default();
    let ident = bare.rsplit("::").next().unwrap_or_default().trim();
    if ident.is_empty() {
        return Err(Error::UnnamedType(type_name.to_owned()));
    }

    let name = match explicit {
        Some("") => return Err(Error::EmptyOverride(ident.to_owned())),
        Some(name) => name,
        None => ident.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(ident),
    };
    if name.is_empty() {
        return Err(Error::EmptyName(ident.to_owned()));
    }
    Ok(snake_case(name))
}
